use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupState {
    #[default]
    Hidden,
    Shown,
}

/// Whether a server-rendered message should be shown at all.
///
/// Empty, whitespace-only and the literal `"None"` (after trimming) mean
/// "no message". Trimming follows `String.prototype.trim`.
pub fn is_displayable_message(message: &str) -> bool {
    let trimmed = message.trim_matches(is_script_whitespace);
    !trimmed.is_empty() && trimmed != NO_MESSAGE_SENTINEL
}

/// ECMAScript WhiteSpace and LineTerminator: Unicode `White_Space` plus
/// U+FEFF, minus U+0085.
fn is_script_whitespace(c: char) -> bool {
    c == '\u{FEFF}' || (c.is_whitespace() && c != '\u{85}')
}

/// Transient notice shown once per page load.
#[derive(Debug, Clone)]
pub(crate) struct PopupNotifier {
    view: PopupView,
    hide_delay_ms: i64,
    shown_class: String,
    hidden_class: String,
    cancel_hide_on_dismiss: bool,
    state: PopupState,
    hide_timer: Option<i64>,
}

impl PopupNotifier {
    pub(crate) fn attach(dom: &Dom, config: &PopupConfig) -> Result<Self> {
        let view = PopupView::resolve(dom, config)?;
        Ok(Self {
            view,
            hide_delay_ms: config.hide_delay_ms,
            shown_class: config.shown_class.clone(),
            hidden_class: config.hidden_class.clone(),
            cancel_hide_on_dismiss: config.cancel_hide_on_dismiss,
            state: PopupState::Hidden,
            hide_timer: None,
        })
    }

    pub(crate) fn state(&self) -> PopupState {
        self.state
    }

    pub(crate) fn container(&self) -> NodeId {
        self.view.container
    }

    pub(crate) fn hide_timer(&self) -> Option<i64> {
        self.hide_timer
    }

    /// Puts `text` in the message holder, reveals the popup and queues the
    /// auto-hide. Returns the auto-hide timer id.
    pub(crate) fn show(
        &mut self,
        dom: &mut Dom,
        scheduler: &mut SchedulerState,
        text: &str,
    ) -> Result<i64> {
        dom.set_text_content(self.view.message, text)?;
        dom.class_add(self.view.container, &self.shown_class)?;
        dom.class_remove(self.view.container, &self.hidden_class)?;
        self.state = PopupState::Shown;

        let timer_id = scheduler.set_timeout(self.hide_delay_ms, TimerCallback::HidePopup);
        self.hide_timer = Some(timer_id);
        Ok(timer_id)
    }

    /// Returns true only when this call moved the popup from shown to hidden.
    /// Hiding a hidden popup rewrites the same classes and changes nothing.
    pub(crate) fn hide(&mut self, dom: &mut Dom) -> Result<bool> {
        dom.class_remove(self.view.container, &self.shown_class)?;
        dom.class_add(self.view.container, &self.hidden_class)?;
        let was_shown = self.state == PopupState::Shown;
        self.state = PopupState::Hidden;
        Ok(was_shown)
    }

    /// Auto-hide timer callback.
    pub(crate) fn handle_timer(&mut self, dom: &mut Dom, timer_id: i64) -> Result<bool> {
        if self.hide_timer == Some(timer_id) {
            self.hide_timer = None;
        }
        self.hide(dom)
    }

    /// Backdrop click: only a click that landed on the container itself
    /// dismisses; clicks bubbling up from the message do not.
    pub(crate) fn handle_click(
        &mut self,
        dom: &mut Dom,
        scheduler: &mut SchedulerState,
        event: &EventState,
    ) -> Result<bool> {
        if !event.is_at_target() || event.current_target != self.view.container {
            return Ok(false);
        }
        if self.cancel_hide_on_dismiss {
            if let Some(timer_id) = self.hide_timer.take() {
                scheduler.clear_timeout(timer_id);
            }
        }
        self.hide(dom)
    }
}
