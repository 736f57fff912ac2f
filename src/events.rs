use super::*;

impl Harness {
    pub(crate) fn add_listener(
        &mut self,
        node_id: NodeId,
        event_type: &str,
        action: ListenerAction,
        capture: bool,
    ) {
        self.listeners
            .add(node_id, event_type, Listener { capture, action });
    }

    pub(crate) fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<EventState> {
        let event = EventState::new(event_type, target, self.scheduler.now_ms);
        self.dispatch_prepared_event(event)
    }

    pub(crate) fn dispatch_prepared_event(&mut self, mut event: EventState) -> Result<EventState> {
        let target = event.target;
        // Root first, target excluded.
        let mut ancestors = self.dom.ancestors(target).collect::<Vec<_>>();
        ancestors.reverse();

        event.event_phase = EventPhase::Capturing;
        for node in &ancestors {
            event.current_target = *node;
            self.invoke_listeners(*node, &mut event, true)?;
        }

        // Capture listeners on the target run before bubble listeners.
        event.event_phase = EventPhase::AtTarget;
        event.current_target = target;
        self.invoke_listeners(target, &mut event, true)?;
        self.invoke_listeners(target, &mut event, false)?;

        if event.bubbles {
            event.event_phase = EventPhase::Bubbling;
            for node in ancestors.iter().rev() {
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, false)?;
            }
        }

        self.trace_event_done(&event);
        Ok(event)
    }

    fn invoke_listeners(
        &mut self,
        node_id: NodeId,
        event: &mut EventState,
        capture: bool,
    ) -> Result<()> {
        let listeners = self.listeners.get(node_id, &event.event_type, capture);
        for listener in listeners {
            if self.trace_state.enabled {
                let target_label = self.dom.node_label(event.target);
                let current_label = self.dom.node_label(event.current_target);
                self.trace_event_line(format!(
                    "[event] {} target={} current={} phase={} default_prevented={}",
                    event.event_type,
                    target_label,
                    current_label,
                    event.event_phase.as_str(),
                    event.default_prevented
                ));
            }
            self.run_listener_action(listener.action, event)?;
        }
        Ok(())
    }

    fn run_listener_action(&mut self, action: ListenerAction, event: &mut EventState) -> Result<()> {
        match action {
            ListenerAction::PopupReady => self.on_popup_ready(),
            ListenerAction::PopupBackdropClick => self.on_popup_backdrop_click(event),
            ListenerAction::PasswordInput => self.on_password_input(),
            ListenerAction::ConfirmPasswordInput => self.on_confirm_password_input(),
            ListenerAction::PasswordFormSubmit => self.on_password_form_submit(event),
        }
    }

    fn on_popup_ready(&mut self) -> Result<()> {
        let Some(config) = self.config.popup.clone() else {
            return Ok(());
        };

        let mut popup = match PopupNotifier::attach(&self.dom, &config) {
            Ok(popup) => popup,
            Err(Error::ElementNotFound(_)) => {
                self.console_warn(format!(
                    "Popup elements not found. Check #{} and #{}.",
                    config.container_id, config.message_id
                ));
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        self.add_listener(
            popup.container(),
            "click",
            ListenerAction::PopupBackdropClick,
            false,
        );

        let message = self
            .dom
            .body()
            .and_then(|body| self.dom.attr(body, &config.message_attr))
            .unwrap_or_default();
        if is_displayable_message(&message) {
            let timer_id = popup.show(&mut self.dom, &mut self.scheduler, &message)?;
            self.trace_line(format!(
                "[popup] show message={:?} hide_timer={} due_at={}",
                truncate_chars(&message, 80),
                timer_id,
                self.scheduler.now_ms.saturating_add(config.hide_delay_ms)
            ));
        } else {
            self.trace_line(format!(
                "[popup] skip message={:?}",
                truncate_chars(&message, 80)
            ));
        }
        self.popup = Some(popup);
        Ok(())
    }

    fn on_popup_backdrop_click(&mut self, event: &EventState) -> Result<()> {
        let Some(popup) = self.popup.as_mut() else {
            return Ok(());
        };
        let pending_before = popup.hide_timer();
        let hidden = popup.handle_click(&mut self.dom, &mut self.scheduler, event)?;
        let pending_after = popup.hide_timer();
        if hidden {
            let canceled = pending_before.is_some() && pending_after.is_none();
            self.trace_line(format!("[popup] dismiss backdrop hide_timer_canceled={canceled}"));
        }
        Ok(())
    }

    fn on_password_input(&mut self) -> Result<()> {
        let Some(validator) = self.password_form.as_ref() else {
            return Ok(());
        };
        let length_valid = validator.check_length(&mut self.dom)?;
        let match_valid = validator.check_match(&mut self.dom)?;
        self.trace_line(format!(
            "[password] input length_valid={length_valid} match_valid={match_valid}"
        ));
        Ok(())
    }

    fn on_confirm_password_input(&mut self) -> Result<()> {
        let Some(validator) = self.password_form.as_ref() else {
            return Ok(());
        };
        let match_valid = validator.check_match(&mut self.dom)?;
        self.trace_line(format!("[password] confirm_input match_valid={match_valid}"));
        Ok(())
    }

    fn on_password_form_submit(&mut self, event: &mut EventState) -> Result<()> {
        let Some(validator) = self.password_form.as_ref() else {
            return Ok(());
        };
        let validity = validator.validate(&mut self.dom)?;
        if !validity.is_valid() {
            event.prevent_default();
        }
        self.trace_line(format!(
            "[password] submit length_valid={} match_valid={} blocked={}",
            validity.length_valid,
            validity.match_valid,
            !validity.is_valid()
        ));
        Ok(())
    }

    pub(crate) fn console_warn(&mut self, text: String) {
        log::warn!("{text}");
        self.console.push(ConsoleMessage {
            level: ConsoleLevel::Warn,
            text,
        });
    }

    pub(crate) fn console_error(&mut self, text: String) {
        log::error!("{text}");
        self.console.push(ConsoleMessage {
            level: ConsoleLevel::Error,
            text,
        });
    }

    pub(crate) fn trace_event_done(&mut self, event: &EventState) {
        if !(self.trace_state.enabled && self.trace_state.events) {
            return;
        }
        let target_label = self.dom.node_label(event.target);
        self.trace_event_line(format!(
            "[event] done {} target={} at_ms={} default_prevented={}",
            event.event_type, target_label, event.time_stamp_ms, event.default_prevented
        ));
    }

    pub(crate) fn trace_event_line(&mut self, line: String) {
        if self.trace_state.enabled && self.trace_state.events {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_timer_line(&mut self, line: String) {
        if self.trace_state.enabled && self.trace_state.timers {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_line(&mut self, line: String) {
        self.trace_state.record(line);
    }
}
