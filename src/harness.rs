use super::*;

/// Stack reserved for one user action; behavior hooks may re-enter dispatch.
pub(crate) const ACTION_STACK_BYTES: usize = 32 * 1024 * 1024;

/// One page load: its document, the behaviors attached to it, and a virtual
/// clock that only moves when told to.
pub struct Harness {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) scheduler: SchedulerState,
    pub(crate) trace_state: TraceState,
    pub(crate) config: PageConfig,
    pub(crate) popup: Option<PopupNotifier>,
    pub(crate) password_form: Option<PasswordValidator>,
    pub(crate) console: Vec<ConsoleMessage>,
    pub(crate) submissions: Vec<FormSubmission>,
}

impl Harness {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, PageConfig::default())
    }

    /// Parses `html`, attaches the configured behaviors and fires
    /// `DOMContentLoaded`.
    ///
    /// Missing page elements are not an error here: they surface as console
    /// messages, the way the page itself would report them.
    pub fn from_html_with_config(html: &str, config: PageConfig) -> Result<Self> {
        config.validate()?;
        let dom = html::parse_html(html)?;
        let mut harness = Self {
            dom,
            listeners: ListenerStore::default(),
            scheduler: SchedulerState::default(),
            trace_state: TraceState::default(),
            config,
            popup: None,
            password_form: None,
            console: Vec::new(),
            submissions: Vec::new(),
        };
        harness.load()?;
        Ok(harness)
    }

    pub(crate) fn with_stack<R>(&mut self, action: impl FnOnce(&mut Self) -> R) -> R {
        stacker::grow(ACTION_STACK_BYTES, || action(self))
    }

    fn load(&mut self) -> Result<()> {
        if let Some(config) = self.config.password_form.clone() {
            self.attach_password_form(&config);
        }
        let root = self.dom.root;
        if self.config.popup.is_some() {
            self.add_listener(root, "DOMContentLoaded", ListenerAction::PopupReady, false);
        }
        let ready = EventState::lifecycle("DOMContentLoaded", root, self.scheduler.now_ms);
        self.with_stack(|harness| harness.dispatch_prepared_event(ready).map(drop))
    }

    fn attach_password_form(&mut self, config: &PasswordFormConfig) {
        match PasswordValidator::attach(&self.dom, config) {
            Ok(validator) => {
                let view = *validator.view();
                self.add_listener(view.password, "input", ListenerAction::PasswordInput, false);
                self.add_listener(
                    view.confirm_password,
                    "input",
                    ListenerAction::ConfirmPasswordInput,
                    false,
                );
                self.add_listener(view.form, "submit", ListenerAction::PasswordFormSubmit, false);
                self.password_form = Some(validator);
            }
            Err(Error::ElementNotFound(id)) => {
                self.console_error(format!(
                    "Uncaught TypeError: password form element #{id} not found"
                ));
            }
            Err(err) => self.console_error(format!("Uncaught TypeError: {err}")),
        }
    }

    /// Replaces the control's value and fires `input`. Disabled and readonly
    /// controls ignore typing.
    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.is_effectively_disabled(target) || self.dom.readonly(target) {
            return Ok(());
        }
        if !is_text_entry_control(&self.dom, target) {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: self
                    .dom
                    .tag_name(target)
                    .map_or_else(|| "non-element".into(), str::to_ascii_lowercase),
            });
        }

        self.with_stack(|harness| {
            harness.dom.set_value(target, text)?;
            harness.dispatch_event(target, "input").map(drop)
        })
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.with_stack(|harness| harness.click_node(target))
    }

    fn click_node(&mut self, target: NodeId) -> Result<()> {
        if self.is_effectively_disabled(target) {
            return Ok(());
        }

        let click = self.dispatch_event(target, "click")?;
        if click.default_prevented || !is_submit_control(&self.dom, target) {
            return Ok(());
        }
        self.request_form_submit(target)
    }

    /// Submits the form `selector` names or belongs to, as pressing Enter would.
    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.with_stack(|harness| harness.request_form_submit(target))
    }

    /// Fires a bare event with no default action.
    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.with_stack(|harness| harness.dispatch_event(target, event).map(drop))
    }

    fn request_form_submit(&mut self, target: NodeId) -> Result<()> {
        let Some(form) = self.resolve_form_for_submit(target) else {
            return Ok(());
        };

        let submit = self.dispatch_event(form, "submit")?;
        if submit.default_prevented {
            return Ok(());
        }
        let submission = FormSubmission {
            form_id: self.dom.attr(form, "id"),
            entries: self.form_data_entries(form)?,
        };
        self.trace_event_line(format!(
            "[event] submitted form={} entries={}",
            self.dom.node_label(form),
            submission.entries.len()
        ));
        self.submissions.push(submission);
        Ok(())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        self.check(selector, Some(target), expected, &actual)
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        self.check(selector, Some(target), expected, &actual)
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        self.select_one(selector).map(drop)
    }

    pub fn assert_has_class(&self, selector: &str, class_name: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.class_contains(target, class_name)?;
        self.check(
            selector,
            Some(target),
            &format!("has_class({class_name})={expected}"),
            &format!("has_class({class_name})={actual}"),
        )
    }

    /// Fails with the container's label and markup when the popup is attached.
    pub fn assert_popup_state(&self, expected: PopupState) -> Result<()> {
        let container = self.popup.as_ref().map(PopupNotifier::container);
        let selector = container.map_or_else(|| "popup".into(), |node| self.dom.node_label(node));
        self.check(
            &selector,
            container,
            &format!("{expected:?}"),
            &format!("{:?}", self.popup_state()),
        )
    }

    fn check(
        &self,
        selector: &str,
        target: Option<NodeId>,
        expected: &str,
        actual: &str,
    ) -> Result<()> {
        if expected == actual {
            return Ok(());
        }
        Err(Error::AssertionFailed {
            selector: selector.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            dom_snippet: target.map(|node| self.node_snippet(node)).unwrap_or_default(),
        })
    }

    /// `Hidden` also covers a page whose popup never attached.
    pub fn popup_state(&self) -> PopupState {
        self.popup
            .as_ref()
            .map(PopupNotifier::state)
            .unwrap_or_default()
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target)
    }

    pub fn has_class(&self, selector: &str, class_name: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        self.dom.class_contains(target, class_name)
    }

    pub fn take_submissions(&mut self) -> Vec<FormSubmission> {
        std::mem::take(&mut self.submissions)
    }

    pub fn console_messages(&self) -> &[ConsoleMessage] {
        &self.console
    }

    pub fn take_console_messages(&mut self) -> Vec<ConsoleMessage> {
        std::mem::take(&mut self.console)
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_state.events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_state.timers = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_state.to_stderr = enabled;
    }

    /// Caps retained trace lines, dropping the oldest beyond `max_entries`.
    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        self.trace_state.set_log_limit(max_entries)
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_state.logs.drain(..).collect()
    }

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub(crate) fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }
}
