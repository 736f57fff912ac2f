use super::*;

pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;
pub const DEFAULT_POPUP_HIDE_DELAY_MS: i64 = 1_500;
pub const NO_MESSAGE_SENTINEL: &str = "None";

/// Where the popup lives in the page and how it is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupConfig {
    /// Outer element; a click landing exactly on it dismisses the popup.
    pub container_id: String,
    pub message_id: String,
    /// Attribute of `<body>` carrying the server-rendered message.
    pub message_attr: String,
    pub hide_delay_ms: i64,
    pub shown_class: String,
    pub hidden_class: String,
    /// Cancel the pending auto-hide when the user dismisses the popup first.
    pub cancel_hide_on_dismiss: bool,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            container_id: "custom-popup".into(),
            message_id: "popup-message".into(),
            message_attr: "data-message".into(),
            hide_delay_ms: DEFAULT_POPUP_HIDE_DELAY_MS,
            shown_class: "show".into(),
            hidden_class: "hidden".into(),
            cancel_hide_on_dismiss: false,
        }
    }
}

impl PopupConfig {
    pub fn with_hide_delay_ms(mut self, hide_delay_ms: i64) -> Self {
        self.hide_delay_ms = hide_delay_ms;
        self
    }

    pub fn with_cancel_hide_on_dismiss(mut self, cancel: bool) -> Self {
        self.cancel_hide_on_dismiss = cancel;
        self
    }

    fn validate(&self) -> Result<()> {
        require_non_empty("popup.container_id", &self.container_id)?;
        require_non_empty("popup.message_id", &self.message_id)?;
        require_non_empty("popup.message_attr", &self.message_attr)?;
        require_class_name("popup.shown_class", &self.shown_class)?;
        require_class_name("popup.hidden_class", &self.hidden_class)?;
        if self.hide_delay_ms < 0 {
            return Err(Error::InvalidConfig(format!(
                "popup.hide_delay_ms must be non-negative (got {})",
                self.hide_delay_ms
            )));
        }
        if self.shown_class == self.hidden_class {
            return Err(Error::InvalidConfig(
                "popup.shown_class and popup.hidden_class must differ".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordFormConfig {
    pub form_id: String,
    pub password_id: String,
    pub confirm_password_id: String,
    pub length_error_id: String,
    pub match_error_id: String,
    pub min_length: usize,
    pub mismatch_message: String,
}

impl Default for PasswordFormConfig {
    fn default() -> Self {
        Self {
            form_id: "passwordForm".into(),
            password_id: "password".into(),
            confirm_password_id: "confirm_password".into(),
            length_error_id: "passwordError".into(),
            match_error_id: "confirmPasswordError".into(),
            min_length: DEFAULT_MIN_PASSWORD_LENGTH,
            mismatch_message: "Passwords do not match!".into(),
        }
    }
}

impl PasswordFormConfig {
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn length_message(&self) -> String {
        length_error_message(self.min_length)
    }

    fn validate(&self) -> Result<()> {
        require_non_empty("password_form.form_id", &self.form_id)?;
        require_non_empty("password_form.password_id", &self.password_id)?;
        require_non_empty(
            "password_form.confirm_password_id",
            &self.confirm_password_id,
        )?;
        require_non_empty("password_form.length_error_id", &self.length_error_id)?;
        require_non_empty("password_form.match_error_id", &self.match_error_id)?;
        if self.password_id == self.confirm_password_id {
            return Err(Error::InvalidConfig(
                "password_form.password_id and confirm_password_id must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Which behaviors a page load runs.
///
/// Setting a behavior to `None` leaves it off for the page entirely, which is
/// different from the behavior being on and its elements missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    pub popup: Option<PopupConfig>,
    pub password_form: Option<PasswordFormConfig>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            popup: Some(PopupConfig::default()),
            password_form: Some(PasswordFormConfig::default()),
        }
    }
}

impl PageConfig {
    pub fn with_popup(mut self, popup: Option<PopupConfig>) -> Self {
        self.popup = popup;
        self
    }

    pub fn with_password_form(mut self, password_form: Option<PasswordFormConfig>) -> Self {
        self.password_form = password_form;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(popup) = &self.popup {
            popup.validate()?;
        }
        if let Some(password_form) = &self.password_form {
            password_form.validate()?;
        }
        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidConfig(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_class_name(field: &str, value: &str) -> Result<()> {
    require_non_empty(field, value)?;
    if value.chars().any(char::is_whitespace) {
        return Err(Error::InvalidConfig(format!(
            "{field} must be a single class token (got {value:?})"
        )));
    }
    Ok(())
}
