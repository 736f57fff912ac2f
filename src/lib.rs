use std::collections::{HashMap, VecDeque};
use std::error::Error as StdError;
use std::fmt;

mod config;
mod dom;
mod events;
mod form_controls;
mod harness;
mod html;
mod password;
mod popup;
mod runtime_state;
mod scheduler;
mod selector;
mod view;

pub use config::{
    DEFAULT_MIN_PASSWORD_LENGTH, DEFAULT_POPUP_HIDE_DELAY_MS, NO_MESSAGE_SENTINEL, PageConfig,
    PasswordFormConfig, PopupConfig,
};
pub use harness::Harness;
pub use password::{
    FormValidity, length_error_message, meets_min_length, password_length, passwords_match,
};
pub use popup::{PopupState, is_displayable_message};
pub use runtime_state::{ConsoleLevel, ConsoleMessage, FormSubmission, PendingTimer};

pub(crate) use dom::{Dom, has_class};
pub(crate) use form_controls::*;
pub(crate) use password::PasswordValidator;
pub(crate) use popup::PopupNotifier;
pub(crate) use runtime_state::*;
pub(crate) use view::{PasswordFormView, PopupView};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    Runtime(String),
    InvalidConfig(String),
    ElementNotFound(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::Runtime(msg) => write!(f, "runtime error: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::ElementNotFound(id) => write!(f, "element not found: #{id}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) usize);

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated = chars.by_ref().take(max_chars).collect::<String>();
    if chars.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}
