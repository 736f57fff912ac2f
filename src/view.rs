use super::*;

/// The popup's two elements, looked up once when the page becomes ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PopupView {
    pub(crate) container: NodeId,
    pub(crate) message: NodeId,
}

impl PopupView {
    pub(crate) fn resolve(dom: &Dom, config: &PopupConfig) -> Result<Self> {
        Ok(Self {
            container: require_element(dom, &config.container_id)?,
            message: require_element(dom, &config.message_id)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PasswordFormView {
    pub(crate) form: NodeId,
    pub(crate) password: NodeId,
    pub(crate) confirm_password: NodeId,
    pub(crate) length_error: NodeId,
    pub(crate) match_error: NodeId,
}

impl PasswordFormView {
    pub(crate) fn resolve(dom: &Dom, config: &PasswordFormConfig) -> Result<Self> {
        Ok(Self {
            form: require_element(dom, &config.form_id)?,
            password: require_element(dom, &config.password_id)?,
            confirm_password: require_element(dom, &config.confirm_password_id)?,
            length_error: require_element(dom, &config.length_error_id)?,
            match_error: require_element(dom, &config.match_error_id)?,
        })
    }
}

fn require_element(dom: &Dom, id: &str) -> Result<NodeId> {
    dom.by_id(id)
        .ok_or_else(|| Error::ElementNotFound(id.to_string()))
}
