use super::*;

/// How a form-associated element takes part in typing and submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlKind {
    /// `textarea` and text-like inputs, `hidden` included.
    TextEntry,
    /// Checkbox and radio; checkedness is not modeled.
    Checkable,
    File,
    Select,
    SubmitButton,
    PlainButton,
}

pub(crate) fn control_kind(dom: &Dom, node_id: NodeId) -> Option<ControlKind> {
    let element = dom.element(node_id)?;
    let declared = element.attrs.get("type").map(|kind| kind.to_ascii_lowercase());
    let kind = match element.tag_name.as_str() {
        "textarea" => ControlKind::TextEntry,
        "select" => ControlKind::Select,
        // A button with a missing or unknown type submits.
        "button" => match declared.as_deref() {
            Some("button" | "reset") => ControlKind::PlainButton,
            _ => ControlKind::SubmitButton,
        },
        "input" => match declared.as_deref() {
            Some("submit") => ControlKind::SubmitButton,
            Some("button" | "reset" | "image") => ControlKind::PlainButton,
            Some("checkbox" | "radio") => ControlKind::Checkable,
            Some("file") => ControlKind::File,
            _ => ControlKind::TextEntry,
        },
        _ => return None,
    };
    Some(kind)
}

pub(crate) fn is_form_control(dom: &Dom, node_id: NodeId) -> bool {
    control_kind(dom, node_id).is_some()
}

pub(crate) fn is_text_entry_control(dom: &Dom, node_id: NodeId) -> bool {
    control_kind(dom, node_id) == Some(ControlKind::TextEntry)
}

pub(crate) fn is_submit_control(dom: &Dom, node_id: NodeId) -> bool {
    control_kind(dom, node_id) == Some(ControlKind::SubmitButton)
}

impl Harness {
    /// Disabled itself, or a control inside a disabled `fieldset`.
    pub(crate) fn is_effectively_disabled(&self, node: NodeId) -> bool {
        self.dom.disabled(node)
            || (is_form_control(&self.dom, node)
                && self.dom.ancestors(node).any(|ancestor| {
                    self.dom.tag_name(ancestor) == Some("fieldset") && self.dom.disabled(ancestor)
                }))
    }

    /// The form a control submits: the form itself, the one named by its
    /// `form` attribute, or its nearest enclosing form.
    pub(crate) fn resolve_form_for_submit(&self, target: NodeId) -> Option<NodeId> {
        let is_form = |node: NodeId| self.dom.tag_name(node) == Some("form");
        if is_form(target) {
            return Some(target);
        }
        match self.dom.attr(target, "form") {
            Some(form_id) => self.dom.by_id(&form_id).filter(|owner| is_form(*owner)),
            None => self.dom.find_ancestor_by_tag(target, "form"),
        }
    }

    /// Controls owned by `form`, in document order.
    pub(crate) fn form_elements(&self, form: NodeId) -> Vec<NodeId> {
        let form_id = self.dom.attr(form, "id").filter(|id| !id.is_empty());
        self.dom
            .elements()
            .into_iter()
            .filter(|node| is_form_control(&self.dom, *node))
            .filter(|node| match self.dom.attr(*node, "form") {
                Some(owner) => form_id.as_deref() == Some(owner.as_str()),
                None => self.dom.is_descendant_of(*node, form),
            })
            .collect()
    }

    /// `(name, value)` pairs a submission of `form` would carry: enabled,
    /// named text-entry controls.
    pub(crate) fn form_data_entries(&self, form: NodeId) -> Result<Vec<(String, String)>> {
        self.form_elements(form)
            .into_iter()
            .filter(|control| is_text_entry_control(&self.dom, *control))
            .filter(|control| !self.is_effectively_disabled(*control))
            .filter_map(|control| {
                let name = self.dom.attr(control, "name").filter(|name| !name.is_empty())?;
                Some(self.dom.value(control).map(|value| (name, value)))
            })
            .collect()
    }
}
