use super::html::is_void_tag;
use super::*;

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

/// Element payload. `value`, `disabled` and `readonly` are live state seeded
/// from the markup, so later attribute edits do not touch them.
#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) value: String,
    pub(crate) disabled: bool,
    pub(crate) readonly: bool,
}

/// Arena document. Node 0 is the document itself.
#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    ids: HashMap<String, Vec<NodeId>>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                node_type: NodeType::Document,
            }],
            root: NodeId(0),
            ids: HashMap::new(),
        }
    }

    fn push_node(&mut self, parent: NodeId, node_type: NodeType) -> NodeId {
        let node_id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            node_type,
        });
        self.nodes[parent.0].children.push(node_id);
        node_id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let element = Element {
            value: attrs.get("value").cloned().unwrap_or_default(),
            disabled: attrs.contains_key("disabled"),
            readonly: attrs.contains_key("readonly"),
            tag_name,
            attrs,
        };
        let id_attr = element.attrs.get("id").filter(|id| !id.is_empty()).cloned();
        let node_id = self.push_node(parent, NodeType::Element(element));
        if let Some(id_attr) = id_attr {
            self.ids.entry(id_attr).or_default().push(node_id);
        }
        node_id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.push_node(parent, NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    fn expect_element_mut(&mut self, node_id: NodeId, what: &str) -> Result<&mut Element> {
        self.element_mut(node_id)
            .ok_or_else(|| Error::Runtime(format!("{what} target is not an element")))
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|element| element.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0)?.parent
    }

    /// Parent, grandparent, and so on up to the document.
    pub(crate) fn ancestors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node_id), |current| self.parent(*current))
    }

    pub(crate) fn is_descendant_of(&self, node_id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node_id).any(|current| current == ancestor)
    }

    pub(crate) fn find_ancestor_by_tag(&self, node_id: NodeId, tag: &str) -> Option<NodeId> {
        self.ancestors(node_id).find(|current| {
            self.tag_name(*current)
                .is_some_and(|name| name.eq_ignore_ascii_case(tag))
        })
    }

    /// Every attached element in document order.
    pub(crate) fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id.0];
            if matches!(node.node_type, NodeType::Element(_)) {
                out.push(node_id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// First element carrying `id`, in document order.
    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id)?.first().copied()
    }

    pub(crate) fn by_id_all(&self, id: &str) -> Vec<NodeId> {
        self.ids.get(id).cloned().unwrap_or_default()
    }

    pub(crate) fn body(&self) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|node_id| self.tag_name(*node_id) == Some("body"))
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)?
            .attrs
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    pub(crate) fn disabled(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some_and(|element| element.disabled)
    }

    pub(crate) fn readonly(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some_and(|element| element.readonly)
    }

    pub(crate) fn class_contains(&self, node_id: NodeId, class_name: &str) -> Result<bool> {
        self.element(node_id)
            .map(|element| has_class(element, class_name))
            .ok_or_else(|| Error::Runtime("classList target is not an element".into()))
    }

    pub(crate) fn class_add(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        self.edit_classes(node_id, |classes| {
            if !classes.iter().any(|name| name == class_name) {
                classes.push(class_name.to_string());
            }
        })
    }

    pub(crate) fn class_remove(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        self.edit_classes(node_id, |classes| classes.retain(|name| *name != class_name))
    }

    /// Rewrites the `class` attribute as a normalized token list; an empty
    /// list drops the attribute.
    fn edit_classes(&mut self, node_id: NodeId, edit: impl FnOnce(&mut Vec<String>)) -> Result<()> {
        let element = self.expect_element_mut(node_id, "classList")?;
        let mut classes = element
            .attrs
            .remove("class")
            .map(|value| value.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .unwrap_or_default();
        edit(&mut classes);
        if !classes.is_empty() {
            element.attrs.insert("class".into(), classes.join(" "));
        }
        Ok(())
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node_id];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current.0];
            match &node.node_type {
                NodeType::Text(text) => out.push_str(text),
                NodeType::Document | NodeType::Element(_) => {
                    stack.extend(node.children.iter().rev().copied())
                }
            }
        }
        out
    }

    /// Replaces every child with a single text node, or with nothing for "".
    ///
    /// A lone text child is rewritten in place so repeated updates do not grow
    /// the arena. Detached nodes stay in the arena unreachable.
    pub(crate) fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        self.expect_element_mut(node_id, "textContent")?;
        if let [only_child] = self.nodes[node_id.0].children[..] {
            if !value.is_empty() {
                if let NodeType::Text(text) = &mut self.nodes[only_child.0].node_type {
                    value.clone_into(text);
                    return Ok(());
                }
            }
        }
        for child in std::mem::take(&mut self.nodes[node_id.0].children) {
            self.nodes[child.0].parent = None;
        }
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        Ok(())
    }

    pub(crate) fn value(&self, node_id: NodeId) -> Result<String> {
        self.element(node_id)
            .map(|element| element.value.clone())
            .ok_or_else(|| Error::Runtime("value target is not an element".into()))
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        self.expect_element_mut(node_id, "value")?.value = value.to_string();
        Ok(())
    }

    /// `#id` when the element has one, its tag otherwise.
    pub(crate) fn node_label(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document => "document".into(),
            NodeType::Text(_) => "#text".into(),
            NodeType::Element(element) => match element.attrs.get("id") {
                Some(id) if !id.is_empty() => format!("#{id}"),
                _ => element.tag_name.clone(),
            },
        }
    }

    /// Serializes a subtree with attributes in name order.
    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node_id, false, &mut out);
        out
    }

    fn write_node(&self, node_id: NodeId, raw_text: bool, out: &mut String) {
        let node = &self.nodes[node_id.0];
        let element = match &node.node_type {
            NodeType::Text(text) if raw_text => return out.push_str(text),
            NodeType::Text(text) => return push_escaped(out, text, false),
            NodeType::Document => {
                for child in &node.children {
                    self.write_node(*child, false, out);
                }
                return;
            }
            NodeType::Element(element) => element,
        };

        let mut attrs = element.attrs.iter().collect::<Vec<_>>();
        attrs.sort_unstable_by_key(|(name, _)| *name);
        out.push('<');
        out.push_str(&element.tag_name);
        for (name, value) in attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            push_escaped(out, value, true);
            out.push('"');
        }
        out.push('>');
        if is_void_tag(&element.tag_name) {
            return;
        }

        let raw_children = matches!(element.tag_name.as_str(), "script" | "style");
        for child in &node.children {
            self.write_node(*child, raw_children, out);
        }
        out.push_str("</");
        out.push_str(&element.tag_name);
        out.push('>');
    }
}

pub(crate) fn has_class(element: &Element, class_name: &str) -> bool {
    element
        .attrs
        .get("class")
        .is_some_and(|classes| classes.split_whitespace().any(|name| name == class_name))
}

fn push_escaped(out: &mut String, value: &str, in_attr: bool) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' if in_attr => out.push_str("&quot;"),
            '<' if !in_attr => out.push_str("&lt;"),
            '>' if !in_attr => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
