use super::*;

/// Comma-separated selector groups, as accepted by `query_selector`.
///
/// Supported: type, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`,
/// descendant and child combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorList {
    groups: Vec<ComplexSelector>,
}

/// Compound selectors joined by combinators, stored left to right:
/// `combinators[i]` sits between `parts[i]` and `parts[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    parts: Vec<CompoundSelector>,
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrSelector {
    Present(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

impl SelectorList {
    pub(crate) fn parse(source: &str) -> Result<Self> {
        SelectorParser {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
        .parse_list()
    }

    /// The id of a bare `#id` selector, which can be answered from the id index.
    pub(crate) fn single_id(&self) -> Option<&str> {
        let [group] = self.groups.as_slice() else {
            return None;
        };
        let [part] = group.parts.as_slice() else {
            return None;
        };
        if part.tag.is_none() && part.classes.is_empty() && part.attrs.is_empty() {
            part.id.as_deref()
        } else {
            None
        }
    }

    pub(crate) fn matches(&self, dom: &Dom, node_id: NodeId) -> bool {
        self.groups.iter().any(|group| {
            group
                .parts
                .len()
                .checked_sub(1)
                .is_some_and(|last| group.matches_at(dom, node_id, last))
        })
    }
}

impl ComplexSelector {
    fn matches_at(&self, dom: &Dom, node_id: NodeId, index: usize) -> bool {
        if !self.parts[index].matches(dom, node_id) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => dom
                .parent(node_id)
                .is_some_and(|parent| self.matches_at(dom, parent, index - 1)),
            Combinator::Descendant => {
                let mut cursor = dom.parent(node_id);
                while let Some(ancestor) = cursor {
                    if self.matches_at(dom, ancestor, index - 1) {
                        return true;
                    }
                    cursor = dom.parent(ancestor);
                }
                false
            }
        }
    }
}

impl CompoundSelector {
    fn matches(&self, dom: &Dom, node_id: NodeId) -> bool {
        let Some(element) = dom.element(node_id) else {
            return false;
        };
        if self
            .tag
            .as_ref()
            .is_some_and(|tag| !element.tag_name.eq_ignore_ascii_case(tag))
        {
            return false;
        }
        if self
            .id
            .as_ref()
            .is_some_and(|id| element.attrs.get("id") != Some(id))
        {
            return false;
        }
        self.classes.iter().all(|class| has_class(element, class))
            && self.attrs.iter().all(|attr| match attr {
                AttrSelector::Present(name) => element.attrs.contains_key(name),
                AttrSelector::Equals(name, value) => element.attrs.get(name) == Some(value),
            })
    }
}

struct SelectorParser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SelectorParser<'a> {
    fn unsupported(&self) -> Error {
        Error::UnsupportedSelector(self.source.to_string())
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn take_while(&mut self, accept: impl Fn(u8) -> bool) -> Option<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(&accept) {
            self.pos += 1;
        }
        if self.pos == start {
            None
        } else {
            self.source.get(start..self.pos)
        }
    }

    fn parse_list(mut self) -> Result<SelectorList> {
        let mut groups = vec![self.parse_complex()?];
        while self.eat(b',') {
            groups.push(self.parse_complex()?);
        }
        if self.pos != self.bytes.len() {
            return Err(self.unsupported());
        }
        Ok(SelectorList { groups })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        self.skip_ws();
        let mut parts = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(b',') => break,
                Some(b'>') => {
                    self.pos += 1;
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_ws => combinators.push(Combinator::Descendant),
                Some(_) => return Err(self.unsupported()),
            }
            parts.push(self.parse_compound()?);
        }
        Ok(ComplexSelector { parts, combinators })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector> {
        let start = self.pos;
        let mut compound = CompoundSelector::default();
        if !self.eat(b'*') {
            if let Some(tag) = self.take_while(is_ident_byte) {
                compound.tag = Some(tag.to_ascii_lowercase());
            }
        }

        loop {
            match self.peek() {
                Some(b'#') => {
                    self.pos += 1;
                    let id = self
                        .take_while(is_ident_byte)
                        .ok_or_else(|| self.unsupported())?
                        .to_string();
                    if compound.id.replace(id).is_some() {
                        return Err(self.unsupported());
                    }
                }
                Some(b'.') => {
                    self.pos += 1;
                    let class = self
                        .take_while(is_ident_byte)
                        .ok_or_else(|| self.unsupported())?
                        .to_string();
                    compound.classes.push(class);
                }
                Some(b'[') => {
                    self.pos += 1;
                    let attr = self.parse_attr()?;
                    compound.attrs.push(attr);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.unsupported());
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrSelector> {
        self.skip_ws();
        let name = self
            .take_while(|b| is_ident_byte(b) || b == b':')
            .ok_or_else(|| self.unsupported())?
            .to_ascii_lowercase();
        self.skip_ws();
        if self.eat(b']') {
            return Ok(AttrSelector::Present(name));
        }
        if !self.eat(b'=') {
            return Err(self.unsupported());
        }
        self.skip_ws();

        let value = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let value = self
                    .take_while(|b| b != quote)
                    .unwrap_or_default()
                    .to_string();
                if !self.eat(quote) {
                    return Err(self.unsupported());
                }
                value
            }
            _ => self
                .take_while(|b| !b.is_ascii_whitespace() && b != b']')
                .ok_or_else(|| self.unsupported())?
                .to_string(),
        };

        self.skip_ws();
        if !self.eat(b']') {
            return Err(self.unsupported());
        }
        Ok(AttrSelector::Equals(name, value))
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

impl Dom {
    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// Matches in document order.
    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        if let Some(id) = list.single_id() {
            return Ok(self.by_id_all(id));
        }

        let mut elements = self.elements();
        elements.retain(|node| list.matches(self, *node));
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_groups_and_combinators() -> Result<()> {
        let list = SelectorList::parse(" form > input[type='password'] , div .error ")?;
        assert_eq!(list.groups.len(), 2);
        assert_eq!(list.groups[0].combinators, vec![Combinator::Child]);
        assert_eq!(
            list.groups[0].parts[1].attrs,
            vec![AttrSelector::Equals("type".into(), "password".into())]
        );
        assert_eq!(list.groups[1].combinators, vec![Combinator::Descendant]);
        assert_eq!(list.groups[1].parts[1].classes, vec!["error".to_string()]);
        assert_eq!(list.single_id(), None);
        Ok(())
    }

    #[test]
    fn bare_id_uses_index() -> Result<()> {
        assert_eq!(SelectorList::parse("#passwordForm")?.single_id(), Some("passwordForm"));
        assert_eq!(SelectorList::parse("form#passwordForm")?.single_id(), None);
        Ok(())
    }

    #[test]
    fn universal_matches_any_element() -> Result<()> {
        let dom = html::parse_html("<div><span></span><b></b></div>")?;
        assert_eq!(dom.query_selector_all("*")?.len(), 3);
        assert_eq!(dom.query_selector_all("div > *")?.len(), 2);
        Ok(())
    }

    #[test]
    fn bracketed_value_may_hold_spaces_and_commas() -> Result<()> {
        let dom = html::parse_html(r#"<p data-msg="a, b"></p><p data-msg="a"></p>"#)?;
        assert_eq!(dom.query_selector_all(r#"p[data-msg="a, b"]"#)?.len(), 1);
        Ok(())
    }
}
