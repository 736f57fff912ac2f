use super::*;

/// Builds the document for one server-rendered page.
///
/// Script and style bodies are kept as text and never run: the page's
/// behaviors are native to this crate.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut cursor = Cursor {
        src: html,
        bytes: html.as_bytes(),
        pos: 0,
    };
    let mut tree = TreeBuilder::new();

    while !cursor.at_end() {
        if cursor.starts_with(b"<!--") {
            cursor.skip_comment()?;
        } else if !cursor.at_markup() {
            tree.text(cursor.text_run());
        } else if cursor.starts_with(b"</") {
            let tag = cursor.end_tag()?;
            tree.close(&tag);
        } else if cursor.starts_with(b"<!") {
            cursor.skip_declaration()?;
        } else {
            let start = cursor.start_tag()?;
            let raw_body = is_raw_text_tag(&start.name) && !start.self_closing;
            let name = start.name.clone();
            let node = tree.open_element(start);
            if raw_body {
                let body = cursor.raw_text(&name)?;
                tree.raw_text(node, &name, body);
            }
        }
    }

    tree.finish()
}

struct StartTag {
    name: String,
    attrs: HashMap<String, String>,
    self_closing: bool,
}

/// Open-element stack over the arena; index 0 is always the document.
struct TreeBuilder {
    dom: Dom,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        let dom = Dom::new();
        let open = vec![dom.root];
        Self { dom, open }
    }

    fn parent(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.dom.root)
    }

    fn open_element(&mut self, start: StartTag) -> NodeId {
        if closes_open_paragraph(&start.name) {
            let open_p = (1..self.open.len())
                .rev()
                .find(|index| self.dom.tag_name(self.open[*index]) == Some("p"));
            if let Some(index) = open_p {
                self.open.truncate(index);
            }
        }

        let keeps_open = !start.self_closing
            && !is_void_tag(&start.name)
            && !is_raw_text_tag(&start.name);
        let node = self
            .dom
            .create_element(self.parent(), start.name, start.attrs);
        if keeps_open {
            self.open.push(node);
        }
        node
    }

    /// Pops up to and including the nearest open `tag`; a stray end tag is ignored.
    fn close(&mut self, tag: &str) {
        let Some(index) = (1..self.open.len())
            .rev()
            .find(|index| self.dom.tag_name(self.open[*index]) == Some(tag))
        else {
            return;
        };
        self.open.truncate(index);
    }

    fn text(&mut self, raw: &str) {
        let decoded = decode_html_character_references(raw);
        if !decoded.is_empty() {
            let parent = self.parent();
            self.dom.create_text(parent, decoded);
        }
    }

    fn raw_text(&mut self, node: NodeId, tag: &str, body: &str) {
        if body.is_empty() {
            return;
        }
        let text = match tag {
            "textarea" | "title" => decode_html_character_references(body),
            _ => body.to_string(),
        };
        self.dom.create_text(node, text);
    }

    /// Seeds each textarea's value from its parsed body.
    fn finish(mut self) -> Result<Dom> {
        for node in self.dom.elements() {
            if self.dom.tag_name(node) == Some("textarea") {
                let text = self.dom.text_content(node);
                self.dom.set_value(node, &text)?;
            }
        }
        Ok(self.dom)
    }
}

struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn starts_with(&self, needle: &[u8]) -> bool {
        self.bytes
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(needle))
    }

    /// A '<' that opens no markup (e.g. "a < b") stays text.
    fn at_markup(&self) -> bool {
        self.peek_at(0) == Some(b'<')
            && self
                .peek_at(1)
                .is_some_and(|next| next == b'/' || next == b'!' || next.is_ascii_alphabetic())
    }

    fn at_self_close(&self) -> bool {
        self.starts_with(b"/>")
    }

    fn take_while(&mut self, accept: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek_at(0).is_some_and(&accept) {
            self.pos += 1;
        }
        self.src.get(start..self.pos).unwrap_or_default()
    }

    fn skip_ws(&mut self) {
        self.take_while(|b| b.is_ascii_whitespace());
    }

    fn text_run(&mut self) -> &'a str {
        let start = self.pos;
        self.pos += 1;
        while !self.at_end() && !self.at_markup() {
            self.pos += 1;
        }
        self.src.get(start..self.pos).unwrap_or_default()
    }

    fn skip_comment(&mut self) -> Result<()> {
        let body = self.bytes.get(self.pos + 4..).unwrap_or_default();
        let end = body
            .windows(3)
            .position(|window| window == b"-->")
            .ok_or_else(|| Error::HtmlParse("unclosed HTML comment".into()))?;
        self.pos += 4 + end + 3;
        Ok(())
    }

    /// `<!DOCTYPE ...>` and friends; quoted sections may contain '>'.
    fn skip_declaration(&mut self) -> Result<()> {
        self.pos += 2;
        let mut quote = None;
        while let Some(b) = self.peek_at(0) {
            self.pos += 1;
            match (quote, b) {
                (Some(open), _) if b == open => quote = None,
                (Some(_), _) => {}
                (None, b'\'' | b'"') => quote = Some(b),
                (None, b'>') => return Ok(()),
                (None, _) => {}
            }
        }
        Err(Error::HtmlParse("unclosed declaration tag".into()))
    }

    fn end_tag(&mut self) -> Result<String> {
        self.pos += 2;
        self.skip_ws();
        let tag = self.take_while(is_tag_char).to_ascii_lowercase();
        self.take_while(|b| b != b'>');
        if self.at_end() {
            return Err(Error::HtmlParse(format!("unclosed end tag </{tag}>")));
        }
        self.pos += 1;
        Ok(tag)
    }

    fn start_tag(&mut self) -> Result<StartTag> {
        self.pos += 1;
        let name = self.take_while(is_tag_char).to_ascii_lowercase();
        if name.is_empty() {
            return Err(Error::HtmlParse("empty tag name".into()));
        }

        let mut attrs = HashMap::new();
        loop {
            self.skip_ws();
            match self.peek_at(0) {
                None => return Err(Error::HtmlParse(format!("unclosed start tag <{name}>"))),
                Some(b'>') => {
                    self.pos += 1;
                    return Ok(StartTag {
                        name,
                        attrs,
                        self_closing: false,
                    });
                }
                Some(b'/') if self.at_self_close() => {
                    self.pos += 2;
                    return Ok(StartTag {
                        name,
                        attrs,
                        self_closing: true,
                    });
                }
                Some(b) if !is_attr_name_char(b) => {
                    // Junk token: drop it the way browsers recover.
                    self.pos += 1;
                    self.skip_unquoted();
                }
                Some(_) => {
                    let attr = self.take_while(is_attr_name_char).to_ascii_lowercase();
                    self.skip_ws();
                    let value = if self.peek_at(0) == Some(b'=') {
                        self.pos += 1;
                        self.skip_ws();
                        self.attr_value()?
                    } else {
                        String::new()
                    };
                    // First occurrence wins.
                    attrs.entry(attr).or_insert(value);
                }
            }
        }
    }

    fn skip_unquoted(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek_at(0) {
            if b.is_ascii_whitespace() || b == b'>' || self.at_self_close() {
                break;
            }
            self.pos += 1;
        }
        self.src.get(start..self.pos).unwrap_or_default()
    }

    fn attr_value(&mut self) -> Result<String> {
        match self.peek_at(0) {
            None => Err(Error::HtmlParse("missing attribute value".into())),
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let raw = self.take_while(|b| b != quote);
                if self.at_end() {
                    return Err(Error::HtmlParse("unclosed quoted attribute value".into()));
                }
                self.pos += 1;
                Ok(decode_html_character_references(raw))
            }
            Some(_) => Ok(decode_html_character_references(self.skip_unquoted())),
        }
    }

    /// Body of a raw-text element up to its (case-insensitive) end tag,
    /// which is consumed too.
    fn raw_text(&mut self, tag: &str) -> Result<&'a str> {
        let start = self.pos;
        while !self.at_end() {
            if self.starts_with(b"</") && self.closes_raw(tag) {
                let body = self.src.get(start..self.pos).unwrap_or_default();
                self.end_tag()?;
                return Ok(body);
            }
            self.pos += 1;
        }
        Err(Error::HtmlParse(format!("unclosed <{tag}>")))
    }

    fn closes_raw(&self, tag: &str) -> bool {
        let mut at = self.pos + 2;
        while self.bytes.get(at).is_some_and(u8::is_ascii_whitespace) {
            at += 1;
        }
        let end = at + tag.len();
        self.bytes
            .get(at..end)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag.as_bytes()))
            && !self.bytes.get(end).is_some_and(u8::is_ascii_alphanumeric)
    }
}

const NAMED_REFERENCES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
    ("copy", '©'),
    ("reg", '®'),
    ("trade", '™'),
    ("euro", '€'),
    ("pound", '£'),
    ("yen", '¥'),
    ("laquo", '«'),
    ("raquo", '»'),
    ("ldquo", '“'),
    ("rdquo", '”'),
    ("lsquo", '‘'),
    ("rsquo", '’'),
    ("hellip", '…'),
    ("middot", '·'),
    ("ndash", '–'),
    ("mdash", '—'),
];

fn decode_reference(token: &str) -> Option<char> {
    let Some(numeric) = token.strip_prefix('#') else {
        return NAMED_REFERENCES
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, ch)| *ch);
    };
    let codepoint = match numeric.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => numeric.parse().ok()?,
    };
    char::from_u32(codepoint)
}

/// Decodes `&name;` and `&#NN;` references; unknown ones stay literal and
/// the trailing `;` is optional.
pub(crate) fn decode_html_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let token_len = tail
            .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '#'))
            .unwrap_or(tail.len());
        let token = &tail[..token_len];

        match decode_reference(token).filter(|_| !token.is_empty()) {
            Some(ch) => {
                out.push(ch);
                let after = &tail[token_len..];
                rest = after.strip_prefix(';').unwrap_or(after);
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea" | "title")
}

fn closes_open_paragraph(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div"
            | "form"
            | "ul"
            | "ol"
            | "table"
            | "section"
            | "header"
            | "footer"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    is_tag_char(b) || b == b':'
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
