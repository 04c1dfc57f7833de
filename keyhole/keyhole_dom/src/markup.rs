//! Markup parsing and serialization.
//!
//! The parser accepts well-formed HTML fragments as produced by templates:
//! quoted, unquoted and boolean attributes, void and self-closing elements,
//! comments, declarations and raw-text `script`/`style` bodies. Text is kept
//! verbatim. Attribute values have character references decoded on parse and
//! `&` and `"` re-encoded on serialization, so a serialized fragment parses
//! back to the same attribute values.
//!
//! A closing tag for an ancestor closes every element opened inside it.
//! Elements whose end tag HTML lets authors omit (`p`, `li`, `td`, ...) are
//! closed implicitly when a sibling opens or the input ends, and closing tags
//! for void elements are ignored. Any other closing tag that matches no open
//! element, or any other element left open at the end of input, is an error.

use keyhole_core::error::DomError;
use std::fmt;

use crate::node::{Attribute, Element, Fragment, Node};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose body is raw text up to the matching closing tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Start tags that implicitly close an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "ul",
];

fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

/// Whether an open `open` element ends implicitly when `opening` starts.
fn implicitly_closed_by(open: &str, opening: &str) -> bool {
    match open {
        "p" => CLOSES_PARAGRAPH.contains(&opening),
        "li" => opening == "li",
        "dt" | "dd" => matches!(opening, "dt" | "dd"),
        "option" => matches!(opening, "option" | "optgroup"),
        "optgroup" => opening == "optgroup",
        "td" | "th" => matches!(opening, "td" | "th" | "tr" | "tbody" | "thead" | "tfoot"),
        "tr" => matches!(opening, "tr" | "tbody" | "thead" | "tfoot"),
        "thead" | "tbody" => matches!(opening, "tbody" | "tfoot"),
        _ => false,
    }
}

/// Whether an element may be left open at the end of input.
fn has_optional_end_tag(name: &str) -> bool {
    matches!(
        name,
        "p" | "li" | "dt" | "dd" | "option" | "optgroup" | "td" | "th" | "tr" | "thead" | "tbody"
            | "tfoot"
    )
}

/// Parse markup into a fragment.
pub fn parse(input: &str) -> Result<Fragment, DomError> {
    Parser { input, pos: 0 }.parse_fragment()
}

/// Serialize a fragment back to markup.
pub fn serialize(fragment: &Fragment) -> String {
    fragment.to_string()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn error(&self, reason: impl Into<String>) -> DomError {
        DomError::Markup {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn parse_fragment(mut self) -> Result<Fragment, DomError> {
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Vec<Node> = Vec::new();

        while self.pos < self.input.len() {
            let rest = self.rest();
            if let Some(body) = rest.strip_prefix("<!--") {
                let end = body
                    .find("-->")
                    .ok_or_else(|| self.error("unterminated comment"))?;
                push_node(&mut stack, &mut root, Node::Comment {
                    text: body[..end].to_string(),
                });
                self.pos += 4 + end + 3;
            } else if let Some(body) = rest.strip_prefix("<!") {
                let end = body
                    .find('>')
                    .ok_or_else(|| self.error("unterminated declaration"))?;
                push_node(&mut stack, &mut root, Node::Doctype {
                    text: body[..end].to_string(),
                });
                self.pos += 2 + end + 1;
            } else if let Some(body) = rest.strip_prefix("</") {
                let end = body
                    .find('>')
                    .ok_or_else(|| self.error("unterminated closing tag"))?;
                let name = body[..end].trim().to_ascii_lowercase();
                if name.is_empty() {
                    return Err(self.error("empty closing tag"));
                }
                if !is_void(&name) {
                    close_element(&mut stack, &mut root, &name)
                        .map_err(|reason| self.error(reason))?;
                }
                self.pos += 2 + end + 1;
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                let (mut element, self_closing) = self.parse_start_tag()?;
                close_implied(&mut stack, &mut root, &element.name);
                if self_closing || is_void(&element.name) {
                    push_node(&mut stack, &mut root, Node::Element(element));
                } else {
                    if is_raw_text(&element.name) {
                        let body = self.raw_text_body(&element.name)?;
                        if !body.is_empty() {
                            element.children.push(Node::text(body));
                        }
                    }
                    stack.push(element);
                }
            } else {
                let end = rest
                    .char_indices()
                    .skip(1)
                    .find(|&(_, c)| c == '<')
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                push_node(&mut stack, &mut root, Node::text(&rest[..end]));
                self.pos += end;
            }
        }

        while let Some(open) = stack.pop() {
            if !has_optional_end_tag(&open.name) {
                return Err(self.error(format!("element <{}> is never closed", open.name)));
            }
            push_node(&mut stack, &mut root, Node::Element(open));
        }
        Ok(Fragment::from_nodes(root))
    }

    /// Parse `<name attr=...>` or `<name .../>`, positioned at the `<`.
    fn parse_start_tag(&mut self) -> Result<(Element, bool), DomError> {
        self.pos += 1;
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'));
        let mut element = Element::new(name);

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok((element, true));
            }
            match self.peek() {
                None => return Err(self.error(format!("unterminated tag <{}>", element.name))),
                Some('>') => {
                    self.pos += 1;
                    return Ok((element, false));
                }
                Some(_) => {}
            }

            let attr_name = self
                .take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\''))
                .to_ascii_lowercase();
            if attr_name.is_empty() {
                return Err(self.error(format!("unexpected character in <{}>", element.name)));
            }

            self.skip_whitespace();
            let value = if self.peek() == Some('=') {
                self.pos += 1;
                self.skip_whitespace();
                Some(self.parse_attribute_value()?)
            } else {
                None
            };

            if !element.has_attribute(&attr_name) {
                element.attributes.push(Attribute {
                    name: attr_name,
                    value,
                });
            }
        }
    }

    fn parse_attribute_value(&mut self) -> Result<String, DomError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let rest = self.rest();
                let end = rest
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                self.pos += end + 1;
                Ok(decode_entities(&rest[..end]))
            }
            Some(_) => {
                let value = self.take_while(|c| !c.is_whitespace() && c != '>');
                Ok(decode_entities(value))
            }
            None => Err(self.error("missing attribute value")),
        }
    }

    /// Consume raw text up to (not including) `</name`.
    fn raw_text_body(&mut self, name: &str) -> Result<&'a str, DomError> {
        let rest = self.rest();
        let closing = format!("</{}", name);
        let end = rest
            .to_ascii_lowercase()
            .find(&closing)
            .ok_or_else(|| self.error(format!("element <{}> is never closed", name)))?;
        self.pos += end;
        Ok(&rest[..end])
    }
}

fn push_node(stack: &mut [Element], root: &mut Vec<Node>, node: Node) {
    let target = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => root,
    };
    if let (Node::Text { text: new }, Some(Node::Text { text })) = (&node, target.last_mut()) {
        text.push_str(new);
        return;
    }
    target.push(node);
}

fn close_implied(stack: &mut Vec<Element>, root: &mut Vec<Node>, opening: &str) {
    while stack
        .last()
        .is_some_and(|open| implicitly_closed_by(&open.name, opening))
    {
        if let Some(element) = stack.pop() {
            push_node(stack, root, Node::Element(element));
        }
    }
}

fn close_element(stack: &mut Vec<Element>, root: &mut Vec<Node>, name: &str) -> Result<(), String> {
    let index = stack
        .iter()
        .rposition(|element| element.name == name)
        .ok_or_else(|| format!("closing tag </{}> matches no open element", name))?;
    while stack.len() > index {
        if let Some(element) = stack.pop() {
            push_node(stack, root, Node::Element(element));
        }
    }
    Ok(())
}

/// Decode character references in an attribute value. Unrecognized
/// references are kept as written.
fn decode_entities(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        rest = &rest[start..];
        match decode_reference(rest) {
            Some((c, len)) => {
                decoded.push(c);
                rest = &rest[len..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }
    decoded.push_str(rest);
    decoded
}

/// Decode one `&...;` reference at the start of `input`, returning the
/// character and the length consumed.
fn decode_reference(input: &str) -> Option<(char, usize)> {
    let end = input.find(';')?;
    let body = &input[1..end];
    let c = match body {
        "quot" => '"',
        "apos" => '\'',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "nbsp" => '\u{a0}',
        _ => {
            let number = body.strip_prefix('#')?;
            let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((c, end + 1))
}

fn write_attribute_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '&' => f.write_str("&amp;")?,
            '"' => f.write_str("&quot;")?,
            _ => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for attr in &self.attributes {
            write!(f, " {}", attr.name)?;
            if let Some(value) = &attr.value {
                f.write_str("=")?;
                write_attribute_value(f, value)?;
            }
        }
        f.write_str(">")?;
        if is_void(&self.name) && self.children.is_empty() {
            return Ok(());
        }
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.name)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(element) => write!(f, "{}", element),
            Self::Text { text } => f.write_str(text),
            Self::Comment { text } => write!(f, "<!--{}-->", text),
            Self::Doctype { text } => write!(f, "<!{}>", text),
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.children {
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}
