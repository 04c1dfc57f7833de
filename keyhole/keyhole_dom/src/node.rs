//! Markup fragment model.
//!
//! A `Fragment` is a parentless container of nodes, the shape a rendered
//! template produces. Elements keep their attributes in source order.

use serde::{Deserialize, Serialize};

/// A whole document; enforced the same way as a fragment.
pub type Document = Fragment;

/// One node of a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),

    /// Character data, kept verbatim.
    Text {
        /// The text.
        text: String,
    },

    /// A comment, without its `<!--` `-->` delimiters.
    Comment {
        /// The comment body.
        text: String,
    },

    /// A declaration such as `<!DOCTYPE html>`, without `<!` and `>`.
    Doctype {
        /// The declaration body.
        text: String,
    },
}

impl Node {
    /// A text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The element, if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An element attribute. Boolean attributes have no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name, lowercase.
    pub name: String,

    /// Attribute value; `None` for a bare boolean attribute.
    pub value: Option<String>,
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name, lowercase.
    pub name: String,

    /// Attributes in source order.
    #[serde(default)]
    pub attributes: Vec<Attribute>,

    /// Child nodes.
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attribute`].
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Append a child node.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a text child.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::text(text))
    }

    /// Look up an attribute value. Boolean attributes read as `""`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_deref().unwrap_or(""))
    }

    /// Whether the attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_ascii_lowercase(),
                value,
            }),
        }
    }

    /// Remove an attribute, returning whether it was present.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes
            .retain(|attr| !attr.name.eq_ignore_ascii_case(name));
        self.attributes.len() != before
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        collect_text(&self.children, &mut text);
        text
    }
}

/// A parentless list of nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Top-level nodes.
    pub children: Vec<Node>,
}

impl Fragment {
    /// An empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fragment holding `children`.
    pub fn from_nodes(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Concatenated text of all text nodes.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        collect_text(&self.children, &mut text);
        text
    }

    /// Every element, depth first, in document order.
    pub fn elements(&self) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_elements(&self.children, &mut found);
        found
    }

    /// Every element carrying `attribute`, in document order.
    pub fn elements_with_attribute(&self, attribute: &str) -> Vec<&Element> {
        self.elements()
            .into_iter()
            .filter(|element| element.has_attribute(attribute))
            .collect()
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { text } => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
            Node::Comment { .. } | Node::Doctype { .. } => {}
        }
    }
}

fn collect_elements<'a>(nodes: &'a [Node], out: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Element(element) = node {
            out.push(element);
            collect_elements(&element.children, out);
        }
    }
}
