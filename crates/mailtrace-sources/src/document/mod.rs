//! Format-neutral document tree shared by the XML and JSON adapters.
//!
//! Every response is parsed once into a [`Node`] tree and then queried with
//! the same few accessors, so adapters describe *which* fields they want
//! instead of walking parser-specific structures.
//!
//! XML elements become [`Node::Object`]s whose entries are, in document order,
//! the element's attributes (keyed `@name`), its child elements (keyed by
//! local name, repeats allowed) and its text content (keyed `#text`).
//! Namespace prefixes are dropped. JSON maps onto the same shape directly, so
//! [`Node::attr`] on a JSON object reads a plain property.

mod json;
mod xml;

use crate::error::SourceError;

const TEXT_KEY: &str = "#text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Null,
    Scalar(String),
    Array(Vec<Node>),
    Object(Vec<(String, Node)>),
}

impl Node {
    /// First node stored under key `tag`, searching depth-first in document order.
    #[must_use]
    pub fn find(&self, tag: &str) -> Option<&Node> {
        match self {
            Node::Object(entries) => {
                for (key, value) in entries {
                    if key == tag {
                        return Some(value);
                    }
                    if let Some(found) = value.find(tag) {
                        return Some(found);
                    }
                }
                None
            }
            Node::Array(items) => items.iter().find_map(|item| item.find(tag)),
            Node::Null | Node::Scalar(_) => None,
        }
    }

    /// Direct child stored under `key` (first one if repeated).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Walk a key path. Numeric segments index into arrays.
    #[must_use]
    pub fn path(&self, segments: &[&str]) -> Option<&Node> {
        segments.iter().try_fold(self, |node, segment| match node {
            Node::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => node.get(segment),
        })
    }

    /// Text value of this node: the scalar itself, an element's text content,
    /// or the text of an array's first item.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(s),
            Node::Object(_) => self.get(TEXT_KEY).and_then(Node::as_text),
            Node::Array(items) => items.first().and_then(Node::as_text),
            Node::Null => None,
        }
    }

    /// Attribute `name` of this node (`@name` for XML, plain property for JSON).
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.get(&format!("@{name}"))
            .or_else(|| self.get(name))
            .and_then(Node::as_text)
    }

    /// Text of the first `tag` in the tree, or `default` when absent.
    #[must_use]
    pub fn text(&self, tag: &str, default: &str) -> String {
        self.find(tag)
            .and_then(Node::as_text)
            .unwrap_or(default)
            .to_string()
    }

    /// Attribute `name` on the first `tag` in the tree, or `default` when absent.
    #[must_use]
    pub fn attr_of(&self, tag: &str, name: &str, default: &str) -> String {
        self.find(tag)
            .and_then(|node| node.attr(name))
            .unwrap_or(default)
            .to_string()
    }

    /// Text at a key path, or `default` when any segment is missing.
    #[must_use]
    pub fn path_text(&self, segments: &[&str], default: &str) -> String {
        self.path(segments)
            .and_then(Node::as_text)
            .unwrap_or(default)
            .to_string()
    }

    /// Array items, or an empty slice for anything else.
    #[must_use]
    pub fn items(&self) -> &[Node] {
        match self {
            Node::Array(items) => items,
            _ => &[],
        }
    }

    /// Object entries, or an empty slice for anything else.
    #[must_use]
    pub fn entries(&self) -> &[(String, Node)] {
        match self {
            Node::Object(entries) => entries,
            _ => &[],
        }
    }
}

/// A parsed response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Parse an XML body.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Xml`] for syntax errors and
    /// [`SourceError::Malformed`] for documents without a single closed root.
    pub fn from_xml(body: &str) -> Result<Self, SourceError> {
        Ok(Self {
            root: xml::parse(body)?,
        })
    }

    /// Parse a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Json`] if the body is not valid JSON.
    pub fn from_json(body: &str) -> Result<Self, SourceError> {
        Ok(Self {
            root: json::parse(body)?,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    #[must_use]
    pub fn find(&self, tag: &str) -> Option<&Node> {
        self.root.find(tag)
    }

    #[must_use]
    pub fn path(&self, segments: &[&str]) -> Option<&Node> {
        self.root.path(segments)
    }

    #[must_use]
    pub fn text(&self, tag: &str, default: &str) -> String {
        self.root.text(tag, default)
    }

    #[must_use]
    pub fn attr(&self, tag: &str, name: &str, default: &str) -> String {
        self.root.attr_of(tag, name, default)
    }

    #[must_use]
    pub fn path_text(&self, segments: &[&str], default: &str) -> String {
        self.root.path_text(segments, default)
    }
}
