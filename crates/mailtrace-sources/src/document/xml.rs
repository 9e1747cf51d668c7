//! XML front-end for [`super::Node`], built on `quick-xml` events.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Node, TEXT_KEY};
use crate::error::SourceError;

struct OpenElement {
    name: String,
    entries: Vec<(String, Node)>,
    text: String,
}

impl OpenElement {
    fn new(name: String, entries: Vec<(String, Node)>) -> Self {
        Self {
            name,
            entries,
            text: String::new(),
        }
    }

    fn close(mut self) -> (String, Node) {
        if !self.text.is_empty() {
            self.entries
                .push((TEXT_KEY.to_string(), Node::Scalar(self.text)));
        }
        (self.name, Node::Object(self.entries))
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text);
    }
}

pub(super) fn parse(xml: &str) -> Result<Node, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // The bottom of the stack collects top-level elements.
    let mut stack = vec![OpenElement::new(String::new(), Vec::new())];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(&e);
                let entries = attributes(&e)?;
                stack.push(OpenElement::new(name, entries));
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                let entries = attributes(&e)?;
                if let Some(parent) = stack.last_mut() {
                    parent.entries.push((name, Node::Object(entries)));
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(malformed("unexpected closing tag"));
                }
                if let Some(element) = stack.pop() {
                    let (name, node) = element.close();
                    if let Some(parent) = stack.last_mut() {
                        parent.entries.push((name, node));
                    }
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                if stack.len() > 1 {
                    if let Some(current) = stack.last_mut() {
                        current.push_text(&text);
                    }
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                if stack.len() > 1 {
                    if let Some(current) = stack.last_mut() {
                        current.push_text(&text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(malformed("unclosed element at end of input"));
    }
    let top = stack.pop().map(|root| root.entries).unwrap_or_default();
    if top.is_empty() {
        return Err(malformed("no root element"));
    }
    Ok(Node::Object(top))
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, Node)>, SourceError> {
    let mut entries = Vec::new();
    for attr in e.attributes().flatten() {
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        entries.push((format!("@{name}"), Node::Scalar(value)));
    }
    Ok(entries)
}

fn malformed(reason: &str) -> SourceError {
    SourceError::Malformed {
        format: "XML",
        reason: reason.to_string(),
    }
}
