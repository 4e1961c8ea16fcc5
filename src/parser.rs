//! Tolerant XML parsing into an owned element tree.
//!
//! [`parse`] follows a null-on-failure contract: any well-formedness
//! violation yields `None` and never an error, since an author who is
//! mid-edit produces malformed markup all the time. [`try_parse`] exposes
//! the failure reason and offset for the malformed-markup diagnostics.
//!
//! The tree does not keep original formatting. Every element records the
//! byte offset of its opening `<`, and every attribute the offset of its raw
//! value, so callers can go back to the source text.
//!
//! General entities declared in an internal DTD subset are expanded in text
//! and attribute values. External and parameter entities are not loaded.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use regex::Regex;
use tracing::debug;

/// Internal general entity declaration with a literal value.
static ENTITY_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!ENTITY\s+([^\s%"'<>]+)\s+(?:"([^"]*)"|'([^']*)')\s*>"#)
        .expect("entity declaration pattern is valid")
});

const PREDEFINED_ENTITIES: [(&str, &str); 5] = [
    ("lt", "<"),
    ("gt", ">"),
    ("amp", "&"),
    ("apos", "'"),
    ("quot", "\""),
];

/// A successfully parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: Element,
}

/// An attribute on an element, with its value unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    /// Byte offset of the value as written (inside the quotes), when known.
    pub value_offset: Option<usize>,
}

/// A child of an element, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written, including any namespace prefix.
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    /// Byte offset of the opening `<` in the source text.
    pub offset: usize,
}

impl Element {
    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    /// Look up an attribute value by its qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attribute_entry(name).map(|attr| attr.value.as_str())
    }

    /// Look up a whole attribute, including where its value was written.
    pub fn attribute_entry(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Child elements, skipping text.
    pub fn child_elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// This element and every element below it, depth-first in pre-order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

/// Pre-order iterator over an element subtree.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        // Reverse so the first child is visited next
        self.stack.extend(element.child_elements().rev());
        Some(element)
    }
}

/// Why a document failed to parse, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset in the source text where the problem was detected.
    pub offset: usize,
}

impl SyntaxError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.offset)
    }
}

impl std::error::Error for SyntaxError {}

/// Parse `text` into a tree, or `None` if it is not well-formed.
pub fn parse(text: &str) -> Option<XmlDocument> {
    match try_parse(text) {
        Ok(document) => Some(document),
        Err(err) => {
            debug!(error = %err, "document is not well-formed");
            None
        }
    }
}

/// Parse `text` into a tree, reporting the first well-formedness violation.
pub fn try_parse(text: &str) -> Result<XmlDocument, SyntaxError> {
    TreeBuilder::new(text).build()
}

/// Internal parser state.
struct TreeBuilder<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    /// Elements opened but not yet closed.
    stack: Vec<Element>,
    root: Option<Element>,
    /// Entity name to replacement text.
    entities: HashMap<String, String>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            reader: Reader::from_str(source),
            stack: Vec::new(),
            root: None,
            entities: PREDEFINED_ENTITIES
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    fn build(mut self) -> Result<XmlDocument, SyntaxError> {
        loop {
            let event_start = self.reader.buffer_position() as usize;

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let element = self.open_element(&e, self.tag_start(event_start))?;
                    self.stack.push(element);
                }
                Ok(Event::End(e)) => {
                    let element = self.close_element(&e, event_start)?;
                    self.attach(element)?;
                }
                Ok(Event::Empty(e)) => {
                    let element = self.open_element(&e, self.tag_start(event_start))?;
                    self.attach(element)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape_with(|name| self.resolve_entity(name)).map_err(|err| {
                        SyntaxError::new(format!("invalid text content: {}", err), event_start)
                    })?;
                    self.push_text(text.into_owned(), event_start)?;
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    self.push_text(text, event_start)?;
                }
                Ok(Event::DocType(e)) => self.declare_entities(&String::from_utf8_lossy(&e)),
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_)) => {}
                Ok(Event::Eof) => break,
                Err(err) => {
                    return Err(SyntaxError::new(
                        err.to_string(),
                        self.reader.error_position() as usize,
                    ));
                }
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(SyntaxError::new(
                format!("unclosed element <{}>", open.name),
                self.source.len(),
            ));
        }

        match self.root {
            Some(root) => Ok(XmlDocument { root }),
            None => Err(SyntaxError::new("no root element", self.source.len())),
        }
    }

    /// Anchor an event position at the tag's opening bracket.
    fn tag_start(&self, event_start: usize) -> usize {
        if self.source.as_bytes().get(event_start) == Some(&b'<') {
            return event_start;
        }
        self.source[..event_start.min(self.source.len())]
            .rfind('<')
            .unwrap_or(0)
    }

    fn resolve_entity(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(String::as_str)
    }

    /// Record the internal general entities of a DOCTYPE. The first
    /// declaration of a name wins, and predefined entities stay fixed.
    fn declare_entities(&mut self, doctype: &str) {
        for caps in ENTITY_DECL.captures_iter(doctype) {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            self.entities
                .entry(caps[1].to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    /// Byte offset of `raw` in the source, if it is a slice of it.
    ///
    /// Events borrow from the source text, so attribute values that needed no
    /// decoding point straight into it.
    fn source_offset(&self, raw: &[u8]) -> Option<usize> {
        let base = self.source.as_ptr() as usize;
        let start = raw.as_ptr() as usize;
        (start >= base && start + raw.len() <= base + self.source.len()).then(|| start - base)
    }

    fn open_element(&self, e: &BytesStart<'_>, event_start: usize) -> Result<Element, SyntaxError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| {
                SyntaxError::new(format!("invalid attribute: {}", err), event_start)
            })?;
            let value = attr
                .unescape_value_with(|name| self.resolve_entity(name))
                .map_err(|err| {
                    SyntaxError::new(format!("invalid attribute value: {}", err), event_start)
                })?;
            attributes.push(Attribute {
                name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value: value.into_owned(),
                value_offset: self.source_offset(&attr.value),
            });
        }

        Ok(Element {
            name,
            attributes,
            children: Vec::new(),
            offset: event_start,
        })
    }

    fn close_element(&mut self, e: &BytesEnd<'_>, event_start: usize) -> Result<Element, SyntaxError> {
        let end_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        let element = self.stack.pop().ok_or_else(|| {
            SyntaxError::new(format!("unexpected closing tag </{}>", end_name), event_start)
        })?;

        if element.name != end_name {
            return Err(SyntaxError::new(
                format!(
                    "expected closing tag </{}>, found </{}>",
                    element.name, end_name
                ),
                event_start,
            ));
        }

        Ok(element)
    }

    /// Hand a finished element to its parent, or make it the root.
    fn attach(&mut self, element: Element) -> Result<(), SyntaxError> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(Node::Element(element));
            return Ok(());
        }

        if self.root.is_some() {
            return Err(SyntaxError::new("multiple root elements", element.offset));
        }
        self.root = Some(element);
        Ok(())
    }

    fn push_text(&mut self, text: String, event_start: usize) -> Result<(), SyntaxError> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(Node::Text(text));
                Ok(())
            }
            // Whitespace around the root element is fine, anything else is not
            None if text.trim().is_empty() => Ok(()),
            None => Err(SyntaxError::new(
                "text outside of the root element",
                event_start,
            )),
        }
    }
}
