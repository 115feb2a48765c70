//! XML node tree
//!
//! Turns raw report bytes into an attribute-addressable tree using quick-xml's
//! event reader. Both the Clover and the test-result parsers sit on top of this.
//!
//! Attribute access is lenient: a missing or unparseable number reads as zero and
//! a missing string reads as empty, so partial reports can still be loaded.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;

use crate::error::{CovxError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Concatenated text and CDATA content directly inside this element.
    pub text: String,
}

impl XmlNode {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attr(key).is_some()
    }

    pub fn attr_string(&self, key: &str) -> String {
        self.attr(key).unwrap_or_default().to_string()
    }

    pub fn attr_u32(&self, key: &str) -> u32 {
        self.attr(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Signed integer attribute; missing or unparsable values read as 0.
    pub fn attr_i64(&self, key: &str) -> i64 {
        self.attr(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Read and parse an XML file from disk.
pub fn read_document(path: &Path) -> Result<XmlNode> {
    let bytes = fs::read(path).map_err(|source| CovxError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|e| {
        CovxError::MalformedInput(format!("{} is not valid UTF-8: {}", path.display(), e))
    })?;
    parse_document(&content)
}

/// Parse XML content into its root element.
pub fn parse_document(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                stack.push(element(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let node = element(e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| CovxError::MalformedInput("unmatched closing tag".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| CovxError::MalformedInput(err.to_string()))?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CovxError::MalformedInput(format!(
                    "{} at position {}",
                    e,
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(CovxError::MalformedInput(format!(
            "unexpected end of document, <{}> is not closed",
            open.name
        )));
    }

    root.ok_or_else(|| CovxError::MalformedInput("document has no root element".to_string()))
}

fn element(start: &BytesStart) -> Result<XmlNode> {
    let mut node = XmlNode {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..Default::default()
    };

    for attr in start.attributes() {
        let attr = attr.map_err(|e| CovxError::MalformedInput(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| CovxError::MalformedInput(e.to_string()))?
            .into_owned();
        node.attributes.push((key, value));
    }

    Ok(node)
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(CovxError::MalformedInput(format!(
            "unexpected second root element <{}>",
            node.name
        )));
    }
    *root = Some(node);
    Ok(())
}
