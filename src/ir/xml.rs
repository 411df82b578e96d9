// src/ir/xml.rs

//! Minimal XML tree loader for source descriptors.
//!
//! The flow and document parsers need random access to attributes and
//! children, which is awkward over a raw event stream. This loads a
//! descriptor into a small owned tree; element and attribute names keep
//! their original case, lookups normalize.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

/// One element of a loaded descriptor
#[derive(Debug, Clone, Default)]
pub struct XmlNode {
    pub name: String,
    pub attrs: HashMap<String, String>,
    pub children: Vec<XmlNode>,
    pub text: String,
}

impl XmlNode {
    /// Local element name, uppercased, namespace prefix removed
    pub fn local_name(&self) -> String {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local.to_uppercase(),
            None => self.name.to_uppercase(),
        }
    }

    /// Case-insensitive attribute lookup
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First attribute value among several candidate names
    pub fn attr_any(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|n| self.attr(n))
    }

    /// Depth-first iterator over this node and all descendants
    pub fn walk(&self) -> impl Iterator<Item = &XmlNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Load descriptor text into a synthetic root node whose children are the
/// document's top-level elements.
pub fn load(xml: &str) -> Result<XmlNode, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut root = XmlNode::default();
    let mut stack: Vec<XmlNode> = vec![];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(node_from_start(&e));
            }
            Ok(Event::Empty(e)) => {
                let node = node_from_start(&e);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root.children.push(node),
                }
            }
            Ok(Event::End(_)) => {
                // Tolerate stray end tags from truncated exports.
                if let Some(node) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root.children.push(node),
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(node) = stack.last_mut() {
                    let text = t.unescape().unwrap_or_default();
                    let text = text.trim();
                    if !text.is_empty() {
                        if !node.text.is_empty() {
                            node.text.push(' ');
                        }
                        node.text.push_str(text);
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(node) = stack.last_mut() {
                    node.text
                        .push_str(String::from_utf8_lossy(t.as_ref()).as_ref());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                // Truncated or ill-formed tail: keep whatever parsed so far
                // unless we never got a single element.
                if root.children.is_empty() && stack.is_empty() {
                    return Err(format!(
                        "XML parse error at byte {}: {e}",
                        reader.buffer_position()
                    ));
                }
                break;
            }
        }
    }

    // Unclosed elements at EOF still become children (truncated exports).
    while let Some(node) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => root.children.push(node),
        }
    }

    Ok(root)
}

fn node_from_start(e: &quick_xml::events::BytesStart<'_>) -> XmlNode {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut attrs = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map(|v| v.to_string())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
        attrs.insert(key, value);
    }
    XmlNode {
        name,
        attrs,
        children: Vec::new(),
        text: String::new(),
    }
}
