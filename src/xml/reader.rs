// Document Reader
// Raw text in, owned element tree out, or a well-formedness failure.
//
// The codec only ever sees `XmlElement`, so any parser able to produce the
// tree can be plugged in through `DocumentReader`.

use crate::error::{Result, RosterError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First descendant element with the given name, depth first in document order
    pub fn find_descendant(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of every descendant text node
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Every element named `child` whose parent is named `parent`, in document
    /// order, searching the whole tree including this element.
    pub fn select_children_of<'a>(&'a self, parent: &str, child: &str) -> Vec<&'a XmlElement> {
        let mut out = Vec::new();
        self.walk_children_of(parent, child, &mut out);
        out
    }

    fn walk_children_of<'a>(&'a self, parent: &str, child: &str, out: &mut Vec<&'a XmlElement>) {
        for element in self.elements() {
            if self.name == parent && element.name == child {
                out.push(element);
            }
            element.walk_children_of(parent, child, out);
        }
    }
}

// ============================================================================
// READER CAPABILITY
// ============================================================================

/// DocumentReader - turns raw text into the root element of a document
pub trait DocumentReader: Send + Sync {
    /// Fails with `RosterError::Parse` when the text is not well-formed XML
    fn read(&self, text: &str) -> Result<XmlElement>;

    fn name(&self) -> &str {
        "document-reader"
    }
}

/// QuickXmlReader - default reader on top of quick-xml's pull parser.
///
/// quick-xml is a streaming tokenizer, so the checks a DOM parser would make on
/// document structure (single root, nothing left open at EOF, no stray text at
/// top level, legal characters) are made here.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuickXmlReader;

impl QuickXmlReader {
    pub fn new() -> Self {
        QuickXmlReader
    }
}

impl DocumentReader for QuickXmlReader {
    fn read(&self, text: &str) -> Result<XmlElement> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        check_chars(text)?;

        let mut reader = Reader::from_str(text);
        reader.config_mut().check_end_names = true;

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                RosterError::parse(format!("at byte {}: {}", reader.buffer_position(), e))
            })?;

            match event {
                Event::Start(start) => {
                    let element = open_element(&start)?;
                    if stack.is_empty() && root.is_some() {
                        return Err(RosterError::parse(format!(
                            "second root element <{}>",
                            element.name
                        )));
                    }
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let element = open_element(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(end) => {
                    let name = check_name(utf8(end.name().into_inner())?)?.to_string();
                    let element = stack.pop().ok_or_else(|| {
                        RosterError::parse(format!("closing tag </{}> without opening tag", name))
                    })?;
                    if element.name != name {
                        return Err(RosterError::parse(format!(
                            "expected </{}>, found </{}>",
                            element.name, name
                        )));
                    }
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(t) => {
                    let value = t
                        .unescape()
                        .map_err(|e| RosterError::parse(format!("bad text content: {}", e)))?;
                    push_text(&mut stack, value)?;
                }
                Event::CData(c) => {
                    let value = utf8(&c.into_inner())?.to_string();
                    push_text(&mut stack, Cow::Owned(value))?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions and doctypes
                // carry nothing the codec reads.
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(RosterError::parse(format!(
                "unexpected end of input inside <{}>",
                open.name
            )));
        }

        root.ok_or_else(|| RosterError::parse("document has no root element"))
    }

    fn name(&self) -> &str {
        "quick-xml"
    }
}

fn open_element(start: &BytesStart<'_>) -> Result<XmlElement> {
    let mut element = XmlElement::new(check_name(utf8(start.name().as_ref())?)?);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| RosterError::parse(format!("bad attribute: {}", e)))?;
        let key = check_name(utf8(attr.key.as_ref())?)?.to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| RosterError::parse(format!("bad attribute value: {}", e)))?;
        check_chars(&value)?;
        element.attributes.push((key, value.into_owned()));
    }

    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None if root.is_some() => {
            return Err(RosterError::parse(format!(
                "second root element <{}>",
                element.name
            )))
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(stack: &mut [XmlElement], value: Cow<'_, str>) -> Result<()> {
    check_chars(&value)?;
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Text(value.into_owned())),
        None if value.trim().is_empty() => {}
        None => return Err(RosterError::parse("text outside the root element")),
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| RosterError::parse(format!("invalid UTF-8: {}", e)))
}

/// XML 1.0 Char production: tab, newline, carriage return, and everything from
/// U+0020 up except the two non-characters U+FFFE and U+FFFF.
pub fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= '\u{20}' && c != '\u{fffe}' && c != '\u{ffff}')
}

/// Drop every character a document cannot carry, even escaped
pub fn strip_illegal_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

fn check_chars(text: &str) -> Result<()> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(RosterError::parse(format!("illegal character U+{:04X}", c as u32))),
        None => Ok(()),
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | '_' | 'A'..='Z' | 'a'..='z'
        | '\u{c0}'..='\u{d6}' | '\u{d8}'..='\u{f6}' | '\u{f8}'..='\u{2ff}'
        | '\u{370}'..='\u{37d}' | '\u{37f}'..='\u{1fff}' | '\u{200c}'..='\u{200d}'
        | '\u{2070}'..='\u{218f}' | '\u{2c00}'..='\u{2fef}' | '\u{3001}'..='\u{d7ff}'
        | '\u{f900}'..='\u{fdcf}' | '\u{fdf0}'..='\u{fffd}' | '\u{10000}'..='\u{effff}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{b7}' | '\u{300}'..='\u{36f}' | '\u{203f}'..='\u{2040}')
}

/// XML 1.0 Name production, for element and attribute names
fn check_name(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char);
    if valid {
        Ok(name)
    } else {
        Err(RosterError::parse(format!("invalid name {:?}", name)))
    }
}

// ============================================================================
// TESTS
// ============================================================================
