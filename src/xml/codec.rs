// Catalog codec
// <catalog><student id="..">name, section, tuition_fee, initial_payout</student></catalog>

use super::reader::{strip_illegal_chars, DocumentReader, XmlElement};
use crate::error::Result;
use crate::record::{format_amount, parse_amount, SortKey, Student};
use quick_xml::escape::escape;
use tracing::debug;

pub const CATALOG_ELEMENT: &str = "catalog";
pub const STUDENT_ELEMENT: &str = "student";
pub const ID_ATTRIBUTE: &str = "id";

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

// ============================================================================
// PARSE
// ============================================================================

/// Parse a catalog document into students, in document order.
///
/// Every `student` directly under a `catalog` element counts, wherever that
/// catalog sits in the tree. Missing pieces default (empty text, zero amount);
/// only a document that is not well-formed is an error.
pub fn parse_catalog(reader: &dyn DocumentReader, text: &str) -> Result<Vec<Student>> {
    let root = reader.read(text)?;

    let students: Vec<Student> = root
        .select_children_of(CATALOG_ELEMENT, STUDENT_ELEMENT)
        .into_iter()
        .map(student_from_element)
        .collect();

    debug!(count = students.len(), reader = reader.name(), "parsed catalog");
    Ok(students)
}

fn student_from_element(element: &XmlElement) -> Student {
    Student {
        identifier: element.attribute(ID_ATTRIBUTE).unwrap_or("").to_string(),
        name: child_text(element, SortKey::Name),
        section: child_text(element, SortKey::Section),
        tuition_fee: parse_amount(&child_text(element, SortKey::TuitionFee)),
        initial_payout: parse_amount(&child_text(element, SortKey::InitialPayout)),
    }
}

fn child_text(element: &XmlElement, key: SortKey) -> String {
    element
        .find_descendant(key.as_str())
        .map(|child| child.text_content().trim().to_string())
        .unwrap_or_default()
}

// ============================================================================
// SERIALIZE
// ============================================================================

/// Serialize students into a catalog document.
///
/// The five special characters are escaped in attribute values and text, and
/// characters XML cannot carry at all are dropped. Amounts always carry two
/// decimals.
pub fn serialize_catalog(students: &[Student]) -> String {
    let mut lines = Vec::with_capacity(students.len() + 3);
    lines.push(XML_DECLARATION.to_string());
    lines.push(format!("<{}>", CATALOG_ELEMENT));

    for s in students {
        lines.push(format!(
            "  <{tag} {attr}=\"{id}\">\n    <name>{name}</name>\n    <section>{section}</section>\n    <tuition_fee>{fee}</tuition_fee>\n    <initial_payout>{payout}</initial_payout>\n  </{tag}>",
            tag = STUDENT_ELEMENT,
            attr = ID_ATTRIBUTE,
            id = xml_attribute(&s.identifier),
            name = xml_text(&s.name),
            section = xml_text(&s.section),
            fee = format_amount(s.tuition_fee),
            payout = format_amount(s.initial_payout),
        ));
    }

    lines.push(format!("</{}>", CATALOG_ELEMENT));
    lines.join("\n")
}

// Carriage returns are written as references so no parser folds them into
// line feeds. Attribute values also keep tabs and line feeds that way.
fn xml_text(value: &str) -> String {
    escape(&strip_illegal_chars(value)).replace('\r', "&#13;")
}

fn xml_attribute(value: &str) -> String {
    xml_text(value).replace('\t', "&#9;").replace('\n', "&#10;")
}

// ============================================================================
// TESTS
// ============================================================================
