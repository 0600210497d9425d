// XML Codec
// Document Reader (text -> tree) plus the catalog codec (tree <-> students)

pub mod codec;
pub mod reader;

pub use codec::{parse_catalog, serialize_catalog};
pub use reader::{is_xml_char, strip_illegal_chars, DocumentReader, QuickXmlReader, XmlElement, XmlNode};
