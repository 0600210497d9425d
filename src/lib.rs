// Student Roster - Core Library
// Exposes all modules for use in the CLI/TUI, the API server, and tests

pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod session;
pub mod source;
pub mod store;
pub mod view;
pub mod xml;

// Re-export commonly used types
pub use config::RosterConfig;
pub use error::{Result, RosterError};
pub use record::{format_amount, parse_amount, FieldValue, SortKey, Student, StudentForm};
pub use session::{keeps_form, Export, RosterSession, EXPORT_FILENAME};
pub use source::{source_from_location, DocumentSource, FileSource, DEFAULT_SOURCE};
#[cfg(feature = "http")]
pub use source::HttpSource;
pub use store::CatalogStore;
pub use view::{matches_query, project, SortDirection, SortDirective};
pub use xml::{
    parse_catalog, serialize_catalog, strip_illegal_chars, DocumentReader, QuickXmlReader, XmlElement, XmlNode,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
