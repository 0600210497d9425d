// Roster Session
// Owned replacement for the editor's global state: store, search text, sort
// directive and the status line every operation reports into.

use crate::error::{Result, RosterError};
use crate::record::{SortKey, Student, StudentForm};
use crate::source::DocumentSource;
use crate::store::CatalogStore;
use crate::view::{project, SortDirective};
use crate::xml::{parse_catalog, serialize_catalog, DocumentReader};
use tracing::{info, warn};

/// File name offered for every export
pub const EXPORT_FILENAME: &str = "students_export.xml";

/// Export - a serialized catalog ready to be written or downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub filename: &'static str,
    pub document: String,
    pub count: usize,
}

#[derive(Debug, Default)]
pub struct RosterSession {
    store: CatalogStore,
    query: String,
    directive: SortDirective,
    status: String,
}

impl RosterSession {
    pub fn new() -> Self {
        RosterSession::default()
    }

    /// Session starting from records already in hand
    pub fn with_students(students: Vec<Student>) -> Self {
        let mut session = RosterSession::new();
        session.store.load_all(students);
        session
    }

    // ------------------------------------------------------------------------
    // Load
    // ------------------------------------------------------------------------

    /// Fetch and parse the catalog, replacing the store on success.
    ///
    /// On failure the store is left as it was and the error is both returned
    /// and written to the status line.
    pub fn load(&mut self, source: &dyn DocumentSource, reader: &dyn DocumentReader) -> Result<usize> {
        self.status = "Loading XML…".to_string();
        let fetched = source.fetch();
        self.load_fetched(fetched, &source.describe(), reader)
    }

    /// Second half of `load`, for callers that fetch without holding the session
    pub fn load_fetched(
        &mut self,
        fetched: Result<String>,
        origin: &str,
        reader: &dyn DocumentReader,
    ) -> Result<usize> {
        match fetched.and_then(|text| parse_catalog(reader, &text)) {
            Ok(students) => {
                let count = students.len();
                self.store.load_all(students);
                self.status = format!("Loaded {} students from XML.", count);
                info!(count, source = origin, "catalog loaded");
                Ok(count)
            }
            Err(err) => {
                warn!(
                    source = origin,
                    error = %err,
                    detail = err.detail().unwrap_or(""),
                    "catalog load failed"
                );
                self.status = format!("Failed to load XML: {}.", err);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Add
    // ------------------------------------------------------------------------

    /// Submit the add form. The form is only read, so on a duplicate the caller
    /// still holds exactly what the user typed.
    pub fn add(&mut self, form: &StudentForm) -> Result<&Student> {
        let student = form.to_student();
        let name = student.name.clone();

        if let Err(err) = self.store.append(student) {
            self.status = format!("{}.", err);
            warn!(error = %err, "student rejected");
            return Err(err);
        }

        self.status = format!("Added \"{}\".", name);
        let total = self.store.len();
        info!(total, "student added");
        // append just pushed, so the last record is the new one
        Ok(&self.store.all()[total - 1])
    }

    // ------------------------------------------------------------------------
    // Search & Sort
    // ------------------------------------------------------------------------

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Column header click
    pub fn click_sort(&mut self, key: SortKey) {
        self.directive.toggle(key);
    }

    pub fn set_directive(&mut self, directive: SortDirective) {
        self.directive = directive;
    }

    pub fn directive(&self) -> SortDirective {
        self.directive
    }

    /// Rows to display for the current query and directive
    pub fn visible(&self) -> Vec<&Student> {
        project(self.store.all(), &self.query, &self.directive)
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    /// Serialize the whole store, ignoring the current search
    pub fn export(&mut self) -> Export {
        let document = serialize_catalog(self.store.all());
        self.status = format!("Exported current data to {}.", EXPORT_FILENAME);
        info!(count = self.store.len(), "catalog exported");

        Export {
            filename: EXPORT_FILENAME,
            document,
            count: self.store.len(),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Adapters report their own outcomes (e.g. a failed file write) here
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

/// Whether an error leaves the user's form worth keeping for a retry
pub fn keeps_form(err: &RosterError) -> bool {
    matches!(err, RosterError::DuplicateIdentifier(_))
}
