// Catalog Store
// Session-lifetime, insertion-ordered collection of students.
//
// Append-only: records are never updated or removed in place. The only other
// mutation is a wholesale replacement after a successful load.

use crate::error::{Result, RosterError};
use crate::record::Student;

#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    students: Vec<Student>,
}

impl CatalogStore {
    pub fn new() -> Self {
        CatalogStore::default()
    }

    /// Replace everything with a freshly loaded sequence.
    ///
    /// The document is the source of truth, so duplicates inside it are taken
    /// as they come.
    pub fn load_all(&mut self, students: Vec<Student>) {
        self.students = students;
    }

    /// Append at the end unless the identifier is already taken
    ///
    /// # Returns
    /// * `Ok(&[Student])` - The updated sequence
    /// * `Err(RosterError::DuplicateIdentifier)` - Store left untouched
    pub fn append(&mut self, student: Student) -> Result<&[Student]> {
        if self.contains(&student.identifier) {
            return Err(RosterError::DuplicateIdentifier(student.identifier));
        }

        self.students.push(student);
        Ok(&self.students)
    }

    pub fn all(&self) -> &[Student] {
        &self.students
    }

    pub fn get(&self, identifier: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.identifier == identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}
