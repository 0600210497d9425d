// View Projector
// (students, search query, sort directive) -> rows to display. Pure.

use crate::error::RosterError;
use crate::record::{FieldValue, SortKey, Student};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SORT DIRECTIVE
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Arrow shown next to the active column header
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(RosterError::UnknownSortDirection(s.to_string())),
        }
    }
}

/// SortDirective - the single active (key, direction) pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        SortDirective { key, direction }
    }

    /// Header click: same column flips direction, another column starts ascending
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key;
            self.direction = SortDirection::Asc;
        }
    }

    fn compare(&self, a: &Student, b: &Student) -> Ordering {
        let ordering = compare_fields(a.field(self.key), b.field(self.key));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Numbers compare numerically, anything else by its string form (case-sensitive)
fn compare_fields(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Number(x), FieldValue::Number(y)) => {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (FieldValue::Text(x), FieldValue::Text(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

// ============================================================================
// PROJECTION
// ============================================================================

/// Case-insensitive substring match on name or section. Blank matches all.
pub fn matches_query(student: &Student, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    student.name.to_lowercase().contains(&needle) || student.section.to_lowercase().contains(&needle)
}

/// Filter then stable-sort. Inputs are never touched.
pub fn project<'a>(students: &'a [Student], query: &str, directive: &SortDirective) -> Vec<&'a Student> {
    let mut rows: Vec<&Student> = students.iter().filter(|s| matches_query(s, query)).collect();
    // slice::sort_by is stable, equal keys keep their filtered order
    rows.sort_by(|a, b| directive.compare(a, b));
    rows
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<'a>(rows: &[&'a Student]) -> Vec<&'a str> {
        rows.iter().map(|s| s.identifier.as_str()).collect()
    }

    fn sample() -> Vec<Student> {
        vec![
            Student::new("S1", "Ana", "A", 1000.0, 200.0),
            Student::new("S2", "Bob", "B", 500.0, 100.0),
            Student::new("S3", "Carla", "C", 1000.0, 300.0),
        ]
    }

    #[test]
    fn test_default_directive_is_name_ascending() {
        let d = SortDirective::default();
        assert_eq!(d.key, SortKey::Name);
        assert_eq!(d.direction, SortDirection::Asc);
    }

    #[test]
    fn test_toggle_rule() {
        let mut d = SortDirective::default();
        d.toggle(SortKey::Name);
        assert_eq!(d, SortDirective::new(SortKey::Name, SortDirection::Desc));

        d.toggle(SortKey::TuitionFee);
        assert_eq!(d, SortDirective::new(SortKey::TuitionFee, SortDirection::Asc));

        d.toggle(SortKey::TuitionFee);
        d.toggle(SortKey::TuitionFee);
        assert_eq!(d.direction, SortDirection::Asc);
    }

    #[test]
    fn test_search_matches_name_or_section_case_insensitive() {
        let students = vec![
            Student::new("S1", "Ana", "A", 0.0, 0.0),
            Student::new("S2", "Bob", "B", 0.0, 0.0),
        ];
        let rows = project(&students, "a", &SortDirective::default());
        assert_eq!(ids(&rows), vec!["S1"]);

        let students = vec![
            Student::new("S1", "Ana", "X", 0.0, 0.0),
            Student::new("S2", "Bob", "Section A", 0.0, 0.0),
        ];
        let rows = project(&students, "A", &SortDirective::default());
        assert_eq!(ids(&rows), vec!["S1", "S2"]);
    }

    #[test]
    fn test_search_name_and_section_independently() {
        let students = vec![
            Student::new("S1", "Marco", "Z", 0.0, 0.0),
            Student::new("S2", "Zed", "MARketing", 0.0, 0.0),
            Student::new("S3", "Zed", "Z", 0.0, 0.0),
        ];
        let rows = project(&students, "mar", &SortDirective::new(SortKey::Identifier, SortDirection::Asc));
        assert_eq!(ids(&rows), vec!["S1", "S2"]);
    }

    #[test]
    fn test_empty_and_blank_query_match_everything() {
        let students = sample();
        assert_eq!(project(&students, "", &SortDirective::default()).len(), 3);
        assert_eq!(project(&students, "   ", &SortDirective::default()).len(), 3);
    }

    #[test]
    fn test_numeric_sort_descending_is_stable() {
        let students = sample();
        let rows = project(&students, "", &SortDirective::new(SortKey::TuitionFee, SortDirection::Desc));
        assert_eq!(ids(&rows), vec!["S1", "S3", "S2"]);

        let rows = project(&students, "", &SortDirective::new(SortKey::TuitionFee, SortDirection::Asc));
        assert_eq!(ids(&rows), vec!["S2", "S1", "S3"]);
    }

    #[test]
    fn test_numeric_sort_is_not_lexicographic() {
        let students = vec![
            Student::new("S1", "A", "A", 900.0, 0.0),
            Student::new("S2", "B", "B", 10000.0, 0.0),
        ];
        let rows = project(&students, "", &SortDirective::new(SortKey::TuitionFee, SortDirection::Asc));
        assert_eq!(ids(&rows), vec!["S1", "S2"]);
    }

    #[test]
    fn test_string_sort_is_case_sensitive() {
        let students = vec![
            Student::new("S1", "bob", "A", 0.0, 0.0),
            Student::new("S2", "Bob", "A", 0.0, 0.0),
            Student::new("S3", "alice", "A", 0.0, 0.0),
        ];
        let rows = project(&students, "", &SortDirective::default());
        assert_eq!(ids(&rows), vec!["S2", "S3", "S1"]);
    }

    #[test]
    fn test_ties_keep_filtered_order_in_both_directions() {
        let students = vec![
            Student::new("S1", "Ana", "A", 0.0, 0.0),
            Student::new("S2", "Ana", "B", 0.0, 0.0),
            Student::new("S3", "Ana", "C", 0.0, 0.0),
        ];
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let rows = project(&students, "", &SortDirective::new(SortKey::Name, direction));
            assert_eq!(ids(&rows), vec!["S1", "S2", "S3"]);
        }
    }

    #[test]
    fn test_project_does_not_mutate_input() {
        let students = sample();
        let before: Vec<String> = students.iter().map(|s| s.identifier.clone()).collect();
        let _ = project(&students, "b", &SortDirective::new(SortKey::Name, SortDirection::Desc));
        let after: Vec<String> = students.iter().map(|s| s.identifier.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert_eq!("Ascending".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert!(matches!(
            "up".parse::<SortDirection>(),
            Err(RosterError::UnknownSortDirection(raw)) if raw == "up"
        ));
        assert_eq!(SortDirection::Desc.to_string(), "desc");
    }
}
