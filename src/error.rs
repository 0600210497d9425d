// Roster errors
// Every failure a session operation can report, recovered at the session boundary

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    /// Non-success response status while retrieving the input document
    #[error("HTTP {status}")]
    Fetch { status: u16 },

    /// The document could not be reached at all (DNS, connection refused, ...)
    #[error("request failed: {0}")]
    Transport(String),

    /// Local input document could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed XML. The detail is kept for logs, users see the generic text.
    #[error("Invalid XML format")]
    Parse { detail: String },

    #[error("Student ID \"{0}\" already exists")]
    DuplicateIdentifier(String),

    #[error("unknown sort key: {0}")]
    UnknownSortKey(String),

    #[error("unknown sort direction: {0}")]
    UnknownSortDirection(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RosterError {
    pub fn parse(detail: impl Into<String>) -> Self {
        RosterError::Parse {
            detail: detail.into(),
        }
    }

    /// Extra context worth logging but not showing in the status line
    pub fn detail(&self) -> Option<&str> {
        match self {
            RosterError::Parse { detail } => Some(detail),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_shows_status() {
        let err = RosterError::Fetch { status: 404 };
        assert_eq!(err.to_string(), "HTTP 404");
    }

    #[test]
    fn test_parse_error_is_generic() {
        let err = RosterError::parse("unexpected end of input inside <student>");
        assert_eq!(err.to_string(), "Invalid XML format");
        assert_eq!(err.detail(), Some("unexpected end of input inside <student>"));
    }

    #[test]
    fn test_duplicate_names_identifier() {
        let err = RosterError::DuplicateIdentifier("S1".to_string());
        assert_eq!(err.to_string(), "Student ID \"S1\" already exists");
        assert!(err.detail().is_none());
    }
}
