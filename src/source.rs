// Document Source
// Where the catalog document comes from: a local file, or a URL with `http`

use crate::error::{Result, RosterError};
use std::path::PathBuf;
use tracing::debug;

/// Default input document, relative to the working directory
pub const DEFAULT_SOURCE: &str = "./students.xml";

/// DocumentSource - fetches the raw catalog text
pub trait DocumentSource: Send + Sync {
    fn fetch(&self) -> Result<String>;

    /// Human-readable location for logs and banners
    fn describe(&self) -> String;
}

// ============================================================================
// FILE SOURCE
// ============================================================================

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

impl DocumentSource for FileSource {
    fn fetch(&self) -> Result<String> {
        debug!(path = %self.path.display(), "reading catalog file");
        std::fs::read_to_string(&self.path).map_err(|source| RosterError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ============================================================================
// HTTP SOURCE
// ============================================================================

/// HttpSource - single GET of a static document, never cached
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        HttpSource {
            url: url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

#[cfg(feature = "http")]
impl DocumentSource for HttpSource {
    fn fetch(&self) -> Result<String> {
        debug!(url = %self.url, "fetching catalog");
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .map_err(|e| RosterError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RosterError::Fetch {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .map_err(|e| RosterError::Transport(e.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// ============================================================================
// FACTORY
// ============================================================================

pub fn is_remote(location: &str) -> bool {
    let lower = location.trim().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Pick a source for a configured location
///
/// URLs need the `http` feature; without it they are a configuration error.
pub fn source_from_location(location: &str) -> Result<Box<dyn DocumentSource>> {
    if is_remote(location) {
        #[cfg(feature = "http")]
        {
            return Ok(Box::new(HttpSource::new(location.trim())));
        }
        #[cfg(not(feature = "http"))]
        {
            return Err(RosterError::Config(format!(
                "{} is a URL but remote sources need the `http` feature",
                location
            )));
        }
    }

    Ok(Box::new(FileSource::new(location)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_source_reads_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<catalog/>").unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(source.fetch().unwrap(), "<catalog/>");
        assert_eq!(source.describe(), file.path().display().to_string());
    }

    #[test]
    fn test_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("nope.xml"));

        match source.fetch() {
            Err(RosterError::Io { path, .. }) => assert!(path.ends_with("nope.xml")),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("http://localhost/students.xml"));
        assert!(is_remote("HTTPS://example.org/x.xml"));
        assert!(!is_remote("./students.xml"));
        assert!(!is_remote("/data/http.xml"));
    }

    #[test]
    fn test_local_location_gives_file_source() {
        let source = source_from_location("./students.xml").unwrap();
        assert_eq!(source.describe(), "./students.xml");
    }

    #[cfg(not(feature = "http"))]
    #[test]
    fn test_url_without_http_feature_is_config_error() {
        assert!(matches!(
            source_from_location("http://localhost/students.xml"),
            Err(RosterError::Config(_))
        ));
    }
}
