// Configuration
// defaults -> optional TOML file -> ROSTER_* environment -> command-line flags

use crate::error::{Result, RosterError};
use crate::source::DEFAULT_SOURCE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "roster.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterConfig {
    /// Input document: a path, or an http(s) URL with the `http` feature
    pub source: String,
    /// Directory the export file is written into
    pub export_dir: PathBuf,
    /// Address the HTTP adapter listens on
    pub bind_addr: String,
    /// tracing-subscriber EnvFilter directive, RUST_LOG wins when set
    pub log_filter: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        RosterConfig {
            source: DEFAULT_SOURCE.to_string(),
            export_dir: PathBuf::from("."),
            bind_addr: "0.0.0.0:3000".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl RosterConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| RosterError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Resolve the configuration the binaries run with.
    ///
    /// An explicit path must exist; the implicit `roster.toml` is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment-style lookups (injected for tests)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ROSTER_SOURCE") {
            self.source = v;
        }
        if let Some(v) = get("ROSTER_EXPORT_DIR") {
            self.export_dir = PathBuf::from(v);
        }
        if let Some(v) = get("ROSTER_BIND") {
            self.bind_addr = v;
        }
        if let Some(v) = get("ROSTER_LOG") {
            self.log_filter = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RosterConfig::default();
        assert_eq!(config.source, "./students.xml");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RosterConfig::from_toml_str("source = \"/srv/roster.xml\"\n").unwrap();
        assert_eq!(config.source, "/srv/roster.xml");
        assert_eq!(config.export_dir, PathBuf::from("."));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = RosterConfig::from_toml_str("sorce = \"typo.xml\"\n");
        assert!(matches!(result, Err(RosterError::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_addr = \"127.0.0.1:8080\"").unwrap();
        writeln!(file, "export_dir = \"/tmp/out\"").unwrap();

        let config = RosterConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = RosterConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(RosterError::Io { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ROSTER_SOURCE", "http://host/students.xml"),
            ("ROSTER_LOG", "debug"),
            ("ROSTER_BIND", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = RosterConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.source, "http://host/students.xml");
        assert_eq!(config.log_filter, "debug");
        // blank values are ignored
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }
}
