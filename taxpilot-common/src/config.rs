//! Configuration loading
//!
//! Resolution priority, highest first:
//! 1. Command-line argument (handled by each service binary via clap)
//! 2. Environment variable
//! 3. TOML config file (`TAXPILOT_CONFIG` or `./taxpilot.toml`)
//! 4. Compiled default

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Shared service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxpilotConfig {
    /// Listen port for taxpilot-agent
    pub agent_port: u16,
    /// Listen port for taxpilot-review
    pub review_port: u16,
    /// SQLite database file shared by all services
    pub database_path: PathBuf,
    /// Base URL of the optional remote reasoning agent
    pub remote_url: Option<String>,
    /// Request timeout for the remote reasoning agent
    pub remote_timeout_secs: u64,
}

impl Default for TaxpilotConfig {
    fn default() -> Self {
        Self {
            agent_port: 8700,
            review_port: 8710,
            database_path: PathBuf::from("taxpilot.db"),
            remote_url: None,
            remote_timeout_secs: 10,
        }
    }
}

/// Optional fields as they appear in the TOML file.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    agent_port: Option<u16>,
    review_port: Option<u16>,
    database_path: Option<PathBuf>,
    remote_url: Option<String>,
    remote_timeout_secs: Option<u64>,
}

impl TaxpilotConfig {
    /// Load configuration, applying file values then environment overrides.
    pub fn load(cli_config: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = resolve_config_file(cli_config) {
            let contents = std::fs::read_to_string(&path)?;
            config = config.merge_file(&contents).map_err(|e| {
                Error::Config(format!("{}: {e}", path.display()))
            })?;
        }

        if let Ok(path) = std::env::var("TAXPILOT_DB") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("TAXPILOT_REMOTE_URL") {
            if !url.is_empty() {
                config.remote_url = Some(url);
            }
        }
        if let Ok(secs) = std::env::var("TAXPILOT_REMOTE_TIMEOUT_SECS") {
            config.remote_timeout_secs = secs
                .parse()
                .map_err(|_| Error::Config(format!("bad TAXPILOT_REMOTE_TIMEOUT_SECS: {secs}")))?;
        }

        Ok(config)
    }

    /// Overlay values from TOML file contents.
    fn merge_file(mut self, contents: &str) -> Result<Self> {
        let file: FileConfig =
            toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;

        if let Some(port) = file.agent_port {
            self.agent_port = port;
        }
        if let Some(port) = file.review_port {
            self.review_port = port;
        }
        if let Some(path) = file.database_path {
            self.database_path = path;
        }
        if file.remote_url.is_some() {
            self.remote_url = file.remote_url;
        }
        if let Some(secs) = file.remote_timeout_secs {
            self.remote_timeout_secs = secs;
        }

        Ok(self)
    }
}

/// Find the config file to read, if any.
fn resolve_config_file(cli_config: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_config {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var("TAXPILOT_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from("taxpilot.toml");
    if local.exists() {
        return Some(local);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TaxpilotConfig::default();
        assert_eq!(config.agent_port, 8700);
        assert_eq!(config.review_port, 8710);
        assert_eq!(config.database_path, PathBuf::from("taxpilot.db"));
        assert!(config.remote_url.is_none());
        assert_eq!(config.remote_timeout_secs, 10);
    }

    #[test]
    fn test_merge_file_overrides() {
        let config = TaxpilotConfig::default()
            .merge_file(
                r#"
                agent_port = 9000
                database_path = "/var/lib/taxpilot/taxpilot.db"
                remote_url = "http://localhost:8000"
                "#,
            )
            .unwrap();
        assert_eq!(config.agent_port, 9000);
        assert_eq!(config.review_port, 8710);
        assert_eq!(
            config.database_path,
            PathBuf::from("/var/lib/taxpilot/taxpilot.db")
        );
        assert_eq!(config.remote_url.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_merge_file_rejects_bad_toml() {
        let result = TaxpilotConfig::default().merge_file("agent_port = \"not a port\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
