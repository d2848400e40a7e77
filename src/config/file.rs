//! Configuration file support for duckframe
//!
//! Session settings can be kept in a TOML file and turned into a
//! [`SessionConfigBuilder`]. Pre/post-processors cannot be expressed in TOML;
//! add them to the returned builder.
//!
//! ## Example Configuration
//!
//! ```toml
//! # duckframe.toml
//!
//! [session]
//! init_queries = ["CREATE TABLE t AS SELECT 1 AS x"]
//! verbose = true
//! profile = false
//! on_error = "return-empty"
//! readonly = false
//!
//! [options]
//! memory_limit = "256MB"
//! threads = 2
//! extensions = ["json"]
//! batch_size = 500
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use duckframe_engine::config::{OptionValue, SessionConfig, SessionConfigBuilder};
use duckframe_engine::error::{EngineError, Result};

use super::defaults::{CONFIG_DIR_NAME, DEFAULT_CONFIG_FILE};

/// Root configuration structure for TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Session behaviour
    pub session: SessionSection,

    /// Engine options, applied in file order
    pub options: toml::Table,
}

/// Session section configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Statements run once after the connection opens
    pub init_queries: Vec<String>,

    /// Log registration fallbacks and recovered rows
    pub verbose: Option<bool>,

    /// Log per-statement timing
    pub profile: Option<bool>,

    /// Error policy (fail, return-empty, log-and-return-empty)
    pub on_error: Option<String>,

    /// Open file stores read-only
    pub readonly: Option<bool>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::parse(&contents)
            .map_err(|e| EngineError::Config(format!("Config file {:?}: {}", path, e)))
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Try to load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./duckframe.toml
    /// 2. ~/.config/duckframe/duckframe.toml
    pub fn load_default() -> Option<Self> {
        let default_paths = [
            PathBuf::from(DEFAULT_CONFIG_FILE),
            dirs::config_dir()
                .map(|p| p.join(CONFIG_DIR_NAME).join(DEFAULT_CONFIG_FILE))
                .unwrap_or_default(),
        ];

        for path in default_paths.iter().filter(|p| !p.as_os_str().is_empty()) {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        tracing::debug!(path = ?path, "Loaded configuration");
                        return Some(config);
                    }
                    Err(e) => {
                        tracing::warn!(path = ?path, error = %e, "Failed to load config");
                    }
                }
            }
        }

        None
    }

    /// Convert into a session builder.
    ///
    /// Option values are checked for representability here; semantic
    /// validation happens in [`SessionConfigBuilder::build`].
    pub fn into_builder(self) -> Result<SessionConfigBuilder> {
        let session = self.session;
        let mut builder = SessionConfig::builder().init_queries(session.init_queries);

        if let Some(verbose) = session.verbose {
            builder = builder.verbose(verbose);
        }
        if let Some(profile) = session.profile {
            builder = builder.profile(profile);
        }
        if let Some(readonly) = session.readonly {
            builder = builder.readonly(readonly);
        }
        if let Some(on_error) = session.on_error {
            builder = builder.on_error(on_error);
        }

        for (key, value) in self.options {
            let value: OptionValue = value.try_into().map_err(|e| {
                EngineError::Config(format!("Unsupported value for option '{}': {}", key, e))
            })?;
            builder = builder.option(key, value);
        }

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duckframe_engine::config::OnError;
    use std::io::Write;

    const FULL: &str = r#"
        [session]
        init_queries = ["CREATE TABLE t AS SELECT 1 AS x"]
        verbose = true
        on_error = "return-empty"

        [options]
        memory_limit = "256MB"
        threads = 2
        extensions = ["json"]
        batch_size = 500
    "#;

    #[test]
    fn test_parse_empty_config() {
        let config: ConfigFile = toml::from_str("").unwrap();
        assert!(config.session.init_queries.is_empty());
        assert!(config.options.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = ConfigFile::parse(FULL).unwrap();
        assert_eq!(config.session.verbose, Some(true));
        assert_eq!(config.session.on_error.as_deref(), Some("return-empty"));
        assert_eq!(config.session.init_queries.len(), 1);
    }

    #[test]
    fn test_into_builder_keeps_option_order() {
        let config = ConfigFile::parse(FULL).unwrap().into_builder().unwrap().build().unwrap();
        let keys: Vec<&str> = config.options().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["memory_limit", "threads", "extensions", "batch_size"]);
        assert_eq!(config.batch_size(), 500);
        assert_eq!(config.on_error(), OnError::ReturnEmpty);
        assert!(config.verbose());
        assert!(!config.profile());
    }

    #[test]
    fn test_invalid_policy_rejected_at_build() {
        let builder = ConfigFile::parse("[session]\non_error = \"shrug\"")
            .unwrap()
            .into_builder()
            .unwrap();
        assert!(matches!(builder.build(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_unrepresentable_option_rejected() {
        let err = ConfigFile::parse("[options]\nnested = { a = 1 }")
            .unwrap()
            .into_builder()
            .err()
            .unwrap();
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn test_parse_error_is_config_error() {
        assert!(matches!(
            ConfigFile::parse("[session"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = ConfigFile::load(file.path()).unwrap();
        assert_eq!(config.options.len(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigFile::load("/definitely/not/here/duckframe.toml").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
