//! TOML Configuration File Support
//!
//! Optional client configuration at `~/.config/blindsjn/client.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [session]
//! auto_login_default = true
//!
//! [posts]
//! fetch_ordering = "discard_stale"
//!
//! [logging]
//! filter = "blindsjn_core=debug"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::posts::FetchOrdering;

/// Environment variable for the fetch ordering policy
pub const ENV_FETCH_ORDERING: &str = "BLINDSJN_FETCH_ORDERING";
/// Environment variable for the auto-login default
pub const ENV_AUTO_LOGIN: &str = "BLINDSJN_AUTO_LOGIN";
/// Environment variable for the log filter
pub const ENV_LOG: &str = "BLINDSJN_LOG";

/// Log filter used when nothing else is configured
pub const DEFAULT_LOG_FILTER: &str = "info";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Session section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// Initial auto-login toggle before the credential store is consulted
    pub auto_login_default: Option<bool>,
}

/// Posts section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostsToml {
    /// How overlapping fetches are reconciled
    pub fetch_ordering: Option<FetchOrdering>,
}

/// Logging section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingToml {
    /// `tracing` filter directive
    pub filter: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// Session configuration section
    pub session: SessionToml,

    /// Posts configuration section
    pub posts: PostsToml,

    /// Logging configuration section
    pub logging: LoggingToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Settings for the session machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Initial value of the auto-login toggle
    pub auto_login_default: bool,
}

/// Settings for the post synchronizer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PostsConfig {
    /// How overlapping fetches are reconciled
    pub fetch_ordering: FetchOrdering,
}

/// Resolved client configuration
///
/// Use [`load_config`] to resolve it from every source.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Session machine settings
    pub session: SessionConfig,

    /// Post synchronizer settings
    pub posts: PostsConfig,

    /// `tracing` filter directive
    pub log_filter: String,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            posts: PostsConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with environment overrides, ignoring any config file
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        apply_env_config(&mut config, |key| std::env::var(key).ok());
        config
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/blindsjn/client.toml` or
/// `~/.config/blindsjn/client.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("blindsjn").join("client.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// If `path` is `None`, only defaults and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if an environment variable holds an invalid value.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    let mut config = load_file_config(path)?;
    check_env_config(|key| std::env::var(key).ok())?;
    apply_env_config(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Defaults plus the file at `path`, without environment overrides
fn load_file_config(path: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::default();

    let Some(config_path) = path else {
        return Ok(config);
    };
    if !config_path.exists() {
        tracing::debug!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        return Ok(config);
    }

    let toml_content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
            path: config_path.clone(),
            source: e,
        })?;
    let toml_config: ClientToml = toml::from_str(&toml_content)?;
    apply_toml_config(&mut config, &toml_config);
    config.config_file_path = Some(config_path.clone());
    config.source = ConfigSource::File;

    tracing::info!(path = %config_path.display(), "Loaded configuration from file");
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ClientConfig, toml: &ClientToml) {
    if let Some(enabled) = toml.session.auto_login_default {
        config.session.auto_login_default = enabled;
    }
    if let Some(ordering) = toml.posts.fetch_ordering {
        config.posts.fetch_ordering = ordering;
    }
    if let Some(filter) = &toml.logging.filter {
        config.log_filter.clone_from(filter);
    }
}

/// Parse a boolean environment value; anything unrecognized is `None`
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reject environment values that cannot be applied
fn check_env_config(lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
    if let Some(ordering) = lookup(ENV_FETCH_ORDERING) {
        ordering
            .parse::<FetchOrdering>()
            .map_err(|e| ConfigError::ValidationError(format!("{ENV_FETCH_ORDERING}: {e}")))?;
    }
    if let Some(enabled) = lookup(ENV_AUTO_LOGIN) {
        if parse_flag(&enabled).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "{ENV_AUTO_LOGIN}: expected true/false, 1/0, yes/no or on/off, got {enabled:?}"
            )));
        }
    }
    Ok(())
}

/// Apply environment variable overrides to the config
///
/// Unparseable values are skipped.
fn apply_env_config(config: &mut ClientConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(ordering) = lookup(ENV_FETCH_ORDERING) {
        if let Ok(ordering) = ordering.parse() {
            config.posts.fetch_ordering = ordering;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(enabled) = lookup(ENV_AUTO_LOGIN).as_deref().and_then(parse_flag) {
        config.session.auto_login_default = enabled;
        config.source = ConfigSource::Env;
    }
    if let Some(filter) = lookup(ENV_LOG) {
        if !filter.trim().is_empty() {
            config.log_filter = filter;
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Auto-login default override
    pub auto_login_default: Option<bool>,

    /// Fetch ordering override
    pub fetch_ordering: Option<FetchOrdering>,

    /// Log filter override
    pub log_filter: Option<String>,
}

impl ConfigOverrides {
    /// Create empty overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the auto-login default
    #[must_use]
    pub fn with_auto_login_default(mut self, enabled: bool) -> Self {
        self.auto_login_default = Some(enabled);
        self
    }

    /// Override the fetch ordering
    #[must_use]
    pub fn with_fetch_ordering(mut self, ordering: FetchOrdering) -> Self {
        self.fetch_ordering = Some(ordering);
        self
    }

    /// Override the log filter
    #[must_use]
    pub fn with_log_filter(mut self, filter: String) -> Self {
        self.log_filter = Some(filter);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(enabled) = self.auto_login_default {
            config.session.auto_login_default = enabled;
            config.source = ConfigSource::Cli;
        }
        if let Some(ordering) = self.fetch_ordering {
            config.posts.fetch_ordering = ordering;
            config.source = ConfigSource::Cli;
        }
        if let Some(filter) = &self.log_filter {
            config.log_filter.clone_from(filter);
            config.source = ConfigSource::Cli;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();

        assert!(!config.session.auto_login_default);
        assert_eq!(config.posts.fetch_ordering, FetchOrdering::LastWriteWins);
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.config_file_path, None);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("blindsjn"));
            assert!(p.to_string_lossy().ends_with("client.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let file = write_toml(
            r#"
[session]
auto_login_default = true

[posts]
fetch_ordering = "discard_stale"

[logging]
filter = "blindsjn_core=debug"
"#,
        );

        let config = load_file_config(Some(file.path().to_path_buf())).unwrap();

        assert!(config.session.auto_login_default);
        assert_eq!(config.posts.fetch_ordering, FetchOrdering::DiscardStale);
        assert_eq!(config.log_filter, "blindsjn_core=debug");
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
        assert_eq!(config.source(), ConfigSource::File);
    }

    #[test]
    fn test_parse_partial_toml() {
        let file = write_toml("[posts]\nfetch_ordering = \"discard_stale\"\n");

        let config = load_file_config(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.posts.fetch_ordering, FetchOrdering::DiscardStale);
        assert!(!config.session.auto_login_default);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_parse_empty_toml() {
        let file = write_toml("");
        let config = load_file_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.posts, PostsConfig::default());
        assert_eq!(config.source(), ConfigSource::File);
    }

    #[test]
    fn test_missing_file_graceful() {
        let config =
            load_file_config(Some(PathBuf::from("/nonexistent/blindsjn/client.toml"))).unwrap();
        assert_eq!(config.config_file_path, None);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[posts\nfetch_ordering = ");
        let result = load_file_config(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_unknown_ordering_in_file_is_parse_error() {
        let file = write_toml("[posts]\nfetch_ordering = \"newest_first\"\n");
        let result = load_file_config(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    // =========================================================================
    // Environment Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml("[posts]\nfetch_ordering = \"discard_stale\"\n");
        let mut config = load_file_config(Some(file.path().to_path_buf())).unwrap();

        apply_env_config(
            &mut config,
            env(&[
                (ENV_FETCH_ORDERING, "last-write-wins"),
                (ENV_AUTO_LOGIN, "true"),
            ]),
        );

        assert_eq!(config.posts.fetch_ordering, FetchOrdering::LastWriteWins);
        assert!(config.session.auto_login_default);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_env_flag_parsing() {
        let mut config = ClientConfig::default();
        apply_env_config(&mut config, env(&[(ENV_AUTO_LOGIN, "1")]));
        assert!(config.session.auto_login_default);

        apply_env_config(&mut config, env(&[(ENV_AUTO_LOGIN, "FALSE")]));
        assert!(!config.session.auto_login_default);

        for (value, expected) in [("yes", true), (" On ", true), ("no", false), ("off", false)] {
            apply_env_config(&mut config, env(&[(ENV_AUTO_LOGIN, value)]));
            assert_eq!(config.session.auto_login_default, expected, "value {value:?}");
        }
    }

    #[test]
    fn test_unrecognized_env_flag_is_rejected_and_skipped() {
        let result = check_env_config(env(&[(ENV_AUTO_LOGIN, "maybe")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
        assert!(check_env_config(env(&[(ENV_AUTO_LOGIN, "off")])).is_ok());

        let mut config = ClientConfig::default();
        apply_env_config(&mut config, env(&[(ENV_AUTO_LOGIN, "maybe")]));
        assert!(!config.session.auto_login_default);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_blank_env_log_filter_ignored() {
        let mut config = ClientConfig::default();
        apply_env_config(&mut config, env(&[(ENV_LOG, "  ")]));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_invalid_env_ordering_rejected() {
        let result = check_env_config(env(&[(ENV_FETCH_ORDERING, "sometimes")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
        assert!(check_env_config(env(&[])).is_ok());
    }

    // =========================================================================
    // ConfigOverrides Tests
    // =========================================================================

    #[test]
    fn test_cli_overrides_env() {
        let mut config = ClientConfig::default();
        apply_env_config(&mut config, env(&[(ENV_LOG, "warn")]));

        ConfigOverrides::new()
            .with_log_filter("trace".to_string())
            .apply(&mut config);

        assert_eq!(config.log_filter, "trace");
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_config_overrides_empty_no_change() {
        let mut config = ClientConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_config_overrides_builder() {
        let overrides = ConfigOverrides::new()
            .with_auto_login_default(true)
            .with_fetch_ordering(FetchOrdering::DiscardStale);

        let mut config = ClientConfig::default();
        overrides.apply(&mut config);

        assert!(config.session.auto_login_default);
        assert_eq!(config.posts.fetch_ordering, FetchOrdering::DiscardStale);
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }

    #[test]
    fn test_toml_round_trip() {
        let original = ClientToml {
            posts: PostsToml {
                fetch_ordering: Some(FetchOrdering::DiscardStale),
            },
            ..ClientToml::default()
        };
        let text = toml::to_string(&original).unwrap();
        assert!(text.contains("discard_stale"));

        let parsed: ClientToml = toml::from_str(&text).unwrap();
        assert_eq!(parsed.posts.fetch_ordering, Some(FetchOrdering::DiscardStale));
        assert_eq!(parsed.session.auto_login_default, None);
    }
}
