//! Runtime configuration and TOML config file loading.
//!
//! [`ResolverConfig`] carries everything the library needs at runtime. It
//! starts from built-in defaults and can be overridden by a [`FileConfig`]
//! read from `config.toml`; the binary then applies its own CLI flags on top.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::direct_link::DEFAULT_DOWNLOAD_BASE_URL;
use crate::metadata::DEFAULT_API_ENDPOINT;

/// Default metadata client connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default metadata client read timeout.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;
/// Default delay between a download trigger and navigation.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
/// Default window during which further download triggers are ignored.
pub const DEFAULT_COOLDOWN_MS: u64 = 5000;

const MAX_TIMEOUT_SECS: u64 = 3600;
const MAX_DELAY_MS: u64 = 60_000;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        /// Path that failed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        /// Path that failed
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range or malformed.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Offending key
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Effective runtime settings for a resolver session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Metadata service endpoint.
    pub api_endpoint: String,
    /// Download redirect service base URL.
    pub download_base_url: String,
    /// HTTP connect timeout.
    pub connect_timeout: Duration,
    /// HTTP total request timeout for metadata lookups.
    pub read_timeout: Duration,
    /// Delay before a triggered download navigates.
    pub debounce: Duration,
    /// How long a download stays in flight before another may start.
    pub cooldown: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
        }
    }
}

impl ResolverConfig {
    /// Overrides defaults with every value present in `file`.
    pub fn apply_file_config(&mut self, file: &FileConfig) {
        if let Some(endpoint) = &file.api_endpoint {
            self.api_endpoint.clone_from(endpoint);
        }
        if let Some(base) = &file.download_base_url {
            self.download_base_url.clone_from(base);
        }
        if let Some(secs) = file.connect_timeout_secs {
            self.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.read_timeout_secs {
            self.read_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = file.debounce_ms {
            self.debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = file.cooldown_ms {
            self.cooldown = Duration::from_millis(ms);
        }
    }

    /// Checks that both service URLs are usable http(s) URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("api_endpoint", &self.api_endpoint)?;
        validate_http_url("download_base_url", &self.download_base_url)?;
        Ok(())
    }
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// TOML-backed file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Metadata service endpoint.
    pub api_endpoint: Option<String>,
    /// Download redirect service base URL.
    pub download_base_url: Option<String>,
    /// Connect timeout in seconds (1..=3600).
    pub connect_timeout_secs: Option<u64>,
    /// Read timeout in seconds (1..=3600).
    pub read_timeout_secs: Option<u64>,
    /// Download debounce in milliseconds (0..=60000).
    pub debounce_ms: Option<u64>,
    /// Download cool-down in milliseconds (0..=60000).
    pub cooldown_ms: Option<u64>,
    /// Default directory for downloaded files.
    pub output_dir: Option<PathBuf>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Parses config from a TOML string without validating ranges.
    ///
    /// # Errors
    ///
    /// Returns the TOML decoder error for bad syntax or unknown keys.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Validates config values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.api_endpoint {
            validate_http_url("api_endpoint", endpoint)?;
        }
        if let Some(base) = &self.download_base_url {
            validate_http_url("download_base_url", base)?;
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        validate_delay_ms("debounce_ms", self.debounce_ms)?;
        validate_delay_ms("cooldown_ms", self.cooldown_ms)?;
        Ok(())
    }
}

fn validate_http_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let parsed =
        Url::parse(value).map_err(|e| ConfigError::invalid(field, format!("'{value}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            field,
            format!("'{value}': expected an http:// or https:// URL"),
        ));
    }
    Ok(())
}

fn validate_timeout_secs(field: &'static str, value: Option<u64>) -> Result<(), ConfigError> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=MAX_TIMEOUT_SECS).contains(&value) {
        return Err(ConfigError::invalid(
            field,
            format!("{value}. Expected range: 1..={MAX_TIMEOUT_SECS}"),
        ));
    }
    Ok(())
}

fn validate_delay_ms(field: &'static str, value: Option<u64>) -> Result<(), ConfigError> {
    let Some(value) = value else {
        return Ok(());
    };
    if value > MAX_DELAY_MS {
        return Err(ConfigError::invalid(
            field,
            format!("{value}. Expected range: 0..={MAX_DELAY_MS}"),
        ));
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Config path consulted, if one could be determined.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    /// Whether configuration was loaded from disk.
    #[must_use]
    pub fn loaded_from_file(&self) -> bool {
        self.config.is_some()
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/megalink/config.toml`
/// 2. `$HOME/.config/megalink/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(
        std::env::var_os("XDG_CONFIG_HOME"),
        std::env::var_os("HOME"),
    )
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg) = xdg_config_home.filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(xdg).join("megalink").join("config.toml"));
    }
    let home = home.filter(|value| !value.is_empty())?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("megalink")
            .join("config.toml"),
    )
}

/// Loads config from the default path if a file exists there.
///
/// # Errors
///
/// Returns [`ConfigError`] when an existing file cannot be read, parsed, or validated.
pub fn load_default_file_config() -> Result<LoadedConfig, ConfigError> {
    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(existing) if existing.exists() => {
            let config = load_file_config(existing)?;
            Ok(LoadedConfig {
                path,
                config: Some(config),
            })
        }
        _ => Ok(LoadedConfig { path, config: None }),
    }
}

/// Loads and validates config from an explicit path.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read, parsed, or validated.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = FileConfig::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}
