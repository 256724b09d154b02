//! Configuration management for EmDee.
//!
//! Parses `emdee.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [render]
//! math = true
//! highlight = true
//! smart_punctuation = true
//! linkify = true
//! asset_scheme = "file"
//! memo_entries = 8
//!
//! [toc]
//! threshold_offset = 120.0
//! bottom_epsilon = 4.0
//! max_level = 4
//!
//! [search]
//! min_query_chars = 1
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override math typesetting.
    pub math: Option<bool>,
    /// Override syntax highlighting.
    pub highlight: Option<bool>,
    /// Override the asset URI scheme.
    pub asset_scheme: Option<AssetScheme>,
    /// Override the deepest table of contents level.
    pub max_level: Option<u8>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "emdee.toml";

/// Upper bound of `render.memo_entries`.
const MAX_MEMO_ENTRIES: usize = 256;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Rendering configuration.
    pub render: RenderConfig,
    /// Table of contents configuration.
    pub toc: TocConfig,
    /// Search configuration.
    pub search: SearchConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// URI form used for local images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetScheme {
    /// `file:///abs/path`
    #[default]
    File,
    /// `asset://localhost/<encoded path>`
    Asset,
}

/// Rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Typeset `$…$` math once the extension is loaded.
    pub math: bool,
    /// Syntax-highlight fenced code blocks.
    pub highlight: bool,
    /// Typographic quotes and dashes.
    pub smart_punctuation: bool,
    /// Link bare `http(s)` URLs and email addresses.
    pub linkify: bool,
    /// URI form of resolved images.
    pub asset_scheme: AssetScheme,
    /// Number of memoized renders.
    pub memo_entries: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            math: true,
            highlight: true,
            smart_punctuation: true,
            linkify: true,
            asset_scheme: AssetScheme::File,
            memo_entries: 8,
        }
    }
}

/// Table of contents configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    /// Distance in pixels below the viewport top where a heading becomes active.
    pub threshold_offset: f64,
    /// Distance in pixels from the end of the scroll range counted as the bottom.
    pub bottom_epsilon: f64,
    /// Deepest heading level listed.
    pub max_level: u8,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            threshold_offset: 120.0,
            bottom_epsilon: 4.0,
            max_level: 4,
        }
    }
}

/// Search configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Characters required before a query runs.
    pub min_query_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { min_query_chars: 1 }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a float field to be finite and not negative.
fn require_non_negative(value: f64, field: &str) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

/// Require an integer field to lie within `min..=max`.
fn require_range(value: usize, min: usize, max: usize, field: &str) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{field} must be between {min} and {max}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `emdee.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting values are invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let discovered = match config_path {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => std::env::current_dir()
                .ok()
                .and_then(|cwd| Self::discover_from(&cwd)),
        };

        let mut config = match discovered {
            Some(path) => Self::load_from_file(&path)?,
            None => {
                tracing::debug!("No {CONFIG_FILENAME} found, using defaults");
                Self::default()
            }
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(math) = settings.math {
            self.render.math = math;
        }
        if let Some(highlight) = settings.highlight {
            self.render.highlight = highlight;
        }
        if let Some(scheme) = settings.asset_scheme {
            self.render.asset_scheme = scheme;
        }
        if let Some(max_level) = settings.max_level {
            self.toc.max_level = max_level;
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "Discovered config file");
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_range(
            self.render.memo_entries,
            1,
            MAX_MEMO_ENTRIES,
            "render.memo_entries",
        )?;
        require_non_negative(self.toc.threshold_offset, "toc.threshold_offset")?;
        require_non_negative(self.toc.bottom_epsilon, "toc.bottom_epsilon")?;
        require_range(usize::from(self.toc.max_level), 1, 6, "toc.max_level")?;
        if self.search.min_query_chars == 0 {
            return Err(ConfigError::Validation(
                "search.min_query_chars must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}
