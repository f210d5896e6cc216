//! Configuration loading.
//!
//! Every field has a default equal to the behavior of the original plugin, so
//! a run with [`Config::default()`] needs no configuration at all. Embedders
//! that want to tune the check can layer explicit files and environment
//! variables on top with [`ConfigLoader`].
//!
//! # Supported formats
//!
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Precedence (highest first)
//! - `CHARLIMIT_*` environment variables (nested keys split on `__`,
//!   e.g. `CHARLIMIT_LIMIT__KEYWORD=MAX`)
//! - explicit files, later files overriding earlier ones
//! - defaults
//!
//! # Example
//! ```no_run
//! use charlimit_core::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_file("charlimit.toml")
//!     .load()
//!     .unwrap();
//! assert_eq!(config.limit.keyword, "CC");
//! ```

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::host::Rgb;

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "CHARLIMIT_";

/// The configuration for charlimit.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Log level for the diagnostic channel (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files. Console-only logging when unset.
    pub log_dir: Option<Utf8PathBuf>,
    /// How limit tags are recognized in layer names.
    pub limit: LimitConfig,
    /// Appearance and bookkeeping of flag markers.
    pub flag: FlagStyle,
    /// Display durations for the status message.
    pub notify: NotifyConfig,
    /// What to do with a marked layer whose limit tag has been removed.
    pub untagged: UntaggedPolicy,
    /// How text length is measured.
    pub count_mode: CountMode,
}

impl Config {
    /// Reject values that deserialize fine but cannot drive a run.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.limit.keyword.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "limit.keyword",
                reason: "must not be empty".to_string(),
            });
        }
        if self.flag.data_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "flag.data_key",
                reason: "must not be empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.flag.opacity) {
            return Err(ConfigError::InvalidValue {
                field: "flag.opacity",
                reason: format!("{} is outside 0.0..=1.0", self.flag.opacity),
            });
        }
        let Rgb { r, g, b } = self.flag.color;
        for (field, channel) in [
            ("flag.color.r", r),
            ("flag.color.g", g),
            ("flag.color.b", b),
        ] {
            if !(0.0..=1.0).contains(&channel) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{channel} is outside 0.0..=1.0"),
                });
            }
        }
        Ok(())
    }
}

/// Limit tag recognition settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitConfig {
    /// Keyword preceding the colon, as in `CC:120`.
    pub keyword: String,
    /// Match the keyword regardless of case.
    pub case_insensitive: bool,
    /// Largest limit accepted. Larger captures count as "no limit".
    pub max_limit: Option<usize>,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            keyword: "CC".to_string(),
            case_insensitive: true,
            max_limit: None,
        }
    }
}

/// Flag marker appearance.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FlagStyle {
    /// Marker name prefix. The excess character count is appended.
    pub name_prefix: String,
    /// Key under which a text layer stores its marker id.
    pub data_key: String,
    /// Fill color of the marker.
    pub color: Rgb,
    /// Layer opacity of the marker.
    pub opacity: f64,
}

impl Default for FlagStyle {
    fn default() -> Self {
        Self {
            name_prefix: "FLAGGED: Character count exceeded by ".to_string(),
            data_key: "FLAG_ID".to_string(),
            color: Rgb::new(1.0, 0.286, 0.286),
            opacity: 0.4,
        }
    }
}

/// Status message display durations, in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotifyConfig {
    /// Duration of the all-clear message.
    pub short_ms: u64,
    /// Duration of the violation summary.
    pub long_ms: u64,
}

impl NotifyConfig {
    /// Short interval as a [`Duration`].
    pub const fn short(&self) -> Duration {
        Duration::from_millis(self.short_ms)
    }

    /// Long interval as a [`Duration`].
    pub const fn long(&self) -> Duration {
        Duration::from_millis(self.long_ms)
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            short_ms: 2000,
            long_ms: 4000,
        }
    }
}

/// Handling of text layers that carry no limit tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UntaggedPolicy {
    /// Remove a marker left over from when the layer was still tagged.
    #[default]
    Unflag,
    /// Leave any existing marker and back-reference alone.
    Keep,
}

/// Unit in which text length is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    /// UTF-16 code units, matching the host's own string length.
    #[default]
    Utf16,
    /// Unicode scalar values.
    Chars,
}

impl CountMode {
    /// Length of `text` in this unit.
    pub fn measure(self, text: &str) -> usize {
        match self {
            Self::Utf16 => text.encode_utf16().count(),
            Self::Chars => text.chars().count(),
        }
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Builder for loading configuration from multiple sources.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Explicit config files to load, lowest precedence first.
    explicit_files: Vec<Utf8PathBuf>,
    /// Whether `CHARLIMIT_*` variables are merged last.
    include_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub const fn new() -> Self {
        Self {
            explicit_files: Vec::new(),
            include_env: true,
        }
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order, with later files taking precedence.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Set whether environment variables override file values.
    pub const fn with_env(mut self, include: bool) -> Self {
        self.include_env = include;
        self
    }

    /// Load and validate configuration, merging all sources.
    #[tracing::instrument(skip(self), fields(files = self.explicit_files.len()))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }

        // CHARLIMIT_LOG_LEVEL=debug, CHARLIMIT_FLAG__OPACITY=0.5, etc.
        if self.include_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).lowercase(true).split("__"));
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        config.validate()?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            keyword = %config.limit.keyword,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}
