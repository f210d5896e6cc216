//! Diagnostic logging setup.
//!
//! The check itself only emits `tracing` events. Hosts that want them on
//! stderr, or as JSON lines in a log directory, call [`init_from_config`]
//! (or [`init_observability`] with their own filter) once at startup and
//! keep the returned guard alive.
//!
//! ```no_run
//! use charlimit_core::config::ConfigLoader;
//! use charlimit_core::observability::init_from_config;
//!
//! let config = ConfigLoader::new().load().unwrap();
//! let _guard = init_from_config(&config, false, 0).unwrap();
//! ```

use camino::Utf8PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::Config;

/// Log file name prefix inside the log directory.
const LOG_FILE_PREFIX: &str = "charlimit.jsonl";

/// Environment variable naming an explicit log directory.
const LOG_DIR_ENV: &str = "CHARLIMIT_LOG_DIR";

/// Where diagnostics go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Directory for daily-rolling JSONL files. Stderr only when `None`.
    pub log_dir: Option<Utf8PathBuf>,
}

impl ObservabilityConfig {
    /// Resolve the log directory: `CHARLIMIT_LOG_DIR`, then the configured
    /// `log_dir`, then nothing.
    pub fn from_env_with_overrides(config: &Config) -> Self {
        let from_env = std::env::var(LOG_DIR_ENV)
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(Utf8PathBuf::from);
        Self {
            log_dir: from_env.or_else(|| config.log_dir.clone()),
        }
    }
}

/// Build the event filter.
///
/// `RUST_LOG` wins when set. Otherwise `quiet` limits output to errors,
/// each `verbose` step raises the level (`-v` debug, `-vv` trace), and the
/// configured level applies when neither is given.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => default_level,
            1 => "debug",
            _ => "trace",
        }
    };
    EnvFilter::new(level)
}

/// Install the global subscriber.
///
/// Always logs human-readable events to stderr; additionally writes JSON
/// lines to a daily-rolling file when a log directory is configured. The
/// returned guard flushes the file writer when dropped.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> Result<Option<WorkerGuard>, TryInitError> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir.as_std_path(), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()?;
            Ok(None)
        }
    }
}

/// Install the global subscriber from a loaded [`Config`].
///
/// The log directory comes from [`ObservabilityConfig::from_env_with_overrides`]
/// and the level from [`env_filter`] with the configured `log_level`.
pub fn init_from_config(
    config: &Config,
    quiet: bool,
    verbose: u8,
) -> Result<Option<WorkerGuard>, TryInitError> {
    let observability = ObservabilityConfig::from_env_with_overrides(config);
    let filter = env_filter(quiet, verbose, config.log_level.as_str());
    init_observability(&observability, filter)
}
