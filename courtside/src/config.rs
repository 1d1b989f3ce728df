// Configuration loading and parsing (config/pipeline.toml).
//
// All the fixed knobs of the pipeline (endpoint, request headers, delay
// interval, retry policy, analysis thresholds, master-table path) live in one
// TOML file so tests can substitute fixtures instead of patching globals.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetch: FetchConfig,
    pub analysis: AnalysisConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    pub endpoint: String,
    pub league_id: String,
    pub timeout_secs: u64,
    pub delay_min_secs: f64,
    pub delay_max_secs: f64,
    pub retry: RetryConfig,
    /// Browser-mimicking headers attached to every request. BTreeMap keeps
    /// the attachment order deterministic.
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Exponential backoff delay before retrying after `attempt` failures
    /// (zero-based), capped at `max_delay_ms`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let ms = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(ms as u64).min(Duration::from_millis(self.max_delay_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub correlation_min_minutes: f64,
    pub regular_season_hist: HistogramFilter,
    pub playoff_hist: HistogramFilter,
}

/// Small-sample filter for the minutes-per-game distribution.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HistogramFilter {
    pub min_minutes: f64,
    pub min_games: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub master_path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/pipeline.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy
/// defaults. Prefer `load_config()` which handles default initialization.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("pipeline.toml");
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config: Config =
        toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })?;

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);

        if target.exists() {
            continue;
        }
        std::fs::copy(&path, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", path.display(), target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working
/// directory, seeding `config/` from `defaults/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let fetch = &config.fetch;

    if !fetch.endpoint.starts_with("http://") && !fetch.endpoint.starts_with("https://") {
        return Err(ConfigError::ValidationError {
            field: "fetch.endpoint".into(),
            message: format!("must be an http(s) URL, got `{}`", fetch.endpoint),
        });
    }

    if fetch.league_id.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "fetch.league_id".into(),
            message: "must not be empty".into(),
        });
    }

    if fetch.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "fetch.timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if fetch.delay_min_secs < 0.0 {
        return Err(ConfigError::ValidationError {
            field: "fetch.delay_min_secs".into(),
            message: format!("must be >= 0, got {}", fetch.delay_min_secs),
        });
    }

    if fetch.delay_max_secs < fetch.delay_min_secs {
        return Err(ConfigError::ValidationError {
            field: "fetch.delay_max_secs".into(),
            message: format!(
                "must be >= delay_min_secs ({}), got {}",
                fetch.delay_min_secs, fetch.delay_max_secs
            ),
        });
    }

    if fetch.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError {
            field: "fetch.retry.max_attempts".into(),
            message: "must be at least 1".into(),
        });
    }

    if fetch.retry.backoff_multiplier < 1.0 {
        return Err(ConfigError::ValidationError {
            field: "fetch.retry.backoff_multiplier".into(),
            message: format!("must be >= 1.0, got {}", fetch.retry.backoff_multiplier),
        });
    }

    for (name, value) in &fetch.request_headers {
        if name.is_empty() || !name.is_ascii() || !value.is_ascii() {
            return Err(ConfigError::ValidationError {
                field: format!("fetch.request_headers.{name}"),
                message: "header names and values must be non-empty ASCII".into(),
            });
        }
    }

    if config.analysis.correlation_min_minutes < 0.0 {
        return Err(ConfigError::ValidationError {
            field: "analysis.correlation_min_minutes".into(),
            message: "must be >= 0".into(),
        });
    }

    for (field, filter) in [
        ("analysis.regular_season_hist", &config.analysis.regular_season_hist),
        ("analysis.playoff_hist", &config.analysis.playoff_hist),
    ] {
        if filter.min_minutes < 0.0 {
            return Err(ConfigError::ValidationError {
                field: format!("{field}.min_minutes"),
                message: "must be >= 0".into(),
            });
        }
    }

    if config.storage.master_path.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "storage.master_path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
