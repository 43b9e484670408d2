//! Predictor settings read from the host schema.
//!
//! The host exposes its configuration through `ConfigSource` (slash-separated
//! key paths such as `predictor/db`). Missing keys fall back to the defaults
//! embedded from `default_settings.toml` and are logged at info level.

use std::sync::OnceLock;

use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

pub const DB_KEY: &str = "predictor/db";
pub const MAX_CANDIDATES_KEY: &str = "predictor/max_candidates";
pub const MAX_ITERATIONS_KEY: &str = "predictor/max_iterations";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Read-only key lookup into a host configuration tree.
pub trait ConfigSource {
    fn get_string(&self, path: &str) -> Option<String>;
    fn get_int(&self, path: &str) -> Option<i64>;
}

impl ConfigSource for toml::Table {
    fn get_string(&self, path: &str) -> Option<String> {
        lookup_path(self, path)?.as_str().map(str::to_string)
    }

    fn get_int(&self, path: &str) -> Option<i64> {
        lookup_path(self, path)?.as_integer()
    }
}

fn lookup_path<'a>(table: &'a toml::Table, path: &str) -> Option<&'a toml::Value> {
    let mut parts = path.split('/');
    let mut value = table.get(parts.next()?)?;
    for part in parts {
        value = value.as_table()?.get(part)?;
    }
    Some(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PredictorSettings {
    /// Database name, resolved to a path by the host.
    pub db: String,
    /// Candidates offered per prediction; 0 = unlimited.
    pub max_candidates: usize,
    /// Consecutive prediction commits before the chain stops; 0 = unlimited.
    pub max_iterations: usize,
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    predictor: PredictorSettings,
}

impl Default for PredictorSettings {
    fn default() -> Self {
        default_settings().clone()
    }
}

impl PredictorSettings {
    /// Resolve settings from a schema config, keeping defaults for missing
    /// or invalid keys.
    pub fn from_config(config: &dyn ConfigSource) -> Self {
        let mut settings = Self::default();
        match config.get_string(DB_KEY) {
            Some(db) => {
                info!(db = %db, "custom {DB_KEY}");
                settings.db = db;
            }
            None => info!("{DB_KEY} is not set in schema"),
        }
        if let Some(n) = read_count(config, MAX_CANDIDATES_KEY) {
            settings.max_candidates = n;
        }
        if let Some(n) = read_count(config, MAX_ITERATIONS_KEY) {
            settings.max_iterations = n;
        }
        settings
    }
}

fn read_count(config: &dyn ConfigSource, key: &str) -> Option<usize> {
    let Some(value) = config.get_int(key) else {
        info!("{key} is not set in schema");
        return None;
    };
    match usize::try_from(value) {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(value, "{key} must not be negative; using default");
            None
        }
    }
}

/// The embedded defaults, parsed once.
pub fn default_settings() -> &'static PredictorSettings {
    static INSTANCE: OnceLock<PredictorSettings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("default settings TOML must be valid")
    })
}

/// Parse a complete settings document (`[predictor]` table with every key).
pub fn parse_settings_toml(content: &str) -> Result<PredictorSettings, SettingsError> {
    let file: SettingsFile =
        toml::from_str(content).map_err(|e| SettingsError::Parse(e.to_string()))?;
    let settings = file.predictor;
    if settings.db.is_empty() {
        return Err(SettingsError::InvalidValue {
            field: "predictor.db".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(settings)
}
