use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fmt, fs};

use crate::domain::Vector;
use crate::use_cases::EngineSettings;

// Runtime configuration for the headless engine.
// Sources, later ones winning: built-in defaults, TOML file named by SLASH_CONFIG, SLASH_* env vars.

pub const CONFIG_PATH_VAR: &str = "SLASH_CONFIG";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    InvalidValue { key: &'static str, value: String },
    InvalidTickInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            Self::Parse(e) => write!(f, "invalid config file: {e}"),
            Self::InvalidValue { key, value } => write!(f, "invalid value for {key}: {value:?}"),
            Self::InvalidTickInterval => write!(f, "tick interval must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub gravity: f64,
    pub boundary_x: f64,
    pub boundary_y: f64,
    pub tick_ms: u64,
    /// Round-trip time applied when restoring a snapshot.
    pub rtt_ms: u64,
    pub rtt_scale: f64,
    /// Start the scheduler as soon as a world exists.
    pub autostart: bool,
    pub snapshot_path: Option<PathBuf>,
    /// Period of the status log line; 0 disables it.
    pub report_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            boundary_x: 6000.0,
            boundary_y: 480.0,
            tick_ms: 16,
            rtt_ms: 0,
            rtt_scale: 0.5,
            autostart: true,
            snapshot_path: None,
            report_interval_ms: 5000,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::Parse)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Overrides fields from `SLASH_*` variables resolved through `lookup`.
    pub fn apply_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        override_with(&lookup, "SLASH_GRAVITY", &mut self.gravity)?;
        override_with(&lookup, "SLASH_BOUNDARY_X", &mut self.boundary_x)?;
        override_with(&lookup, "SLASH_BOUNDARY_Y", &mut self.boundary_y)?;
        override_with(&lookup, "SLASH_TICK_MS", &mut self.tick_ms)?;
        override_with(&lookup, "SLASH_RTT", &mut self.rtt_ms)?;
        override_with(&lookup, "SLASH_RTT_SCALE", &mut self.rtt_scale)?;
        override_with(&lookup, "SLASH_AUTOSTART", &mut self.autostart)?;
        override_with(&lookup, "SLASH_REPORT_INTERVAL_MS", &mut self.report_interval_ms)?;
        if let Some(path) = lookup("SLASH_SNAPSHOT_PATH").filter(|p| !p.is_empty()) {
            self.snapshot_path = Some(PathBuf::from(path));
        }
        Ok(self)
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidTickInterval);
        }
        let finite = [
            ("gravity", self.gravity),
            ("boundary_x", self.boundary_x),
            ("boundary_y", self.boundary_y),
            ("rtt_scale", self.rtt_scale),
        ];
        for (key, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: value.to_string(),
                });
            }
        }
        Ok(self)
    }

    pub fn boundary(&self) -> Vector {
        Vector::new(self.boundary_x, self.boundary_y)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn rtt(&self) -> Duration {
        Duration::from_millis(self.rtt_ms)
    }

    pub fn report_interval(&self) -> Option<Duration> {
        (self.report_interval_ms > 0).then(|| Duration::from_millis(self.report_interval_ms))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            rtt_scale: self.rtt_scale,
        }
    }
}

/// Loads the optional config file and env overrides, then validates.
///
/// Expects `.env` to have been loaded already.
pub fn load() -> Result<EngineConfig, ConfigError> {
    let config = match env::var_os(CONFIG_PATH_VAR) {
        Some(path) => EngineConfig::from_file(Path::new(&path))?,
        None => EngineConfig::default(),
    };
    config
        .apply_env_overrides(|key| env::var(key).ok())?
        .validate()
}

fn override_with<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    target: &mut T,
) -> Result<(), ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(());
    };
    *target = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value: raw })?;
    Ok(())
}
