//! Application configuration, read from `config.json`.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below.

use std::fs;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Max log level on startup when `RUST_LOG` is not set. The `debug on`
/// console command raises it later; with `RUST_LOG` set, the env filter is
/// the ceiling and neither applies.
pub fn startup_log_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        DEFAULT_LOG_FILTER.parse().unwrap_or(LevelFilter::Info)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub midi: MidiSettings,
    pub mapping: MappingSettings,
    pub osc: OscSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiSettings {
    /// Client name announced to the MIDI backend
    pub client_name: String,
    /// Substring of the input port name. Empty means ask.
    pub input_port: String,
    /// Substring of the output port name. Empty means ask.
    pub output_port: String,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            client_name: "chorda-bridge".to_string(),
            input_port: String::new(),
            output_port: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingSettings {
    /// Preset imported at startup
    pub preset: Option<PathBuf>,
    /// Starting transpose when no preset is given
    pub transpose: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscSettings {
    pub enabled: bool,
    pub listening_host: String,
    pub listening_port: u16,
    pub transpose_path: String,
    pub transpose_up_path: String,
    pub transpose_down_path: String,
    pub vel_min_path: String,
    pub vel_max_path: String,
    pub gamma_path: String,
    pub thru_path: String,
    pub panic_path: String,
}

impl Default for OscSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            listening_host: "127.0.0.1".to_string(),
            listening_port: 9069,
            transpose_path: "/transpose".to_string(),
            transpose_up_path: "/transposeUp".to_string(),
            transpose_down_path: "/transposeDown".to_string(),
            vel_min_path: "/velMin".to_string(),
            vel_max_path: "/velMax".to_string(),
            gamma_path: "/gamma".to_string(),
            thru_path: "/thru".to_string(),
            panic_path: "/panic".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Missing file means defaults. A file that exists but does not parse is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }
}
