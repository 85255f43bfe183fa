//! Preset import/export as JSON.
//!
//! ```json
//! {
//!   "name": "Default",
//!   "version": 1,
//!   "mapping": { "transpose": 0, "velMin": 1, "velMax": 127, "gamma": 1.0 },
//!   "thru": true,
//!   "device": { "inId": "...", "outId": "..." }
//! }
//! ```
//!
//! Unknown fields are ignored on read; every known field is written, with
//! unset device identifiers as `""`. Reading is lenient: numbers may arrive as
//! strings, `thru` as 0/1, and a value that cannot be coerced falls back to its
//! default instead of rejecting the file.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::mapping::{MappingConfig, GAMMA_DEFAULT, VELOCITY_MAX, VELOCITY_MIN};
use crate::error::{Error, Result};

pub const PRESET_VERSION: u32 = 1;
pub const DEFAULT_NAME: &str = "Default";
pub const IMPORTED_NAME: &str = "Imported";

/// Device selection hints. Opaque to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceIds {
    #[serde(rename = "inId", serialize_with = "empty_if_none")]
    pub input: Option<String>,
    #[serde(rename = "outId", serialize_with = "empty_if_none")]
    pub output: Option<String>,
}

fn empty_if_none<S: Serializer>(value: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetMeta {
    pub name: String,
    pub version: u32,
    pub device: DeviceIds,
}

impl Default for PresetMeta {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            version: PRESET_VERSION,
            device: DeviceIds::default(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MappingOut {
    transpose: i32,
    vel_min: u8,
    vel_max: u8,
    gamma: f64,
}

#[derive(Serialize)]
struct PresetOut<'a> {
    name: &'a str,
    version: u32,
    mapping: MappingOut,
    thru: bool,
    device: &'a DeviceIds,
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

/// Integer field, rounded. Saturates on the `as` cast.
fn integer(value: &Value) -> Option<i32> {
    number(value).map(|v| v.round() as i32)
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Some(true),
            "false" | "off" | "no" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Look up `key` and coerce it. `null` counts as missing; anything else that
/// does not coerce is logged and treated as missing.
fn field<T>(parent: Option<&Value>, key: &str, coerce: fn(&Value) -> Option<T>) -> Option<T> {
    let value = parent?.get(key)?;
    if value.is_null() {
        return None;
    }
    let coerced = coerce(value);
    if coerced.is_none() {
        log::warn!("Preset field '{}' has unusable value {}; using default", key, value);
    }
    coerced
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

pub fn encode(config: &MappingConfig, meta: &PresetMeta) -> Result<String> {
    let preset = PresetOut {
        name: &meta.name,
        version: PRESET_VERSION,
        mapping: MappingOut {
            transpose: config.transpose(),
            vel_min: config.vel_min(),
            vel_max: config.vel_max(),
            gamma: config.gamma(),
        },
        thru: config.thru(),
        device: &meta.device,
    };
    serde_json::to_string_pretty(&preset).map_err(|e| Error::Format(e.to_string()))
}

/// Parse a preset. `current` supplies `thru` when the preset omits it.
///
/// Nothing is applied on failure; callers swap in the returned config only on
/// `Ok`.
pub fn decode(text: &str, current: &MappingConfig) -> Result<(MappingConfig, PresetMeta)> {
    let root: Value = serde_json::from_str(text).map_err(|e| Error::Format(e.to_string()))?;
    if !root.is_object() {
        return Err(Error::Format("preset must be a JSON object".into()));
    }
    let root = Some(&root);

    let version = field(root, "version", number)
        .map(|v| v.round().max(0.0) as u32)
        .unwrap_or(PRESET_VERSION);
    if version > PRESET_VERSION {
        log::warn!("Preset version {} is newer than {}; reading known fields only", version, PRESET_VERSION);
    }

    let mapping = root.and_then(|r| r.get("mapping"));
    let config = MappingConfig::new(
        field(mapping, "transpose", integer).unwrap_or(0),
        field(mapping, "velMin", integer).unwrap_or(VELOCITY_MIN as i32),
        field(mapping, "velMax", integer).unwrap_or(VELOCITY_MAX as i32),
        field(mapping, "gamma", number).unwrap_or(GAMMA_DEFAULT),
        field(root, "thru", flag).unwrap_or(current.thru()),
    );

    let device = root.and_then(|r| r.get("device"));
    let meta = PresetMeta {
        name: non_empty(field(root, "name", string)).unwrap_or_else(|| IMPORTED_NAME.to_string()),
        version,
        device: DeviceIds {
            input: non_empty(field(device, "inId", string)),
            output: non_empty(field(device, "outId", string)),
        },
    };
    Ok((config, meta))
}

pub fn save_preset(path: &Path, config: &MappingConfig, meta: &PresetMeta) -> Result<()> {
    let text = encode(config, meta)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    log::info!("Exported preset '{}' to {}", meta.name, path.display());
    Ok(())
}

pub fn load_preset(path: &Path, current: &MappingConfig) -> Result<(MappingConfig, PresetMeta)> {
    let text = fs::read_to_string(path)?;
    let loaded = decode(&text, current)?;
    log::info!("Imported preset '{}' from {}", loaded.1.name, path.display());
    Ok(loaded)
}

pub fn default_preset_file_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("chorda-preset-{}.json", secs)
}
