use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::device::{
    PinConfig, CONFIG_NAME, DEFAULT_CLK_PIN, DEFAULT_DT_PIN, DEFAULT_SW_PIN, MAX_PRESET,
};
use crate::error::Result;
use crate::input::PresetBand;

const KEY_ENABLED: &str = "enabled";
const KEY_DT_PIN: &str = "DT-pin";
const KEY_CLK_PIN: &str = "CLK-pin";
const KEY_SW_PIN: &str = "SW-pin";
const KEY_PRESET_LOW: &str = "preset-low";
const KEY_PRESET_HIGH: &str = "preset-high";

/// Persistent controller settings, stored as the `Guitar-Led` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Master enable
    pub enabled: bool,
    /// Encoder DT line (phase A)
    #[serde(rename = "DT-pin")]
    pub dt_pin: i8,
    /// Encoder CLK line (phase B)
    #[serde(rename = "CLK-pin")]
    pub clk_pin: i8,
    /// Push switch; negative means no button
    #[serde(rename = "SW-pin")]
    pub sw_pin: i8,
    /// First preset of the band (inclusive)
    #[serde(rename = "preset-low")]
    pub preset_low: u8,
    /// Last preset of the band (inclusive)
    #[serde(rename = "preset-high")]
    pub preset_high: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dt_pin: DEFAULT_DT_PIN,
            clk_pin: DEFAULT_CLK_PIN,
            sw_pin: DEFAULT_SW_PIN,
            preset_low: 0,
            preset_high: 0,
        }
    }
}

impl ControllerConfig {
    pub fn pins(&self) -> PinConfig {
        PinConfig::new(self.dt_pin, self.clk_pin, self.sw_pin)
    }

    pub fn band(&self) -> PresetBand {
        PresetBand::new(self.preset_low, self.preset_high)
    }

    /// Serialized `Guitar-Led` object
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Overlay the keys present in `top` onto this config.
    ///
    /// Missing or mistyped keys keep their current value. Band bounds are
    /// clamped to `[0, MAX_PRESET]`; pins outside the `i8` range are ignored.
    pub fn apply_json(&mut self, top: &Value) {
        if let Some(enabled) = top.get(KEY_ENABLED).and_then(Value::as_bool) {
            self.enabled = enabled;
        }

        let pin = |key: &str, current: i8| {
            top.get(key)
                .and_then(Value::as_i64)
                .and_then(|v| i8::try_from(v).ok())
                .unwrap_or(current)
        };
        self.dt_pin = pin(KEY_DT_PIN, self.dt_pin);
        self.clk_pin = pin(KEY_CLK_PIN, self.clk_pin);
        self.sw_pin = pin(KEY_SW_PIN, self.sw_pin);

        let preset = |key: &str, current: u8| {
            top.get(key)
                .and_then(Value::as_i64)
                .map(|v| v.clamp(0, MAX_PRESET as i64) as u8)
                .unwrap_or(current)
        };
        self.preset_low = preset(KEY_PRESET_LOW, self.preset_low);
        self.preset_high = preset(KEY_PRESET_HIGH, self.preset_high);
    }

    /// The stored object knows about the preset band
    pub fn has_band_keys(top: &Value) -> bool {
        top.get(KEY_PRESET_HIGH).map_or(false, |v| !v.is_null())
    }

    /// Find our object inside a host config root
    pub fn section(root: &Value) -> Option<&Value> {
        root.get(CONFIG_NAME).filter(|v| v.is_object())
    }

    /// Load a host config root (e.g. `cfg.json`); a missing file is an empty root
    pub fn load_root(path: &Path) -> Result<Value> {
        if !path.exists() {
            return Ok(Value::Object(Map::new()));
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write a host config root back to disk
    pub fn save_root(path: &Path, root: &Value) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(root)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Settings-page script: a header for our section plus the build-time
/// default next to each pin field.
pub fn append_config_data() -> String {
    let mut script = format!("addHB('{}');", CONFIG_NAME);
    for (key, default) in [
        (KEY_DT_PIN, DEFAULT_DT_PIN),
        (KEY_CLK_PIN, DEFAULT_CLK_PIN),
        (KEY_SW_PIN, DEFAULT_SW_PIN),
    ] {
        script.push_str(&format!(
            "xOpt('{}:{}',1,' ⎌',{});",
            CONFIG_NAME, key, default
        ));
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_keys() {
        let config = ControllerConfig {
            preset_low: 2,
            preset_high: 5,
            ..Default::default()
        };
        assert_eq!(
            config.to_json(),
            json!({
                "enabled": true,
                "DT-pin": 18,
                "CLK-pin": 19,
                "SW-pin": 5,
                "preset-low": 2,
                "preset-high": 5
            })
        );
    }

    #[test]
    fn test_partial_object_keeps_current_values() {
        let mut config = ControllerConfig {
            preset_low: 3,
            ..Default::default()
        };
        config.apply_json(&json!({ "SW-pin": -1, "preset-high": 9 }));

        assert_eq!(config.sw_pin, -1);
        assert_eq!(config.dt_pin, 18);
        assert_eq!(config.preset_low, 3);
        assert_eq!(config.preset_high, 9);
        assert!(config.enabled);
    }

    #[test]
    fn test_band_values_are_clamped() {
        let mut config = ControllerConfig::default();
        config.apply_json(&json!({ "preset-low": -4, "preset-high": 900 }));
        assert_eq!(config.preset_low, 0);
        assert_eq!(config.preset_high, 250);
    }

    #[test]
    fn test_mistyped_values_are_ignored() {
        let mut config = ControllerConfig::default();
        config.apply_json(&json!({ "enabled": "yes", "DT-pin": 300, "CLK-pin": "19" }));
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn test_band_key_detection() {
        assert!(ControllerConfig::has_band_keys(&json!({ "preset-high": 0 })));
        assert!(!ControllerConfig::has_band_keys(&json!({ "preset-low": 1 })));
        assert!(!ControllerConfig::has_band_keys(&json!({ "preset-high": null })));
    }

    #[test]
    fn test_section_lookup() {
        assert!(ControllerConfig::section(&json!({})).is_none());
        assert!(ControllerConfig::section(&json!({ "Guitar-Led": 3 })).is_none());
        assert!(ControllerConfig::section(&json!({ "Guitar-Led": {} })).is_some());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ControllerConfig = serde_json::from_value(json!({ "enabled": false })).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.pins(), PinConfig::new(18, 19, 5));
        assert!(!config.band().is_active());
    }

    #[test]
    fn test_append_config_data() {
        let script = append_config_data();
        assert!(script.starts_with("addHB('Guitar-Led');"));
        assert!(script.contains("xOpt('Guitar-Led:DT-pin',1,' ⎌',18);"));
        assert!(script.contains("xOpt('Guitar-Led:SW-pin',1,' ⎌',5);"));
    }

    #[test]
    fn test_root_file_round_trip() {
        let path = std::env::temp_dir().join(format!("guitar-led-cfg-{}.json", std::process::id()));
        let root = json!({ "Guitar-Led": ControllerConfig::default().to_json() });

        ControllerConfig::save_root(&path, &root).unwrap();
        let loaded = ControllerConfig::load_root(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, root);
        assert!(ControllerConfig::section(&loaded).is_some());
    }
}
