use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use loopdeck::controller::{DEFAULT_AUTOPLAY_INTERVAL_MS, DEFAULT_WIDE_BREAKPOINT};
use loopdeck::gesture::{DEFAULT_CLICK_THRESHOLD, DEFAULT_SWITCH_THRESHOLD};
use loopdeck::{CarouselConfig, GestureConfig, LoadedPolicy};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "loopdeck";

pub const DEFAULT_TRANSITION_MS: u64 = 500;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay_interval_ms: Option<i64>,

    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_start: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_policy: Option<LoadedPolicyName>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch_threshold: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_threshold: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wide_breakpoint: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadedPolicyName {
    #[default]
    Decode,
    Intersection,
}

impl LoadedPolicyName {
    pub fn policy(self) -> LoadedPolicy {
        match self {
            Self::Decode => LoadedPolicy::MediaDecoded,
            Self::Intersection => LoadedPolicy::Intersection,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("Invalid {key}: {value}. Must be 'true' or 'false'."),
    }
}

fn parse_distance(key: &str, value: &str) -> Result<f32> {
    match value.parse::<f32>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => anyhow::bail!("Invalid {key}: {value}. Must be a non-negative number."),
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `loopdeck config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# loopdeck configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn defaults(&self) -> DefaultsConfig {
        self.defaults.clone().unwrap_or_default()
    }

    pub fn theme(&self) -> String {
        self.defaults().theme.unwrap_or_else(|| "light".to_string())
    }

    pub fn transition_ms(&self) -> u64 {
        self.defaults().transition_ms.unwrap_or(DEFAULT_TRANSITION_MS)
    }

    /// Engine settings with every unset value at its default.
    pub fn carousel(&self) -> CarouselConfig {
        let d = self.defaults();
        CarouselConfig {
            autoplay_interval_ms: d
                .autoplay_interval_ms
                .unwrap_or(DEFAULT_AUTOPLAY_INTERVAL_MS),
            loop_enabled: d.loop_enabled.unwrap_or(true),
            random_start: d.random_start.unwrap_or(false),
            loaded_policy: d.loaded_policy.unwrap_or_default().policy(),
            gesture: GestureConfig {
                switch_threshold: d.switch_threshold.unwrap_or(DEFAULT_SWITCH_THRESHOLD),
                click_threshold: d.click_threshold.unwrap_or(DEFAULT_CLICK_THRESHOLD),
            },
            wide_breakpoint: d.wide_breakpoint.unwrap_or(DEFAULT_WIDE_BREAKPOINT),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let defaults = self.defaults.get_or_insert_with(DefaultsConfig::default);
        match key {
            "defaults.theme" => {
                match value {
                    "light" | "dark" => {}
                    _ => anyhow::bail!("Invalid theme: {value}. Must be 'light' or 'dark'."),
                }
                defaults.theme = Some(value.to_string());
            }
            "defaults.autoplay_interval_ms" => {
                let ms = value.parse::<i64>().map_err(|_| {
                    anyhow::anyhow!(
                        "Invalid autoplay_interval_ms: {value}. Must be a whole number (0 disables autoplay)."
                    )
                })?;
                defaults.autoplay_interval_ms = Some(ms);
            }
            "defaults.loop" => defaults.loop_enabled = Some(parse_bool("loop", value)?),
            "defaults.random_start" => {
                defaults.random_start = Some(parse_bool("random_start", value)?)
            }
            "defaults.loaded_policy" => {
                defaults.loaded_policy = Some(match value {
                    "decode" => LoadedPolicyName::Decode,
                    "intersection" => LoadedPolicyName::Intersection,
                    _ => anyhow::bail!(
                        "Invalid loaded_policy: {value}. Must be 'decode' or 'intersection'."
                    ),
                });
            }
            "defaults.switch_threshold" => {
                defaults.switch_threshold = Some(parse_distance("switch_threshold", value)?)
            }
            "defaults.click_threshold" => {
                defaults.click_threshold = Some(parse_distance("click_threshold", value)?)
            }
            "defaults.wide_breakpoint" => {
                defaults.wide_breakpoint = Some(parse_distance("wide_breakpoint", value)?)
            }
            "defaults.transition_ms" => {
                let ms = value.parse::<u64>().map_err(|_| {
                    anyhow::anyhow!("Invalid transition_ms: {value}. Must be a whole number.")
                })?;
                defaults.transition_ms = Some(ms);
            }
            _ => anyhow::bail!(
                "Unknown config key: {key}. Valid keys: defaults.theme, defaults.autoplay_interval_ms, \
                 defaults.loop, defaults.random_start, defaults.loaded_policy, defaults.switch_threshold, \
                 defaults.click_threshold, defaults.wide_breakpoint, defaults.transition_ms"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::default();
        let carousel = config.carousel();
        assert_eq!(carousel, CarouselConfig::default());
        assert_eq!(config.theme(), "light");
        assert_eq!(config.transition_ms(), DEFAULT_TRANSITION_MS);
    }

    #[test]
    fn test_set_and_apply() {
        let mut config = Config::default();
        config.set("defaults.autoplay_interval_ms", "0").unwrap();
        config.set("defaults.loop", "false").unwrap();
        config.set("defaults.loaded_policy", "intersection").unwrap();
        config.set("defaults.switch_threshold", "80").unwrap();
        let carousel = config.carousel();
        assert_eq!(carousel.autoplay_interval_ms, 0);
        assert!(!carousel.loop_enabled);
        assert_eq!(carousel.loaded_policy, LoadedPolicy::Intersection);
        assert_eq!(carousel.gesture.switch_threshold, 80.0);
        assert_eq!(carousel.gesture.click_threshold, DEFAULT_CLICK_THRESHOLD);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("defaults.theme", "neon").is_err());
        assert!(config.set("defaults.loop", "maybe").is_err());
        assert!(config.set("defaults.click_threshold", "-3").is_err());
        assert!(config.set("defaults.autoplay_interval_ms", "soon").is_err());
        assert!(config.set("defaults.nope", "1").is_err());
    }

    #[test]
    fn test_yaml_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILENAME);
        let mut config = Config::default();
        config.set("defaults.theme", "dark").unwrap();
        config.set("defaults.random_start", "true").unwrap();
        config.save_to(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# loopdeck configuration"));
        assert!(text.contains("random_start: true"));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.theme(), "dark");
        assert!(loaded.carousel().random_start);
    }

    #[test]
    fn test_load_missing_file_mentions_show() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join(FILENAME)).unwrap_err();
        assert!(err.to_string().contains("loopdeck config show"));
    }
}
