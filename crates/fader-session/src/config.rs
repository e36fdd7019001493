//! Global configuration for fader sessions
//!
//! Configuration is stored as YAML alongside the keybindings file.
//! Default location: ~/Music/fader/config.yaml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use fader_core::grid::SnapDivision;
use fader_core::sidechain::SidechainConfig;

/// Supported range for the fallback BPM
const BPM_RANGE: (f64, f64) = (20.0, 300.0);

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deck defaults applied on track load
    pub deck: DeckConfig,
    /// Headphone cue bus defaults
    pub headphone: HeadphoneConfig,
    /// Microphone sidechain ducking
    pub sidechain: SidechainConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deck: DeckConfig::default(),
            headphone: HeadphoneConfig::default(),
            sidechain: SidechainConfig::default(),
        }
    }
}

/// Deck defaults section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// BPM assumed for tracks without analysis data
    pub default_bpm: f64,
    /// Beats per bar for loop length math
    pub beats_per_bar: u32,
    /// Snap division used when quantize is on
    pub snap: SnapDivision,
    /// Whether quantize starts enabled
    pub quantize: bool,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            default_bpm: 128.0,
            beats_per_bar: 4,
            snap: SnapDivision::Quarter,
            quantize: true,
        }
    }
}

impl DeckConfig {
    /// Validate and clamp values to supported ranges
    pub fn validate(&mut self) {
        self.default_bpm = self.default_bpm.clamp(BPM_RANGE.0, BPM_RANGE.1);
        if self.beats_per_bar == 0 {
            self.beats_per_bar = 4;
        }
    }
}

/// Headphone cue bus section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadphoneConfig {
    /// Headphone output level (0.0-1.0)
    pub volume: f32,
    /// Cue/master blend (0.0 = cue only, 1.0 = master only)
    pub mix: f32,
    /// Split cue: cue in the left ear, master in the right
    pub split: bool,
}

impl Default for HeadphoneConfig {
    fn default() -> Self {
        Self {
            volume: 0.8,
            mix: 0.0,
            split: false,
        }
    }
}

impl HeadphoneConfig {
    pub fn validate(&mut self) {
        self.volume = self.volume.clamp(0.0, 1.0);
        self.mix = self.mix.clamp(0.0, 1.0);
    }
}

/// Get the default config file path
///
/// Returns: ~/Music/fader/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Music")
        .join("fader")
        .join("config.yaml")
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config(path: &Path) -> Config {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
            Ok(mut config) => {
                config.deck.validate();
                config.headphone.validate();
                log::info!(
                    "load_config: Loaded config - default BPM {}, quantize {}",
                    config.deck.default_bpm,
                    config.deck.quantize
                );
                config
            }
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}, using defaults", e);
                Config::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: Failed to read config file: {}, using defaults", e);
            Config::default()
        }
    }
}

/// Save configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config)
        .context("Failed to serialize config to YAML")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: Config saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.deck.default_bpm, 128.0);
        assert_eq!(config.deck.beats_per_bar, 4);
        assert!(config.deck.quantize);
        assert!(!config.headphone.split);
    }

    #[test]
    fn test_deck_validation_clamps_bpm() {
        let mut deck = DeckConfig {
            default_bpm: 1000.0,
            beats_per_bar: 0,
            ..DeckConfig::default()
        };
        deck.validate();
        assert_eq!(deck.default_bpm, 300.0);
        assert_eq!(deck.beats_per_bar, 4);
    }

    #[test]
    fn test_headphone_validation() {
        let mut headphone = HeadphoneConfig {
            volume: 1.5,
            mix: -0.2,
            split: true,
        };
        headphone.validate();
        assert_eq!(headphone.volume, 1.0);
        assert_eq!(headphone.mix, 0.0);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config {
            deck: DeckConfig {
                default_bpm: 140.0,
                snap: SnapDivision::Eighth,
                ..DeckConfig::default()
            },
            ..Config::default()
        };

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed.deck.default_bpm, 140.0);
        assert_eq!(parsed.deck.snap, SnapDivision::Eighth);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let parsed: Config = serde_yaml::from_str("deck:\n  default_bpm: 174.0\n").unwrap();
        assert_eq!(parsed.deck.default_bpm, 174.0);
        assert_eq!(parsed.headphone.volume, 0.8);
    }
}
