//! Persistence boundary
//!
//! The session never talks to disk or network directly; hosts hand it a
//! [`StateStore`] implementation. Cue banks and beat grids are keyed by
//! track id, mix settings by profile name. Records are serialized to
//! JSON so any backend (memory, file, remote) stores the same bytes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use fader_core::effect::native::FilterSettings;
use fader_core::effect::FxPreset;
use fader_core::engine::CueBank;
use fader_core::grid::BeatGrid;
use fader_core::mixer::CrossfaderCurve;
use fader_core::sidechain::SidechainConfig;

/// Errors from settings persistence
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no saved record under key \"{0}\"")]
    NotFound(String),

    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Everything worth restoring between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixSettings {
    pub crossfader_position: f64,
    pub crossfader_curve: CrossfaderCurve,
    pub master_volume: f32,
    /// Per-deck filter settings, index 0 = deck A
    pub filters: Vec<FilterSettings>,
    /// Per-deck FX presets, index 0 = deck A
    pub fx_presets: Vec<FxPreset>,
    pub sidechain: SidechainConfig,
    pub headphone_volume: f32,
    pub headphone_mix: f32,
    pub split_cue: bool,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            crossfader_position: 0.5,
            crossfader_curve: CrossfaderCurve::default(),
            master_volume: 1.0,
            filters: vec![FilterSettings::default(); 2],
            fx_presets: vec![FxPreset::Clean; 2],
            sidechain: SidechainConfig::default(),
            headphone_volume: 0.8,
            headphone_mix: 0.0,
            split_cue: false,
        }
    }
}

/// Backend-agnostic record storage
pub trait StateStore {
    /// Persist a deck's cue bank for `track_id`
    fn save_cues(&mut self, track_id: &str, cues: &CueBank) -> Result<(), StoreError>;

    /// Load the cue bank stored for `track_id`
    fn load_cues(&self, track_id: &str) -> Result<CueBank, StoreError>;

    /// Persist an edited beat grid for `track_id`
    fn save_grid(&mut self, track_id: &str, grid: &BeatGrid) -> Result<(), StoreError>;

    /// Load the beat grid stored for `track_id`
    fn load_grid(&self, track_id: &str) -> Result<BeatGrid, StoreError>;

    /// Persist a mix settings snapshot under `profile`
    fn save_mix_settings(&mut self, profile: &str, settings: &MixSettings)
        -> Result<(), StoreError>;

    /// Load the mix settings stored under `profile`
    fn load_mix_settings(&self, profile: &str) -> Result<MixSettings, StoreError>;

    /// Remove every record for `track_id`; missing records are not an error
    fn delete_track(&mut self, track_id: &str) -> Result<(), StoreError>;

    /// All stored keys, namespaced (`cues/...`, `grid/...`, `mix/...`)
    fn keys(&self) -> Vec<String>;
}

/// In-memory store, the default for tests and embedded hosts
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn put<T: Serialize>(&mut self, key: String, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.entries.insert(key, json);
        Ok(())
    }

    fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<T, StoreError> {
        let json = self
            .entries
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        Ok(serde_json::from_str(json)?)
    }
}

impl StateStore for MemoryStore {
    fn save_cues(&mut self, track_id: &str, cues: &CueBank) -> Result<(), StoreError> {
        self.put(format!("cues/{track_id}"), cues)
    }

    fn load_cues(&self, track_id: &str) -> Result<CueBank, StoreError> {
        self.get(&format!("cues/{track_id}"))
    }

    fn save_grid(&mut self, track_id: &str, grid: &BeatGrid) -> Result<(), StoreError> {
        self.put(format!("grid/{track_id}"), grid)
    }

    fn load_grid(&self, track_id: &str) -> Result<BeatGrid, StoreError> {
        self.get(&format!("grid/{track_id}"))
    }

    fn save_mix_settings(
        &mut self,
        profile: &str,
        settings: &MixSettings,
    ) -> Result<(), StoreError> {
        self.put(format!("mix/{profile}"), settings)
    }

    fn load_mix_settings(&self, profile: &str) -> Result<MixSettings, StoreError> {
        self.get(&format!("mix/{profile}"))
    }

    fn delete_track(&mut self, track_id: &str) -> Result<(), StoreError> {
        self.entries.remove(&format!("cues/{track_id}"));
        self.entries.remove(&format!("grid/{track_id}"));
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_settings_roundtrip() {
        let mut store = MemoryStore::new();
        let mut settings = MixSettings::default();
        settings.crossfader_position = 0.8;
        settings.fx_presets[1] = FxPreset::SpaceEcho;

        store.save_mix_settings("set-a", &settings).unwrap();
        let loaded = store.load_mix_settings("set-a").unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_cue_bank_roundtrip_by_track() {
        let mut store = MemoryStore::new();
        let mut cues = CueBank::new();
        cues.set(3, 42.7, Some("drop".into()));

        store.save_cues("track-1", &cues).unwrap();
        let loaded = store.load_cues("track-1").unwrap();
        assert_eq!(loaded.jump(3), Some(42.7));
        assert!(store.load_cues("track-2").is_err());
    }

    #[test]
    fn test_grid_roundtrip() {
        let mut store = MemoryStore::new();
        let grid = BeatGrid::generate(128.0, 0.25, 300.0, 4).unwrap();
        store.save_grid("track-1", &grid).unwrap();
        assert_eq!(store.load_grid("track-1").unwrap(), grid);
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let store = MemoryStore::new();
        match store.load_mix_settings("nope") {
            Err(StoreError::NotFound(key)) => assert_eq!(key, "mix/nope"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_track_is_idempotent() {
        let mut store = MemoryStore::new();
        store.save_cues("a", &CueBank::new()).unwrap();
        store
            .save_grid("a", &BeatGrid::generate(120.0, 0.0, 10.0, 4).unwrap())
            .unwrap();
        store.delete_track("a").unwrap();
        store.delete_track("a").unwrap();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        // Older snapshots missing new fields still load
        let mut store = MemoryStore::new();
        store
            .entries
            .insert("mix/old".into(), r#"{"crossfader_position": 0.25}"#.into());
        let loaded = store.load_mix_settings("old").unwrap();
        assert_eq!(loaded.crossfader_position, 0.25);
        assert_eq!(loaded.master_volume, 1.0);
    }

    #[test]
    fn test_keys_namespaced_and_sorted() {
        let mut store = MemoryStore::new();
        store
            .save_mix_settings("b", &MixSettings::default())
            .unwrap();
        store.save_cues("a", &CueBank::new()).unwrap();
        assert_eq!(store.keys(), vec!["cues/a", "mix/b"]);
    }
}
