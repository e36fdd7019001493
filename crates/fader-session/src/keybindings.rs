//! Keybindings configuration
//!
//! Configurable keyboard shortcuts stored in YAML format.
//! Default location: ~/Music/fader/keybindings.yaml
//!
//! Keys are matched as strings of the form "Shift+Ctrl+Alt+KeyName" so
//! any windowing toolkit can feed events in. Shortcuts never fire while
//! a text input has focus.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root keybindings configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    /// Keybindings for live performance
    pub performance: PerformanceKeybindings,
}

/// Keybindings for live performance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceKeybindings {
    /// Play/pause toggle
    pub play_pause: Vec<String>,
    /// Hot cue jump buttons (1-8)
    pub hot_cue_1: Vec<String>,
    pub hot_cue_2: Vec<String>,
    pub hot_cue_3: Vec<String>,
    pub hot_cue_4: Vec<String>,
    pub hot_cue_5: Vec<String>,
    pub hot_cue_6: Vec<String>,
    pub hot_cue_7: Vec<String>,
    pub hot_cue_8: Vec<String>,
    /// Set hot cue buttons (shift+1-8)
    pub set_hot_cue_1: Vec<String>,
    pub set_hot_cue_2: Vec<String>,
    pub set_hot_cue_3: Vec<String>,
    pub set_hot_cue_4: Vec<String>,
    pub set_hot_cue_5: Vec<String>,
    pub set_hot_cue_6: Vec<String>,
    pub set_hot_cue_7: Vec<String>,
    pub set_hot_cue_8: Vec<String>,
    /// Start loops of 1/2/4/8 bars
    pub loop_1_bar: Vec<String>,
    pub loop_2_bars: Vec<String>,
    pub loop_4_bars: Vec<String>,
    pub loop_8_bars: Vec<String>,
    /// Toggle the current loop
    pub loop_toggle: Vec<String>,
    /// Halve / double the loop length
    pub loop_halve: Vec<String>,
    pub loop_double: Vec<String>,
    /// Move the loop a loop-length backward / forward
    pub loop_move_back: Vec<String>,
    pub loop_move_forward: Vec<String>,
    /// Toggle slip mode
    pub slip_toggle: Vec<String>,
    /// Toggle quantize
    pub quantize_toggle: Vec<String>,
    /// Tap tempo
    pub tap_tempo: Vec<String>,
}

impl Default for PerformanceKeybindings {
    fn default() -> Self {
        Self {
            play_pause: vec!["Space".into()],
            hot_cue_1: vec!["1".into()],
            hot_cue_2: vec!["2".into()],
            hot_cue_3: vec!["3".into()],
            hot_cue_4: vec!["4".into()],
            hot_cue_5: vec!["5".into()],
            hot_cue_6: vec!["6".into()],
            hot_cue_7: vec!["7".into()],
            hot_cue_8: vec!["8".into()],
            set_hot_cue_1: vec!["Shift+1".into()],
            set_hot_cue_2: vec!["Shift+2".into()],
            set_hot_cue_3: vec!["Shift+3".into()],
            set_hot_cue_4: vec!["Shift+4".into()],
            set_hot_cue_5: vec!["Shift+5".into()],
            set_hot_cue_6: vec!["Shift+6".into()],
            set_hot_cue_7: vec!["Shift+7".into()],
            set_hot_cue_8: vec!["Shift+8".into()],
            loop_1_bar: vec!["q".into()],
            loop_2_bars: vec!["w".into()],
            loop_4_bars: vec!["e".into()],
            loop_8_bars: vec!["r".into()],
            loop_toggle: vec!["l".into()],
            loop_halve: vec!["[".into()],
            loop_double: vec!["]".into()],
            loop_move_back: vec!["Shift+[".into()],
            loop_move_forward: vec!["Shift+]".into()],
            slip_toggle: vec!["s".into()],
            quantize_toggle: vec!["k".into()],
            tap_tempo: vec!["t".into()],
        }
    }
}

/// Action resolved from a key press
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    PlayPause,
    /// Jump to hot cue slot (1-8)
    HotCueJump(u8),
    /// Store the current position in a cue slot (1-8)
    HotCueSet(u8),
    /// Start a loop of this many bars
    LoopBars(f64),
    LoopToggle,
    LoopHalve,
    LoopDouble,
    LoopMoveBack,
    LoopMoveForward,
    SlipToggle,
    QuantizeToggle,
    TapTempo,
}

impl PerformanceKeybindings {
    fn hot_cue_bindings(&self) -> [&Vec<String>; 8] {
        [
            &self.hot_cue_1, &self.hot_cue_2, &self.hot_cue_3, &self.hot_cue_4,
            &self.hot_cue_5, &self.hot_cue_6, &self.hot_cue_7, &self.hot_cue_8,
        ]
    }

    fn set_hot_cue_bindings(&self) -> [&Vec<String>; 8] {
        [
            &self.set_hot_cue_1, &self.set_hot_cue_2, &self.set_hot_cue_3, &self.set_hot_cue_4,
            &self.set_hot_cue_5, &self.set_hot_cue_6, &self.set_hot_cue_7, &self.set_hot_cue_8,
        ]
    }

    /// Resolve a key string to an action
    ///
    /// Returns None while `text_input_focused` so typing a track title
    /// never triggers a cue jump.
    pub fn resolve(&self, key_str: &str, text_input_focused: bool) -> Option<Action> {
        if text_input_focused {
            return None;
        }

        let matches = |bindings: &[String]| bindings.iter().any(|b| b == key_str);

        if matches(&self.play_pause) {
            return Some(Action::PlayPause);
        }
        for (i, binding) in self.set_hot_cue_bindings().iter().enumerate() {
            if matches(binding) {
                return Some(Action::HotCueSet(i as u8 + 1));
            }
        }
        for (i, binding) in self.hot_cue_bindings().iter().enumerate() {
            if matches(binding) {
                return Some(Action::HotCueJump(i as u8 + 1));
            }
        }
        for (bars, binding) in [
            (1.0, &self.loop_1_bar),
            (2.0, &self.loop_2_bars),
            (4.0, &self.loop_4_bars),
            (8.0, &self.loop_8_bars),
        ] {
            if matches(binding) {
                return Some(Action::LoopBars(bars));
            }
        }
        if matches(&self.loop_toggle) {
            return Some(Action::LoopToggle);
        }
        if matches(&self.loop_halve) {
            return Some(Action::LoopHalve);
        }
        if matches(&self.loop_double) {
            return Some(Action::LoopDouble);
        }
        if matches(&self.loop_move_back) {
            return Some(Action::LoopMoveBack);
        }
        if matches(&self.loop_move_forward) {
            return Some(Action::LoopMoveForward);
        }
        if matches(&self.slip_toggle) {
            return Some(Action::SlipToggle);
        }
        if matches(&self.quantize_toggle) {
            return Some(Action::QuantizeToggle);
        }
        if matches(&self.tap_tempo) {
            return Some(Action::TapTempo);
        }
        None
    }
}

/// Get the default keybindings file path
///
/// Returns: ~/Music/fader/keybindings.yaml
pub fn default_keybindings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Music")
        .join("fader")
        .join("keybindings.yaml")
}

/// Load keybindings from a YAML file
///
/// If the file doesn't exist, returns default keybindings.
/// If the file exists but is invalid, logs a warning and returns defaults.
pub fn load_keybindings(path: &Path) -> KeybindingsConfig {
    log::info!("load_keybindings: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_keybindings: File doesn't exist, using defaults");
        return KeybindingsConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<KeybindingsConfig>(&contents) {
            Ok(config) => {
                log::info!("load_keybindings: Loaded custom keybindings");
                config
            }
            Err(e) => {
                log::warn!("load_keybindings: Failed to parse: {}, using defaults", e);
                KeybindingsConfig::default()
            }
        },
        Err(e) => {
            log::warn!("load_keybindings: Failed to read file: {}, using defaults", e);
            KeybindingsConfig::default()
        }
    }
}

/// Save keybindings to a YAML file
pub fn save_keybindings(config: &KeybindingsConfig, path: &Path) -> anyhow::Result<()> {
    log::info!("save_keybindings: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)?;

    log::info!("save_keybindings: Saved successfully");
    Ok(())
}
