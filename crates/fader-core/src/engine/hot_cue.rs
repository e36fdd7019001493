//! Hot cues
//!
//! Eight numbered cue slots per deck. Setting a slot stores the current
//! position; triggering a set slot jumps there; triggering an empty slot
//! does nothing. Slot colors follow the usual controller palette.

use serde::{Deserialize, Serialize};

/// Number of cue slots per deck
pub const NUM_CUE_SLOTS: usize = 8;

/// Pad colors by slot, 1-based order
pub const CUE_COLORS: [&str; NUM_CUE_SLOTS] = [
    "#ff3b30", // red
    "#ff9500", // orange
    "#ffcc00", // yellow
    "#34c759", // green
    "#00c7be", // teal
    "#007aff", // blue
    "#af52de", // purple
    "#ff2d55", // pink
];

/// A stored cue point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotCue {
    /// Slot number, 1 through 8
    pub slot: u8,
    /// Position in seconds
    pub time: f64,
    pub label: Option<String>,
}

impl HotCue {
    /// Pad color for this cue's slot
    pub fn color(&self) -> &'static str {
        CUE_COLORS[(self.slot as usize - 1) % NUM_CUE_SLOTS]
    }
}

/// The eight cue slots of one deck
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CueBank {
    slots: [Option<HotCue>; NUM_CUE_SLOTS],
}

impl CueBank {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_index(slot: u8) -> Option<usize> {
        if (1..=NUM_CUE_SLOTS as u8).contains(&slot) {
            Some(slot as usize - 1)
        } else {
            log::warn!("cue slot {slot} out of range 1..=8");
            None
        }
    }

    /// Store a cue at `time` in `slot`, replacing any existing cue there
    pub fn set(&mut self, slot: u8, time: f64, label: Option<String>) {
        let Some(index) = Self::slot_index(slot) else {
            return;
        };
        self.slots[index] = Some(HotCue { slot, time, label });
        log::debug!("hot cue {slot} set at {time:.3}s");
    }

    /// Clear one slot (no-op when already empty)
    pub fn delete(&mut self, slot: u8) {
        if let Some(index) = Self::slot_index(slot) {
            self.slots[index] = None;
        }
    }

    /// Clear every slot
    pub fn clear_all(&mut self) {
        self.slots = Default::default();
    }

    /// The cue stored in `slot`, if any
    pub fn get(&self, slot: u8) -> Option<&HotCue> {
        Self::slot_index(slot).and_then(|i| self.slots[i].as_ref())
    }

    /// Position to jump to when `slot` is triggered
    ///
    /// None when the slot is empty or out of range, in which case the
    /// trigger is a no-op for the caller too.
    pub fn jump(&self, slot: u8) -> Option<f64> {
        self.get(slot).map(|cue| cue.time)
    }

    /// All stored cues in slot order
    pub fn iter(&self) -> impl Iterator<Item = &HotCue> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }
}
