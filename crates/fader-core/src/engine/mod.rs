//! Performance engine
//!
//! Per-deck performance features: loops and loop roll, hot cues, and slip
//! mode. Everything here works in track-time seconds against a [`crate::grid::BeatGrid`];
//! the session layer owns the playheads and clocks that drive it.

mod hot_cue;
mod loops;
mod slip;

pub use hot_cue::{CueBank, HotCue, CUE_COLORS, NUM_CUE_SLOTS};
pub use loops::{Loop, LoopRoll, MAX_LOOP_BARS, MIN_LOOP_BARS};
pub use slip::SlipMode;
