//! Beat grid model
//!
//! A beat grid is the quantization reference for one loaded track: a BPM,
//! a phase offset for the first beat, and a bar structure. The derived
//! marker list is regenerated wholesale whenever BPM or offset changes and
//! can additionally be hand-edited for tracks where auto-detection got it
//! wrong. Locked grids silently reject all edits so a stray keypress can't
//! wreck timing mid-performance.

use serde::{Deserialize, Serialize};

use super::GridError;

/// Default BPM assumed when a track carries no tempo metadata
pub const DEFAULT_BPM: f64 = 120.0;

/// Tolerance used when matching a marker to a click/removal position
pub const MARKER_MATCH_TOLERANCE: f64 = 0.1;

/// A single detected or inserted beat instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatMarker {
    /// Position in seconds from track start
    pub time: f64,
    /// Detection confidence (None for hand-inserted markers)
    pub confidence: Option<f64>,
}

impl BeatMarker {
    pub fn new(time: f64) -> Self {
        Self { time, confidence: None }
    }
}

/// Quantization reference for a track: BPM + phase offset + bar structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatGrid {
    /// Beats per minute (always positive and finite)
    pub bpm: f64,
    /// First-beat offset in seconds, normalized into `[0, beat_duration)`
    pub offset: f64,
    /// Beats per bar (4 for common time)
    pub beats_per_bar: u32,
    /// Locked grids reject marker and BPM edits
    pub is_locked: bool,
    /// Track duration the marker list was generated for
    pub duration: f64,
    /// Derived beat marker list
    pub markers: Vec<BeatMarker>,
}

impl BeatGrid {
    /// Generate a beat grid from BPM, offset and track duration
    ///
    /// The offset is normalized into `[0, beat_duration)` so downstream
    /// quantization can assume a canonical phase.
    pub fn generate(
        bpm: f64,
        offset: f64,
        duration: f64,
        beats_per_bar: u32,
    ) -> Result<Self, GridError> {
        validate_bpm(bpm)?;
        if beats_per_bar < 2 {
            return Err(GridError::InvalidBeatsPerBar(beats_per_bar));
        }

        let beat = 60.0 / bpm;
        let offset = offset.rem_euclid(beat);

        let mut grid = Self {
            bpm,
            offset,
            beats_per_bar,
            is_locked: false,
            duration: duration.max(0.0),
            markers: Vec::new(),
        };
        grid.regenerate_markers();
        Ok(grid)
    }

    /// Seconds per beat
    #[inline]
    pub fn beat_duration(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Seconds per bar
    #[inline]
    pub fn bar_duration(&self) -> f64 {
        self.beats_per_bar as f64 * self.beat_duration()
    }

    /// Rebuild the marker list from bpm/offset over the stored duration
    fn regenerate_markers(&mut self) {
        let beat = self.beat_duration();
        self.markers.clear();
        let mut t = self.offset;
        while t < self.duration {
            self.markers.push(BeatMarker {
                time: t,
                confidence: Some(1.0),
            });
            t += beat;
        }
    }

    /// Set a new BPM and regenerate the marker list
    ///
    /// No-op when the grid is locked. Invalid BPM values are rejected.
    pub fn set_bpm(&mut self, new_bpm: f64) -> Result<(), GridError> {
        validate_bpm(new_bpm)?;
        if self.is_locked {
            log::debug!("set_bpm ignored: grid is locked");
            return Ok(());
        }
        self.bpm = new_bpm;
        self.offset = self.offset.rem_euclid(self.beat_duration());
        self.regenerate_markers();
        Ok(())
    }

    /// Shift the grid phase by `delta` seconds without changing BPM
    ///
    /// The offset wraps back into `[0, beat_duration)`. No-op when locked.
    pub fn nudge(&mut self, delta: f64) {
        if self.is_locked {
            log::debug!("nudge ignored: grid is locked");
            return;
        }
        self.offset = (self.offset + delta).rem_euclid(self.beat_duration());
        self.regenerate_markers();
    }

    /// Insert a beat marker at `time`, re-deriving BPM from the edited list
    ///
    /// No-op when locked or for negative times.
    pub fn add_marker(&mut self, time: f64) {
        if self.is_locked || time < 0.0 {
            return;
        }
        let index = self
            .markers
            .iter()
            .position(|m| m.time > time)
            .unwrap_or(self.markers.len());
        self.markers.insert(index, BeatMarker::new(time));
        if let Some(bpm) = average_bpm(&self.markers) {
            self.bpm = bpm;
            self.offset = self.offset.rem_euclid(self.beat_duration());
        }
    }

    /// Remove the marker closest to `time` if within tolerance
    ///
    /// No-op when locked or when no marker is near enough.
    pub fn remove_marker(&mut self, time: f64) {
        if self.is_locked {
            return;
        }
        let Some(index) = nearest_marker_index(&self.markers, time) else {
            return;
        };
        if (self.markers[index].time - time).abs() > MARKER_MATCH_TOLERANCE {
            return;
        }
        self.markers.remove(index);
        if let Some(bpm) = average_bpm(&self.markers) {
            self.bpm = bpm;
            self.offset = self.offset.rem_euclid(self.beat_duration());
        }
    }

    /// Toggle the edit lock
    pub fn toggle_lock(&mut self) {
        self.is_locked = !self.is_locked;
    }

    /// 0-based beat index containing `time`
    pub fn beat_index_at(&self, time: f64) -> i64 {
        ((time - self.offset) / self.beat_duration()).floor() as i64
    }

    /// Seconds until the next beat boundary after `time`
    pub fn time_until_next_beat(&self, time: f64) -> f64 {
        let beat = self.beat_duration();
        let adjusted = time - self.offset;
        let next = adjusted.div_euclid(beat) * beat + beat;
        (next + self.offset) - time
    }

    /// Whether `time` lies on a beat within `tolerance` seconds
    pub fn is_on_beat(&self, time: f64, tolerance: f64) -> bool {
        let beat = self.beat_duration();
        let adjusted = time - self.offset;
        let nearest = (adjusted / beat).round() * beat;
        ((nearest + self.offset) - time).abs() <= tolerance
    }

    /// Time of the marker nearest to `time`, if any markers exist
    pub fn nearest_marker(&self, time: f64) -> Option<f64> {
        nearest_marker_index(&self.markers, time).map(|i| self.markers[i].time)
    }

    /// Serialize the grid to JSON for export
    pub fn to_json(&self) -> Result<String, GridError> {
        serde_json::to_string_pretty(self).map_err(GridError::Serialize)
    }

    /// Import a grid from JSON, validating the BPM
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        let grid: Self = serde_json::from_str(json).map_err(GridError::Serialize)?;
        validate_bpm(grid.bpm)?;
        Ok(grid)
    }
}

fn validate_bpm(bpm: f64) -> Result<(), GridError> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(GridError::InvalidBpm(bpm));
    }
    Ok(())
}

/// Average BPM implied by the intervals between consecutive markers
fn average_bpm(markers: &[BeatMarker]) -> Option<f64> {
    if markers.len() < 2 {
        return None;
    }
    let total: f64 = markers
        .windows(2)
        .map(|pair| pair[1].time - pair[0].time)
        .sum();
    let avg = total / (markers.len() - 1) as f64;
    if avg > 0.0 {
        Some(60.0 / avg)
    } else {
        None
    }
}

fn nearest_marker_index(markers: &[BeatMarker], time: f64) -> Option<usize> {
    markers
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (a.time - time)
                .abs()
                .partial_cmp(&(b.time - time).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
}
