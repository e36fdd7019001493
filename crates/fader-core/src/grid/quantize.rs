//! Quantize engine
//!
//! Snaps arbitrary timestamps to the nearest beat or sub-beat boundary of
//! a [`BeatGrid`]. Ties round toward the later boundary so repeated
//! quantization is deterministic.

use serde::{Deserialize, Serialize};

use super::BeatGrid;

/// Grid resolution for snapping, expressed in beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapDivision {
    ThirtySecond,
    Sixteenth,
    Eighth,
    #[default]
    Quarter,
    Half,
    Beat,
    TwoBeats,
    FourBeats,
}

impl SnapDivision {
    /// All divisions from finest to coarsest
    pub const ALL: [SnapDivision; 8] = [
        SnapDivision::ThirtySecond,
        SnapDivision::Sixteenth,
        SnapDivision::Eighth,
        SnapDivision::Quarter,
        SnapDivision::Half,
        SnapDivision::Beat,
        SnapDivision::TwoBeats,
        SnapDivision::FourBeats,
    ];

    /// Length of this division in beats
    pub fn beats(&self) -> f64 {
        match self {
            SnapDivision::ThirtySecond => 1.0 / 32.0,
            SnapDivision::Sixteenth => 1.0 / 16.0,
            SnapDivision::Eighth => 1.0 / 8.0,
            SnapDivision::Quarter => 1.0 / 4.0,
            SnapDivision::Half => 1.0 / 2.0,
            SnapDivision::Beat => 1.0,
            SnapDivision::TwoBeats => 2.0,
            SnapDivision::FourBeats => 4.0,
        }
    }

    /// Length of this division in seconds at the given BPM
    pub fn seconds(&self, bpm: f64) -> f64 {
        self.beats() * 60.0 / bpm
    }

    /// Display label matching DJ convention ("1/4", "2", ...)
    pub fn label(&self) -> &'static str {
        match self {
            SnapDivision::ThirtySecond => "1/32",
            SnapDivision::Sixteenth => "1/16",
            SnapDivision::Eighth => "1/8",
            SnapDivision::Quarter => "1/4",
            SnapDivision::Half => "1/2",
            SnapDivision::Beat => "1",
            SnapDivision::TwoBeats => "2",
            SnapDivision::FourBeats => "4",
        }
    }
}

/// Snap `time` to the nearest grid line at the given division
///
/// Ties round toward the later boundary. The grid's offset is respected so
/// lines fall on `offset + n * step`.
pub fn quantize_to_nearest(time: f64, grid: &BeatGrid, snap: SnapDivision) -> f64 {
    let step = snap.seconds(grid.bpm);
    let adjusted = time - grid.offset;
    // floor(x + 0.5) rounds half-way cases up, i.e. toward the later line
    let n = (adjusted / step + 0.5).floor();
    n * step + grid.offset
}

/// Snap `time` forward to the next grid line (identity when already on one)
pub fn quantize_to_next(time: f64, grid: &BeatGrid, snap: SnapDivision) -> f64 {
    let step = snap.seconds(grid.bpm);
    let adjusted = time - grid.offset;
    (adjusted / step).ceil() * step + grid.offset
}

/// Snap `time` backward to the previous grid line (identity when already on one)
pub fn quantize_to_previous(time: f64, grid: &BeatGrid, snap: SnapDivision) -> f64 {
    let step = snap.seconds(grid.bpm);
    let adjusted = time - grid.offset;
    (adjusted / step).floor() * step + grid.offset
}

/// Quantize settings carried per deck
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizeSettings {
    pub enabled: bool,
    pub snap: SnapDivision,
}

impl Default for QuantizeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            snap: SnapDivision::Quarter,
        }
    }
}

impl QuantizeSettings {
    /// Apply quantization to `time`
    ///
    /// Pass-through when disabled or when no grid is available.
    pub fn apply(&self, time: f64, grid: Option<&BeatGrid>) -> f64 {
        match (self.enabled, grid) {
            (true, Some(grid)) => quantize_to_nearest(time, grid, self.snap),
            _ => time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_120() -> BeatGrid {
        BeatGrid::generate(120.0, 0.0, 60.0, 4).unwrap()
    }

    #[test]
    fn test_nearest_beat() {
        let grid = grid_120();
        // Beat lines every 0.5s
        assert!((quantize_to_nearest(1.1, &grid, SnapDivision::Beat) - 1.0).abs() < 1e-9);
        assert!((quantize_to_nearest(1.4, &grid, SnapDivision::Beat) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_tie_rounds_later() {
        let grid = grid_120();
        // Exactly half-way between 1.0 and 1.5 snaps to 1.5
        assert!((quantize_to_nearest(1.25, &grid, SnapDivision::Beat) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_sub_beat_division() {
        let grid = grid_120();
        // 1/4 of a beat at 120 BPM = 0.125s
        let q = quantize_to_nearest(1.06, &grid, SnapDivision::Quarter);
        assert!((q - 1.0).abs() < 1e-9);
        let q = quantize_to_nearest(1.07, &grid, SnapDivision::Quarter);
        assert!((q - 1.125).abs() < 1e-9);
    }

    #[test]
    fn test_idempotent() {
        let grid = BeatGrid::generate(128.0, 0.13, 300.0, 4).unwrap();
        for snap in SnapDivision::ALL {
            for &t in &[0.0, 1.7, 42.31, 123.456] {
                let q1 = quantize_to_nearest(t, &grid, snap);
                let q2 = quantize_to_nearest(q1, &grid, snap);
                assert!(
                    (q1 - q2).abs() < 1e-9,
                    "not idempotent at t={t} snap={snap:?}: {q1} vs {q2}"
                );
            }
        }
    }

    #[test]
    fn test_within_half_step_of_grid_line() {
        let grid = BeatGrid::generate(97.3, 0.21, 300.0, 4).unwrap();
        let snap = SnapDivision::Eighth;
        let step = snap.seconds(grid.bpm);
        for i in 0..200 {
            let t = i as f64 * 0.731;
            let q = quantize_to_nearest(t, &grid, snap);
            assert!((q - t).abs() <= step / 2.0 + 1e-9);
            // q itself lies on a grid line
            let line = ((q - grid.offset) / step).round() * step + grid.offset;
            assert!((q - line).abs() < 1e-9);
        }
    }

    #[test]
    fn test_offset_respected() {
        let grid = BeatGrid::generate(120.0, 0.2, 60.0, 4).unwrap();
        // Lines at 0.2, 0.7, 1.2, ...
        assert!((quantize_to_nearest(0.65, &grid, SnapDivision::Beat) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_next_and_previous() {
        let grid = grid_120();
        assert!((quantize_to_next(1.1, &grid, SnapDivision::Beat) - 1.5).abs() < 1e-9);
        assert!((quantize_to_previous(1.4, &grid, SnapDivision::Beat) - 1.0).abs() < 1e-9);
        // Already on a line: both are identity
        assert!((quantize_to_next(1.0, &grid, SnapDivision::Beat) - 1.0).abs() < 1e-9);
        assert!((quantize_to_previous(1.0, &grid, SnapDivision::Beat) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_is_passthrough() {
        let grid = grid_120();
        let settings = QuantizeSettings {
            enabled: false,
            snap: SnapDivision::Beat,
        };
        assert_eq!(settings.apply(1.234, Some(&grid)), 1.234);
        // No grid at all is also pass-through
        let settings = QuantizeSettings::default();
        assert_eq!(settings.apply(1.234, None), 1.234);
    }
}
