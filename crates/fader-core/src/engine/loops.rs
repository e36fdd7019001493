//! Loop engine
//!
//! Bar-aligned loops plus the loop-roll gesture. A regular loop traps
//! playback between two points; loop roll does the same audibly while a
//! virtual playhead keeps running underneath, so releasing the roll lands
//! exactly where the track would have been.

use serde::{Deserialize, Serialize};

use crate::grid::BeatGrid;

/// Smallest loop length in bars
pub const MIN_LOOP_BARS: f64 = 1.0;

/// Largest loop length in bars
pub const MAX_LOOP_BARS: f64 = 8.0;

/// An active or parked loop region in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Loop {
    pub start: f64,
    pub end: f64,
    /// Length in bars the loop was built from
    pub bars: f64,
    pub is_active: bool,
}

impl Loop {
    /// Build a loop of `bars` bars starting at `start`
    ///
    /// Length follows the grid: `bars * beats_per_bar * beat_duration`.
    /// Bars are clamped to `[MIN_LOOP_BARS, MAX_LOOP_BARS]`.
    pub fn from_bars(start: f64, bars: f64, grid: &BeatGrid) -> Self {
        let bars = bars.clamp(MIN_LOOP_BARS, MAX_LOOP_BARS);
        Self {
            start,
            end: start + bars * grid.bar_duration(),
            bars,
            is_active: true,
        }
    }

    /// Loop length in seconds
    #[inline]
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `position` lies inside the loop region
    #[inline]
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position < self.end
    }

    /// Wrap `position` back into the loop if playback has run past the end
    ///
    /// Returns the new position when a jump is needed, None otherwise.
    /// Inactive loops never wrap. The overshoot past the end deliberately
    /// carries into the wrapped position (rather than snapping to `start`)
    /// so block-sized ticks keep their beat phase across the jump.
    pub fn playback_wrap(&self, position: f64) -> Option<f64> {
        if !self.is_active || position < self.end {
            return None;
        }
        let len = self.length();
        if len <= 0.0 {
            return Some(self.start);
        }
        Some(self.start + (position - self.end).rem_euclid(len))
    }

    /// Resize to a new bar count, keeping the start point
    pub fn resize(&mut self, bars: f64, grid: &BeatGrid) {
        self.bars = bars.clamp(MIN_LOOP_BARS, MAX_LOOP_BARS);
        self.end = self.start + self.bars * grid.bar_duration();
    }

    /// Halve the loop length (clamped at the minimum)
    pub fn halve(&mut self, grid: &BeatGrid) {
        self.resize(self.bars / 2.0, grid);
    }

    /// Double the loop length (clamped at the maximum)
    pub fn double(&mut self, grid: &BeatGrid) {
        self.resize(self.bars * 2.0, grid);
    }

    /// Shift the whole region by `delta` seconds, clamped at track start
    pub fn shift(&mut self, delta: f64) {
        let len = self.length();
        self.start = (self.start + delta).max(0.0);
        self.end = self.start + len;
    }
}

/// Momentary loop with a virtual playhead running underneath
///
/// Engaging starts an audible loop and freezes a virtual position at the
/// engage point; releasing returns the position the track would have
/// reached had the roll never happened.
#[derive(Debug, Default)]
pub struct LoopRoll {
    state: Option<RollState>,
}

#[derive(Debug)]
struct RollState {
    region: Loop,
    /// Track position when the roll was engaged
    virtual_start: f64,
    /// Clock timestamp (seconds) when the roll was engaged
    engaged_at: f64,
}

impl LoopRoll {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// The audible loop region while rolling
    pub fn region(&self) -> Option<&Loop> {
        self.state.as_ref().map(|s| &s.region)
    }

    /// Engage a roll of `bars` bars at `position`
    ///
    /// `now` is a monotonic clock reading in seconds. Re-engaging while
    /// active replaces the region but keeps the original virtual playhead,
    /// so stacking roll lengths never loses time.
    pub fn engage(&mut self, position: f64, bars: f64, grid: &BeatGrid, now: f64) {
        let region = Loop::from_bars(position, bars, grid);
        match &mut self.state {
            Some(state) => state.region = region,
            None => {
                self.state = Some(RollState {
                    region,
                    virtual_start: position,
                    engaged_at: now,
                });
                log::debug!("loop roll engaged at {position:.3}s ({bars} bars)");
            }
        }
    }

    /// Audible position inside the roll region for the given playhead
    pub fn audible_position(&self, position: f64) -> f64 {
        match &self.state {
            Some(state) => state
                .region
                .playback_wrap(position)
                .unwrap_or(position),
            None => position,
        }
    }

    /// Where the virtual playhead is at clock time `now`
    pub fn virtual_position(&self, now: f64) -> Option<f64> {
        self.state
            .as_ref()
            .map(|s| s.virtual_start + (now - s.engaged_at).max(0.0))
    }

    /// Release the roll, returning the position to resume playback at
    pub fn release(&mut self, now: f64) -> Option<f64> {
        let resume = self.virtual_position(now);
        if resume.is_some() {
            log::debug!("loop roll released, resuming at {:.3}s", resume.unwrap());
        }
        self.state = None;
        resume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_128() -> BeatGrid {
        BeatGrid::generate(128.0, 0.0, 300.0, 4).unwrap()
    }

    #[test]
    fn test_loop_length_follows_grid() {
        // 128 BPM, 4/4: bar = 1.875s, so a 4-bar loop at 10.0 ends at 17.5
        let grid = grid_128();
        let l = Loop::from_bars(10.0, 4.0, &grid);
        assert!((l.end - 17.5).abs() < 1e-9);
        assert!((l.length() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_playback_wrap() {
        let grid = grid_128();
        let l = Loop::from_bars(10.0, 1.0, &grid); // 10.0 .. 11.875
        assert_eq!(l.playback_wrap(11.0), None);
        let wrapped = l.playback_wrap(11.9).unwrap();
        assert!((wrapped - 10.025).abs() < 1e-9);
        // Landing exactly on the end wraps to the start
        assert!((l.playback_wrap(11.875).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_inactive_loop_never_wraps() {
        let grid = grid_128();
        let mut l = Loop::from_bars(10.0, 1.0, &grid);
        l.is_active = false;
        assert_eq!(l.playback_wrap(50.0), None);
    }

    #[test]
    fn test_halve_double_clamped() {
        let grid = grid_128();
        let mut l = Loop::from_bars(10.0, 4.0, &grid);
        l.halve(&grid);
        assert_eq!(l.bars, 2.0);
        l.halve(&grid);
        l.halve(&grid);
        l.halve(&grid); // would be 0.25, clamps at 1
        assert_eq!(l.bars, MIN_LOOP_BARS);

        l.double(&grid);
        l.double(&grid);
        l.double(&grid);
        l.double(&grid); // would be 16, clamps at 8
        assert_eq!(l.bars, MAX_LOOP_BARS);
        assert!((l.length() - 8.0 * grid.bar_duration()).abs() < 1e-9);
    }

    #[test]
    fn test_shift_preserves_length_and_clamps() {
        let grid = grid_128();
        let mut l = Loop::from_bars(10.0, 2.0, &grid);
        let len = l.length();
        l.shift(1.875);
        assert!((l.start - 11.875).abs() < 1e-9);
        assert!((l.length() - len).abs() < 1e-9);

        l.shift(-100.0);
        assert_eq!(l.start, 0.0);
        assert!((l.length() - len).abs() < 1e-9);
    }

    #[test]
    fn test_roll_release_returns_virtual_position() {
        let grid = grid_128();
        let mut roll = LoopRoll::new();
        roll.engage(20.0, 1.0, &grid, 100.0);
        assert!(roll.is_active());

        // 3 seconds of rolling: audible playhead loops, virtual runs on
        assert!((roll.virtual_position(103.0).unwrap() - 23.0).abs() < 1e-9);
        let resume = roll.release(103.0).unwrap();
        assert!((resume - 23.0).abs() < 1e-9);
        assert!(!roll.is_active());
    }

    #[test]
    fn test_reengage_keeps_virtual_playhead() {
        let grid = grid_128();
        let mut roll = LoopRoll::new();
        roll.engage(20.0, 2.0, &grid, 100.0);
        // Switching roll length mid-gesture must not reset the clock
        roll.engage(20.5, 1.0, &grid, 101.0);
        assert!((roll.virtual_position(102.0).unwrap() - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_audible_position_wraps_inside_region() {
        let grid = grid_128();
        let mut roll = LoopRoll::new();
        roll.engage(20.0, 1.0, &grid, 0.0);
        let region = *roll.region().unwrap();
        let audible = roll.audible_position(region.end + 0.1);
        assert!(region.contains(audible));
        // Positions still inside the region pass through untouched
        assert_eq!(roll.audible_position(20.3), 20.3);
    }

    #[test]
    fn test_release_when_idle() {
        let mut roll = LoopRoll::new();
        assert_eq!(roll.release(5.0), None);
    }
}
