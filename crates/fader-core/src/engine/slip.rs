//! Slip mode
//!
//! While slip is active the audible playhead can be thrown anywhere
//! (scratched, looped, cue-juggled) while a virtual playhead keeps
//! advancing in real time from the point slip was entered. Leaving slip
//! snaps playback to the virtual playhead, so the track's timeline is
//! never lost.

use std::time::Instant;

/// Slip engine for one deck
#[derive(Debug, Default)]
pub struct SlipMode {
    state: Option<SlipState>,
    epoch: Option<Instant>,
}

#[derive(Debug, Clone, Copy)]
struct SlipState {
    /// Track position when slip was entered
    start_position: f64,
    /// Clock timestamp (seconds) when slip was entered
    entered_at: f64,
}

impl SlipMode {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    fn now(&mut self) -> f64 {
        let epoch = *self.epoch.get_or_insert_with(Instant::now);
        epoch.elapsed().as_secs_f64()
    }

    /// Enter slip at the current playhead position (wall clock)
    pub fn enter(&mut self, position: f64) {
        let now = self.now();
        self.enter_at(position, now);
    }

    /// Enter slip at an explicit clock timestamp in seconds
    ///
    /// Re-entering while already active is a no-op; the original virtual
    /// playhead stands.
    pub fn enter_at(&mut self, position: f64, now: f64) {
        if self.state.is_some() {
            return;
        }
        self.state = Some(SlipState {
            start_position: position,
            entered_at: now,
        });
        log::debug!("slip entered at {position:.3}s");
    }

    /// Where the virtual playhead is at clock time `now`
    pub fn virtual_position_at(&self, now: f64) -> Option<f64> {
        self.state
            .as_ref()
            .map(|s| s.start_position + (now - s.entered_at).max(0.0))
    }

    /// How far the audible playhead has drifted from the virtual one
    pub fn slip_offset_at(&self, actual_position: f64, now: f64) -> Option<f64> {
        self.virtual_position_at(now).map(|v| v - actual_position)
    }

    /// Leave slip (wall clock), returning the position to resume at
    pub fn exit(&mut self) -> Option<f64> {
        let now = self.now();
        self.exit_at(now)
    }

    /// Leave slip at an explicit clock timestamp in seconds
    ///
    /// Returns the virtual playhead position to seek to, or None when slip
    /// was not active.
    pub fn exit_at(&mut self, now: f64) -> Option<f64> {
        let resume = self.virtual_position_at(now);
        if let Some(pos) = resume {
            log::debug!("slip exited, resuming at {pos:.3}s");
        }
        self.state = None;
        resume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_playhead_advances_in_real_time() {
        let mut slip = SlipMode::new();
        slip.enter_at(30.0, 100.0);
        assert!(slip.is_active());
        // 2.5 wall-clock seconds later the virtual playhead is at 32.5,
        // no matter where the audible playhead went
        assert!((slip.virtual_position_at(102.5).unwrap() - 32.5).abs() < 1e-9);
    }

    #[test]
    fn test_exit_returns_virtual_position() {
        let mut slip = SlipMode::new();
        slip.enter_at(30.0, 0.0);
        let resume = slip.exit_at(4.0).unwrap();
        assert!((resume - 34.0).abs() < 1e-9);
        assert!(!slip.is_active());
    }

    #[test]
    fn test_immediate_exit_resumes_near_entry() {
        let mut slip = SlipMode::new();
        slip.enter_at(12.34, 50.0);
        let resume = slip.exit_at(50.0).unwrap();
        assert!((resume - 12.34).abs() < 1e-9);
    }

    #[test]
    fn test_slip_offset() {
        let mut slip = SlipMode::new();
        slip.enter_at(30.0, 0.0);
        // Audible playhead got scratched back to 28.0; virtual is at 31.0
        let offset = slip.slip_offset_at(28.0, 1.0).unwrap();
        assert!((offset - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_reenter_is_noop() {
        let mut slip = SlipMode::new();
        slip.enter_at(30.0, 0.0);
        slip.enter_at(99.0, 2.0);
        assert!((slip.virtual_position_at(3.0).unwrap() - 33.0).abs() < 1e-9);
    }

    #[test]
    fn test_exit_when_inactive() {
        let mut slip = SlipMode::new();
        assert_eq!(slip.exit_at(1.0), None);
    }
}
