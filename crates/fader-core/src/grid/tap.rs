//! Tap tempo
//!
//! Derives BPM from a rolling buffer of tap timestamps. Taps more than
//! two seconds apart reset the buffer; BPM is the median inter-tap
//! interval once at least two taps exist. The median keeps one sloppy
//! tap from skewing the estimate.

use std::time::Instant;

/// Taps further apart than this reset the buffer
pub const TAP_RESET_SECONDS: f64 = 2.0;

/// Rolling buffer capacity
const MAX_TAPS: usize = 8;

/// Tap-tempo calculator
#[derive(Debug)]
pub struct TapTempo {
    /// Tap timestamps in seconds relative to `epoch`
    taps: Vec<f64>,
    epoch: Instant,
}

impl TapTempo {
    pub fn new() -> Self {
        Self {
            taps: Vec::with_capacity(MAX_TAPS),
            epoch: Instant::now(),
        }
    }

    /// Register a tap at the current wall-clock time
    pub fn tap(&mut self) -> Option<f64> {
        let now = self.epoch.elapsed().as_secs_f64();
        self.tap_at(now)
    }

    /// Register a tap at an explicit timestamp (seconds, monotonic)
    ///
    /// Returns the current BPM estimate once two or more taps are buffered.
    pub fn tap_at(&mut self, time: f64) -> Option<f64> {
        if let Some(&last) = self.taps.last() {
            if time - last > TAP_RESET_SECONDS {
                self.taps.clear();
            }
        }

        self.taps.push(time);
        if self.taps.len() > MAX_TAPS {
            self.taps.remove(0);
        }

        self.bpm()
    }

    /// Current BPM estimate, or None with fewer than two taps
    pub fn bpm(&self) -> Option<f64> {
        if self.taps.len() < 2 {
            return None;
        }

        let mut intervals: Vec<f64> = self
            .taps
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect();
        intervals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let median = if intervals.len() % 2 == 1 {
            intervals[intervals.len() / 2]
        } else {
            let hi = intervals.len() / 2;
            0.5 * (intervals[hi - 1] + intervals[hi])
        };

        if median > 0.0 {
            Some(60.0 / median)
        } else {
            None
        }
    }

    /// Number of buffered taps
    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    /// Clear the tap buffer
    pub fn reset(&mut self) {
        self.taps.clear();
    }
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_two_taps() {
        let mut tap = TapTempo::new();
        assert_eq!(tap.tap_at(0.0), None);
        assert!(tap.tap_at(0.5).is_some());
    }

    #[test]
    fn test_steady_taps_give_bpm() {
        let mut tap = TapTempo::new();
        // Taps at 0, 0.5, 1.0, 1.5 -> interval 0.5s -> 120 BPM
        for t in [0.0, 0.5, 1.0, 1.5] {
            tap.tap_at(t);
        }
        let bpm = tap.bpm().unwrap();
        assert!((bpm - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_median_rejects_outlier() {
        let mut tap = TapTempo::new();
        // One late tap among steady 0.5s intervals should not move the median
        for t in [0.0, 0.5, 1.0, 1.8, 2.3, 2.8] {
            tap.tap_at(t);
        }
        let bpm = tap.bpm().unwrap();
        assert!((bpm - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_gap_resets() {
        let mut tap = TapTempo::new();
        tap.tap_at(0.0);
        tap.tap_at(0.5);
        assert_eq!(tap.tap_count(), 2);

        // 3 seconds later: buffer resets, this tap starts a new run
        assert_eq!(tap.tap_at(3.5), None);
        assert_eq!(tap.tap_count(), 1);
    }

    #[test]
    fn test_reset() {
        let mut tap = TapTempo::new();
        tap.tap_at(0.0);
        tap.tap_at(0.5);
        tap.reset();
        assert_eq!(tap.tap_count(), 0);
        assert_eq!(tap.bpm(), None);
    }

    #[test]
    fn test_rolling_buffer_cap() {
        let mut tap = TapTempo::new();
        for i in 0..20 {
            tap.tap_at(i as f64 * 0.5);
        }
        assert_eq!(tap.tap_count(), 8);
    }
}
