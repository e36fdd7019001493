//! Frequency band summarization
//!
//! Collapses an analyser-style magnitude spectrum (one byte per bin,
//! 0-255) into bass/mid/high levels, and reconstructs a plausible
//! spectrum from those levels for UI that only persisted the summary.
//! Band splits are proportional: the first 5% of bins are bass, the next
//! 20% mid, the remaining 75% high.

use serde::{Deserialize, Serialize};

/// Fraction of bins treated as bass
const BASS_SPLIT: f64 = 0.05;
/// Fraction of bins covered by bass + mid
const MID_SPLIT: f64 = 0.25;

/// Normalized per-band levels (0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrequencyBands {
    pub bass: f64,
    pub mid: f64,
    pub high: f64,
}

impl FrequencyBands {
    /// Overall energy, bands weighted equally
    pub fn level(&self) -> f64 {
        (self.bass + self.mid + self.high) / 3.0
    }
}

fn split_points(len: usize) -> (usize, usize) {
    let bass_end = ((len as f64 * BASS_SPLIT) as usize).max(1);
    let mid_end = ((len as f64 * MID_SPLIT) as usize).max(bass_end + 1);
    (bass_end, mid_end.min(len))
}

fn average(bins: &[u8]) -> f64 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    sum as f64 / bins.len() as f64 / 255.0
}

/// Summarize a magnitude spectrum into band levels
///
/// Empty input yields silent bands.
pub fn analyze_frequency_bands(spectrum: &[u8]) -> FrequencyBands {
    if spectrum.is_empty() {
        return FrequencyBands::default();
    }
    let (bass_end, mid_end) = split_points(spectrum.len());
    FrequencyBands {
        bass: average(&spectrum[..bass_end]),
        mid: average(&spectrum[bass_end..mid_end]),
        high: average(&spectrum[mid_end..]),
    }
}

/// Small deterministic noise generator for spectrum texture
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1664525).wrapping_add(1013904223);
        self.0
    }

    /// Uniform value in [-range, range]
    fn jitter(&mut self, range: i32) -> i32 {
        (self.next() % (2 * range as u32 + 1)) as i32 - range
    }
}

/// Rebuild a spectrum whose band summary matches `bands`
///
/// The output carries deterministic per-bin texture, but re-analyzing it
/// returns each band level within 0.05 of the input.
pub fn reconstruct_frequency_data(bands: &FrequencyBands, len: usize) -> Vec<u8> {
    if len == 0 {
        return Vec::new();
    }
    let (bass_end, mid_end) = split_points(len);
    let mut rng = Lcg(0x5EED_1234);
    let mut out = Vec::with_capacity(len);

    for i in 0..len {
        let level = if i < bass_end {
            bands.bass
        } else if i < mid_end {
            bands.mid
        } else {
            bands.high
        };
        let center = (level * 255.0).round() as i32;
        // Jitter shrinks near the byte limits so clamping can't bias the mean
        let headroom = center.min(255 - center).min(6);
        let value = if headroom > 0 {
            center + rng.jitter(headroom)
        } else {
            center
        };
        out.push(value.clamp(0, 255) as u8);
    }
    out
}

/// Inputs for the mock spectrum generator
#[derive(Debug, Clone, Copy)]
pub struct MockSpectrumParams {
    /// A stopped deck renders a silent spectrum
    pub is_playing: bool,
    /// Overall energy scale in [0, 1]
    pub energy: f64,
    /// Position within the beat in [0, 1)
    pub beat_phase: f64,
}

/// Synthesize an animated spectrum for a deck with no live analyser
///
/// Energy pulses on the beat with a squared half-sine envelope, strongest
/// in the bass, scaled by the energy parameter. A deck that isn't playing
/// gets all-zero bins so the renderer shows it stopped.
pub fn generate_mock_frequency_data(len: usize, params: MockSpectrumParams) -> Vec<u8> {
    if !params.is_playing {
        return vec![0u8; len];
    }
    let energy = params.energy.clamp(0.0, 1.0);
    let envelope = (std::f64::consts::PI * params.beat_phase.rem_euclid(1.0))
        .sin()
        .max(0.0)
        .powi(2);
    let mut rng = Lcg((params.beat_phase * 1e6) as u32 ^ 0xA5A5_A5A5);
    let jitter_range = (12.0 * energy).round() as i32;
    let mut out = Vec::with_capacity(len);

    for i in 0..len {
        // Spectral tilt: energy falls off toward high bins
        let tilt = 1.0 - (i as f64 / len.max(1) as f64) * 0.8;
        let base = energy * (60.0 + 160.0 * envelope * tilt);
        let value = if jitter_range > 0 {
            base as i32 + rng.jitter(jitter_range)
        } else {
            base as i32
        };
        out.push(value.clamp(0, 255) as u8);
    }
    out
}
