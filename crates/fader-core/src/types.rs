//! Common types for Fader
//!
//! Fundamental audio types used throughout the toolkit: stereo sample and
//! buffer handling, deck identifiers, and playback state.

use std::ops::{Index, IndexMut};

/// Default sample rate used throughout Fader (48kHz - standard professional audio rate)
pub const SAMPLE_RATE: u32 = 48000;

/// Number of decks in a session (A and B)
pub const NUM_DECKS: usize = 2;

/// Audio sample type (32-bit float for processing)
pub type Sample = f32;

/// A single stereo sample (left and right channels)
///
/// Uses `#[repr(C)]` to ensure predictable memory layout: [left, right].
/// This enables zero-copy conversion between `&[StereoSample]` and `&[f32]`
/// (interleaved format) using bytemuck.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    /// Create a new stereo sample
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    /// Create a silent stereo sample
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Create a mono sample (same value in both channels)
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Collapse to mono (average of both channels)
    #[inline]
    pub fn to_mono(&self) -> Sample {
        0.5 * (self.left + self.right)
    }

    /// Get the peak amplitude (max of abs(left), abs(right))
    #[inline]
    pub fn peak(&self) -> Sample {
        self.left.abs().max(self.right.abs())
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl std::ops::AddAssign for StereoSample {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.left += other.left;
        self.right += other.right;
    }
}

impl std::ops::Mul<Sample> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Sample) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

impl std::ops::MulAssign<Sample> for StereoSample {
    #[inline]
    fn mul_assign(&mut self, factor: Sample) {
        self.left *= factor;
        self.right *= factor;
    }
}

/// A buffer of stereo samples
///
/// The primary audio buffer type used for block processing. Provides
/// efficient access to interleaved and non-interleaved sample data.
#[derive(Debug, Clone)]
pub struct StereoBuffer {
    samples: Vec<StereoSample>,
}

impl StereoBuffer {
    /// Create a buffer filled with silence
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![StereoSample::silence(); len],
        }
    }

    /// Create a buffer from interleaved samples [L, R, L, R, ...]
    pub fn from_interleaved(interleaved: &[Sample]) -> Self {
        assert!(interleaved.len() % 2 == 0, "Interleaved buffer must have even length");
        let samples = interleaved
            .chunks_exact(2)
            .map(|chunk| StereoSample::new(chunk[0], chunk[1]))
            .collect();
        Self { samples }
    }

    /// Create a buffer from an existing Vec of StereoSamples
    pub fn from_vec(samples: Vec<StereoSample>) -> Self {
        Self { samples }
    }

    /// Get the number of stereo samples in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Fill the buffer with silence
    pub fn fill_silence(&mut self) {
        self.samples.fill(StereoSample::silence());
    }

    /// Get a slice of the samples
    #[inline]
    pub fn as_slice(&self) -> &[StereoSample] {
        &self.samples
    }

    /// Get a mutable slice of the samples
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [StereoSample] {
        &mut self.samples
    }

    /// Get a zero-copy view of samples as interleaved f32 [L, R, L, R, ...]
    ///
    /// Zero-cost thanks to `#[repr(C)]` on StereoSample. Use for passing
    /// audio to hosts that expect interleaved format.
    #[inline]
    pub fn as_interleaved(&self) -> &[Sample] {
        bytemuck::cast_slice(&self.samples)
    }

    /// Get a zero-copy mutable view of samples as interleaved f32
    #[inline]
    pub fn as_interleaved_mut(&mut self) -> &mut [Sample] {
        bytemuck::cast_slice_mut(&mut self.samples)
    }

    /// Add another buffer to this one (summing samples)
    pub fn add_buffer(&mut self, other: &StereoBuffer) {
        assert_eq!(self.len(), other.len(), "Buffer lengths must match");
        for (dst, src) in self.samples.iter_mut().zip(other.samples.iter()) {
            *dst += *src;
        }
    }

    /// Scale all samples by a factor
    pub fn scale(&mut self, factor: Sample) {
        for sample in &mut self.samples {
            *sample *= factor;
        }
    }

    /// Get an iterator over the samples
    pub fn iter(&self) -> impl Iterator<Item = &StereoSample> {
        self.samples.iter()
    }

    /// Get a mutable iterator over the samples
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut StereoSample> {
        self.samples.iter_mut()
    }

    /// Get the peak amplitude in the buffer
    pub fn peak(&self) -> Sample {
        self.samples.iter().map(|s| s.peak()).fold(0.0, Sample::max)
    }

    /// Root-mean-square level of the buffer, averaged across channels
    pub fn rms(&self) -> Sample {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f32 = self
            .samples
            .iter()
            .map(|s| s.left * s.left + s.right * s.right)
            .sum();
        (sum / (2.0 * self.samples.len() as f32)).sqrt()
    }
}

impl Index<usize> for StereoBuffer {
    type Output = StereoSample;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

impl IndexMut<usize> for StereoBuffer {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.samples[index]
    }
}

impl Default for StereoBuffer {
    fn default() -> Self {
        Self { samples: Vec::new() }
    }
}

/// Deck identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DeckId {
    A,
    B,
}

impl DeckId {
    /// Both decks in order
    pub const ALL: [DeckId; NUM_DECKS] = [DeckId::A, DeckId::B];

    /// Index into per-deck arrays
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            DeckId::A => 0,
            DeckId::B => 1,
        }
    }

    /// The other deck
    pub fn other(&self) -> DeckId {
        match self {
            DeckId::A => DeckId::B,
            DeckId::B => DeckId::A,
        }
    }
}

impl std::fmt::Display for DeckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeckId::A => write!(f, "A"),
            DeckId::B => write!(f, "B"),
        }
    }
}

/// Playback state for a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
}
