//! Beat grid, tap tempo and quantization
//!
//! Everything timing-related lives here: the [`BeatGrid`] model with its
//! editable marker list, the [`TapTempo`] estimator, and the quantize
//! functions that snap timestamps onto grid lines.

mod beatgrid;
mod quantize;
mod tap;

pub use beatgrid::{BeatGrid, BeatMarker, DEFAULT_BPM, MARKER_MATCH_TOLERANCE};
pub use quantize::{
    quantize_to_nearest, quantize_to_next, quantize_to_previous, QuantizeSettings, SnapDivision,
};
pub use tap::{TapTempo, TAP_RESET_SECONDS};

/// Errors from beat grid construction and import
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("invalid BPM: {0} (must be finite and positive)")]
    InvalidBpm(f64),

    #[error("invalid beats per bar: {0} (must be at least 2)")]
    InvalidBeatsPerBar(u32),

    #[error("grid serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
