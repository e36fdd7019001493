//! Track and spectrum analysis

mod bands;
mod tempo;

pub use bands::{
    analyze_frequency_bands, generate_mock_frequency_data, reconstruct_frequency_data,
    FrequencyBands, MockSpectrumParams,
};
pub use tempo::{analyze_track, estimate_key, AnalysisStatus, TrackAnalysis};
