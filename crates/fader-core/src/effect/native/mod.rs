//! Native Rust effects

mod biquad;
mod bitcrusher;
mod delay;
mod filter;
mod flanger;
mod phaser;

pub use biquad::{BiquadCoeffs, BiquadState};
pub use bitcrusher::BitcrusherEffect;
pub use delay::EchoEffect;
pub use filter::{
    freq_to_slider, slider_to_freq, FilterEffect, FilterSettings, FREQ_MAX, FREQ_MIN,
};
pub use flanger::FlangerEffect;
pub use phaser::PhaserEffect;
