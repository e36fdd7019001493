//! Fader Core - beat-accurate DJ performance toolkit

pub mod analysis;
pub mod effect;
pub mod engine;
pub mod grid;
pub mod mixer;
pub mod sidechain;
pub mod types;

pub use types::*;
