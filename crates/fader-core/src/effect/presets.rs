//! Effect chain presets
//!
//! Named one-knob presets a performer can slam onto a deck. Each builds a
//! fresh [`EffectChain`] with the member effects already dialed in.

use serde::{Deserialize, Serialize};

use super::native::{
    freq_to_slider, BitcrusherEffect, EchoEffect, FilterEffect, FlangerEffect, PhaserEffect,
};
use super::{Effect, EffectChain};

/// The built-in chain presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FxPreset {
    /// Empty chain, signal untouched
    #[default]
    Clean,
    /// Beat-synced ping-pong echo with generous feedback
    SpaceEcho,
    /// Deep fast flanger
    JetFlanger,
    /// Slow four-stage phaser
    VintagePhaser,
    /// 8-bit crunch with heavy decimation
    LoFiCrusher,
    /// Narrow telephone band with light grit
    Radio,
}

impl FxPreset {
    pub const ALL: [FxPreset; 6] = [
        FxPreset::Clean,
        FxPreset::SpaceEcho,
        FxPreset::JetFlanger,
        FxPreset::VintagePhaser,
        FxPreset::LoFiCrusher,
        FxPreset::Radio,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            FxPreset::Clean => "Clean",
            FxPreset::SpaceEcho => "Space Echo",
            FxPreset::JetFlanger => "Jet Flanger",
            FxPreset::VintagePhaser => "Vintage Phaser",
            FxPreset::LoFiCrusher => "Lo-Fi Crusher",
            FxPreset::Radio => "Radio",
        }
    }
}

impl std::fmt::Display for FxPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Build a ready-to-play chain for the given preset
pub fn build_preset(preset: FxPreset) -> EffectChain {
    let mut chain = EffectChain::new();
    match preset {
        FxPreset::Clean => {}
        FxPreset::SpaceEcho => {
            let mut echo = EchoEffect::new();
            echo.set_param(0, 0.333); // 3/4 beat
            echo.set_param(1, 0.65); // long trail
            echo.set_param(2, 0.4);
            echo.set_param(3, 1.0); // ping-pong
            chain.push(Box::new(echo));
        }
        FxPreset::JetFlanger => {
            let mut flanger = FlangerEffect::new();
            flanger.set_param(0, 0.4);
            flanger.set_param(1, 1.0); // full sweep
            flanger.set_param(2, 0.8);
            flanger.set_param(3, 0.5);
            chain.push(Box::new(flanger));
        }
        FxPreset::VintagePhaser => {
            let mut phaser = PhaserEffect::new();
            phaser.set_param(0, 0.1); // slow
            phaser.set_param(1, 0.9);
            phaser.set_param(2, 0.5);
            phaser.set_param(3, 0.5);
            chain.push(Box::new(phaser));
        }
        FxPreset::LoFiCrusher => {
            let mut crusher = BitcrusherEffect::new();
            crusher.set_param(0, 0.333); // 8 bits
            crusher.set_param(1, 0.128); // downsample ~6x
            crusher.set_param(2, 0.8);
            chain.push(Box::new(crusher));
        }
        FxPreset::Radio => {
            let mut filter = FilterEffect::new();
            filter.set_param(0, freq_to_slider(500.0));
            filter.set_param(1, freq_to_slider(3000.0));
            chain.push(Box::new(filter));

            let mut crusher = BitcrusherEffect::new();
            crusher.set_param(0, 0.667); // 12 bits, just a little grit
            crusher.set_param(1, 0.026); // ~2x
            crusher.set_param(2, 0.5);
            chain.push(Box::new(crusher));
        }
    }
    log::debug!("built preset {preset} ({} effects)", chain.len());
    chain
}
