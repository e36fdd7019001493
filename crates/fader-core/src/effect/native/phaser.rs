//! Phaser
//!
//! Four cascaded allpass stages swept by a sine LFO, producing the
//! moving notches of a classic vintage phaser.

use super::biquad::{BiquadCoeffs, BiquadState};
use crate::effect::{Effect, EffectBase, EffectInfo, ParamInfo, ParamValue};
use crate::types::{StereoBuffer, SAMPLE_RATE};

const NUM_STAGES: usize = 4;

/// Sweep range for the allpass center frequency in Hz
const SWEEP_MIN: f32 = 200.0;
const SWEEP_MAX: f32 = 2000.0;

/// Samples per coefficient update (coefficients are expensive per-sample)
const MOD_BLOCK: usize = 32;

/// Four-stage swept allpass phaser
///
/// Parameters:
/// - Rate: LFO speed (0.05-2 Hz)
/// - Depth: sweep width (0-1 of the 200Hz-2kHz range)
/// - Feedback: resonance around the notches (0-90%)
/// - Mix: dry/wet balance
pub struct PhaserEffect {
    base: EffectBase,
    stages: [BiquadState; NUM_STAGES],
    coeffs: BiquadCoeffs,
    lfo_phase: f32,
    fb_l: f32,
    fb_r: f32,
}

impl PhaserEffect {
    pub fn new() -> Self {
        let info = EffectInfo::new("Phaser", "Modulation")
            .with_param(
                ParamInfo::new("Rate", 0.2)
                    .with_range(0.05, 2.0)
                    .with_unit("Hz"),
            )
            .with_param(ParamInfo::new("Depth", 0.8))
            .with_param(ParamInfo::new("Feedback", 0.4).with_range(0.0, 0.9))
            .with_param(ParamInfo::new("Mix", 0.5));

        Self {
            base: EffectBase::new(info),
            stages: Default::default(),
            coeffs: BiquadCoeffs::allpass(SWEEP_MIN, 0.707, SAMPLE_RATE as f32),
            lfo_phase: 0.0,
            fb_l: 0.0,
            fb_r: 0.0,
        }
    }
}

impl Default for PhaserEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for PhaserEffect {
    fn process(&mut self, buffer: &mut StereoBuffer) {
        if self.base.is_bypassed() {
            return;
        }

        let rate = self.base.param_actual(0);
        let depth = self.base.param_actual(1);
        let feedback = self.base.param_actual(2);
        let mix = self.base.param_actual(3);
        let dry = 1.0 - mix;

        let phase_inc = rate / SAMPLE_RATE as f32;
        let center = (SWEEP_MIN + SWEEP_MAX) * 0.5;
        let sweep = (SWEEP_MAX - SWEEP_MIN) * 0.5 * depth;

        let samples = buffer.as_mut_slice();
        for block in samples.chunks_mut(MOD_BLOCK) {
            let lfo = (2.0 * std::f32::consts::PI * self.lfo_phase).sin();
            let freq = center + sweep * lfo;
            self.coeffs = BiquadCoeffs::allpass(freq, 0.707, SAMPLE_RATE as f32);

            for sample in block.iter_mut() {
                let mut l = sample.left + self.fb_l * feedback;
                let mut r = sample.right + self.fb_r * feedback;
                for stage in &mut self.stages {
                    (l, r) = stage.process(l, r, &self.coeffs);
                }
                self.fb_l = l;
                self.fb_r = r;

                sample.left = sample.left * dry + l * mix;
                sample.right = sample.right * dry + r * mix;
            }

            self.lfo_phase += phase_inc * MOD_BLOCK as f32;
            if self.lfo_phase >= 1.0 {
                self.lfo_phase -= 1.0;
            }
        }
    }

    fn info(&self) -> &EffectInfo {
        self.base.info()
    }

    fn get_params(&self) -> &[ParamValue] {
        self.base.get_params()
    }

    fn set_param(&mut self, index: usize, value: f32) {
        self.base.set_param(index, value);
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.base.set_bypass(bypass);
    }

    fn is_bypassed(&self) -> bool {
        self.base.is_bypassed()
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        self.lfo_phase = 0.0;
        self.fb_l = 0.0;
        self.fb_r = 0.0;
    }
}
