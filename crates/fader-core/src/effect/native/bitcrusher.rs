//! Bitcrusher
//!
//! Lo-fi degradation by bit-depth quantization and sample-rate
//! decimation (zero-order hold).

use crate::effect::{Effect, EffectBase, EffectInfo, ParamInfo, ParamValue};
use crate::types::{StereoBuffer, StereoSample};

/// Quantize-and-decimate crusher
///
/// Parameters:
/// - Bits: effective bit depth (4-16)
/// - Downsample: hold factor (1 = off, 40 = heavy aliasing)
/// - Mix: dry/wet balance
pub struct BitcrusherEffect {
    base: EffectBase,
    held: StereoSample,
    hold_count: u32,
}

impl BitcrusherEffect {
    pub fn new() -> Self {
        let info = EffectInfo::new("Bitcrusher", "Distortion")
            .with_param(
                ParamInfo::new("Bits", 1.0)
                    .with_range(4.0, 16.0)
                    .with_unit("bits"),
            )
            .with_param(ParamInfo::new("Downsample", 0.0).with_range(1.0, 40.0))
            .with_param(ParamInfo::new("Mix", 1.0));

        Self {
            base: EffectBase::new(info),
            held: StereoSample::silence(),
            hold_count: 0,
        }
    }

    #[inline]
    fn quantize(value: f32, levels: f32) -> f32 {
        (value * levels).round() / levels
    }
}

impl Default for BitcrusherEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for BitcrusherEffect {
    fn process(&mut self, buffer: &mut StereoBuffer) {
        if self.base.is_bypassed() {
            return;
        }

        let bits = self.base.param_actual(0);
        let downsample = self.base.param_actual(1).round().max(1.0) as u32;
        let mix = self.base.param_actual(2);
        let dry = 1.0 - mix;

        // Half the level count because signals are bipolar
        let levels = 2.0_f32.powf(bits - 1.0);

        for sample in buffer.iter_mut() {
            if self.hold_count == 0 {
                self.held = StereoSample::new(
                    Self::quantize(sample.left, levels),
                    Self::quantize(sample.right, levels),
                );
            }
            self.hold_count = (self.hold_count + 1) % downsample;

            *sample = *sample * dry + self.held * mix;
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
        self.held = StereoSample::silence();
        self.hold_count = 0;
    }
}
