//! Dual highpass/lowpass filter
//!
//! Per-deck sweepable filter pair. Cutoffs are clamped to the audible
//! band and glide toward their targets over roughly 10ms so fast knob
//! moves never zipper. UI sliders map logarithmically so equal slider
//! travel covers equal octaves.

use serde::{Deserialize, Serialize};

use super::biquad::{BiquadCoeffs, BiquadState};
use crate::effect::{Effect, EffectBase, EffectInfo, ParamInfo, ParamValue};
use crate::types::{StereoBuffer, SAMPLE_RATE};

/// Lowest selectable cutoff in Hz
pub const FREQ_MIN: f32 = 20.0;

/// Highest selectable cutoff in Hz
pub const FREQ_MAX: f32 = 20000.0;

/// Cutoff smoothing time constant in seconds
const SMOOTHING_SECONDS: f32 = 0.010;

/// Samples per coefficient update while ramping
const RAMP_BLOCK: usize = 64;

const FILTER_Q: f32 = 0.707;

/// Map a 0-1 slider position to a cutoff frequency (logarithmic)
pub fn slider_to_freq(slider: f32) -> f32 {
    let slider = slider.clamp(0.0, 1.0);
    let log_min = FREQ_MIN.log10();
    let log_max = FREQ_MAX.log10();
    10.0_f32.powf(log_min + slider * (log_max - log_min))
}

/// Map a cutoff frequency back to a 0-1 slider position
pub fn freq_to_slider(freq: f32) -> f32 {
    let freq = freq.clamp(FREQ_MIN, FREQ_MAX);
    let log_min = FREQ_MIN.log10();
    let log_max = FREQ_MAX.log10();
    (freq.log10() - log_min) / (log_max - log_min)
}

/// Serializable filter state for persistence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    pub highpass_hz: f32,
    pub lowpass_hz: f32,
    pub enabled: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            highpass_hz: FREQ_MIN,
            lowpass_hz: FREQ_MAX,
            enabled: true,
        }
    }
}

/// Sweepable HP + LP filter pair for one deck
///
/// Parameters:
/// - HighPass: slider position 0-1, mapped log to 20Hz-20kHz
/// - LowPass: slider position 0-1, mapped log to 20Hz-20kHz
pub struct FilterEffect {
    base: EffectBase,
    hp_target: f32,
    lp_target: f32,
    hp_current: f32,
    lp_current: f32,
    hp_coeffs: BiquadCoeffs,
    lp_coeffs: BiquadCoeffs,
    hp_state: BiquadState,
    lp_state: BiquadState,
}

impl FilterEffect {
    pub fn new() -> Self {
        let info = EffectInfo::new("Filter", "Filter")
            .with_param(ParamInfo::new("HighPass", 0.0))
            .with_param(ParamInfo::new("LowPass", 1.0));

        Self {
            base: EffectBase::new(info),
            hp_target: FREQ_MIN,
            lp_target: FREQ_MAX,
            hp_current: FREQ_MIN,
            lp_current: FREQ_MAX,
            hp_coeffs: BiquadCoeffs::passthrough(),
            lp_coeffs: BiquadCoeffs::passthrough(),
            hp_state: BiquadState::default(),
            lp_state: BiquadState::default(),
        }
    }

    /// Set the highpass cutoff directly in Hz (clamped to 20Hz-20kHz)
    pub fn set_highpass_hz(&mut self, freq: f32) {
        self.hp_target = freq.clamp(FREQ_MIN, FREQ_MAX);
        self.base.set_param(0, freq_to_slider(self.hp_target));
    }

    /// Set the lowpass cutoff directly in Hz (clamped to 20Hz-20kHz)
    pub fn set_lowpass_hz(&mut self, freq: f32) {
        self.lp_target = freq.clamp(FREQ_MIN, FREQ_MAX);
        self.base.set_param(1, freq_to_slider(self.lp_target));
    }

    /// Target highpass cutoff in Hz
    pub fn highpass_hz(&self) -> f32 {
        self.hp_target
    }

    /// Target lowpass cutoff in Hz
    pub fn lowpass_hz(&self) -> f32 {
        self.lp_target
    }

    /// Smoothed cutoff currently applied to the audio
    pub fn current_highpass_hz(&self) -> f32 {
        self.hp_current
    }

    /// Smoothed cutoff currently applied to the audio
    pub fn current_lowpass_hz(&self) -> f32 {
        self.lp_current
    }

    /// Load a persisted settings snapshot
    pub fn apply_settings(&mut self, settings: &FilterSettings) {
        self.set_highpass_hz(settings.highpass_hz);
        self.set_lowpass_hz(settings.lowpass_hz);
        self.base.set_bypass(!settings.enabled);
    }

    /// Snapshot the current targets for persistence
    pub fn settings(&self) -> FilterSettings {
        FilterSettings {
            highpass_hz: self.hp_target,
            lowpass_hz: self.lp_target,
            enabled: !self.base.is_bypassed(),
        }
    }

    fn update_coeffs(&mut self, alpha: f32) {
        // Glide in log space so the sweep sounds even
        self.hp_current = glide(self.hp_current, self.hp_target, alpha);
        self.lp_current = glide(self.lp_current, self.lp_target, alpha);

        let sr = SAMPLE_RATE as f32;
        // A fully-open side degenerates to passthrough
        self.hp_coeffs = if self.hp_current <= FREQ_MIN + 0.5 {
            BiquadCoeffs::passthrough()
        } else {
            BiquadCoeffs::highpass(self.hp_current, FILTER_Q, sr)
        };
        self.lp_coeffs = if self.lp_current >= FREQ_MAX - 0.5 {
            BiquadCoeffs::passthrough()
        } else {
            BiquadCoeffs::lowpass(self.lp_current, FILTER_Q, sr)
        };
    }
}

/// Exponential approach of `current` toward `target` in log-frequency space
fn glide(current: f32, target: f32, alpha: f32) -> f32 {
    if (current - target).abs() < 0.01 {
        return target;
    }
    let log_cur = current.ln();
    let log_tgt = target.ln();
    (log_cur + alpha * (log_tgt - log_cur)).exp()
}

impl Default for FilterEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for FilterEffect {
    fn process(&mut self, buffer: &mut StereoBuffer) {
        if self.base.is_bypassed() {
            return;
        }

        let samples = buffer.as_mut_slice();
        for block in samples.chunks_mut(RAMP_BLOCK) {
            let dt = block.len() as f32 / SAMPLE_RATE as f32;
            let alpha = 1.0 - (-dt / SMOOTHING_SECONDS).exp();
            self.update_coeffs(alpha);

            for sample in block.iter_mut() {
                let (l, r) = self.hp_state.process(sample.left, sample.right, &self.hp_coeffs);
                let (l, r) = self.lp_state.process(l, r, &self.lp_coeffs);
                sample.left = l;
                sample.right = r;
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
        match index {
            0 => self.hp_target = slider_to_freq(value),
            1 => self.lp_target = slider_to_freq(value),
            _ => {}
        }
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.base.set_bypass(bypass);
    }

    fn is_bypassed(&self) -> bool {
        self.base.is_bypassed()
    }

    /// Restore pass-all cutoffs and clear the filter state
    fn reset(&mut self) {
        self.hp_target = FREQ_MIN;
        self.lp_target = FREQ_MAX;
        self.hp_current = FREQ_MIN;
        self.lp_current = FREQ_MAX;
        self.base.set_param(0, 0.0);
        self.base.set_param(1, 1.0);
        self.hp_coeffs = BiquadCoeffs::passthrough();
        self.lp_coeffs = BiquadCoeffs::passthrough();
        self.hp_state.reset();
        self.lp_state.reset();
    }
}
