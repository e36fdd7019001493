//! Effect system - traits, chains, and parameter mapping
//!
//! A unified interface for the native DSP effects plus the ordered
//! [`EffectChain`] each deck routes its signal through. All parameters
//! are normalized (0.0-1.0) for easy mapping to hardware knobs.

pub mod native;
pub mod presets;

pub use presets::{build_preset, FxPreset};

use crate::types::StereoBuffer;

/// Information about an effect parameter
#[derive(Debug, Clone)]
pub struct ParamInfo {
    /// Parameter name for display
    pub name: String,
    /// Default value (0.0-1.0)
    pub default: f32,
    /// Minimum value after range mapping
    pub min: f32,
    /// Maximum value after range mapping
    pub max: f32,
    /// Unit label (e.g., "ms", "dB", "%")
    pub unit: String,
}

impl Default for ParamInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            default: 0.5,
            min: 0.0,
            max: 1.0,
            unit: String::new(),
        }
    }
}

impl ParamInfo {
    /// Create a new parameter info with name and default value
    pub fn new(name: impl Into<String>, default: f32) -> Self {
        Self {
            name: name.into(),
            default,
            ..Default::default()
        }
    }

    /// Set the value range
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the unit label
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

/// Current parameter value with its denormalized counterpart
#[derive(Debug, Clone, Copy)]
pub struct ParamValue {
    /// Normalized value (0.0-1.0)
    pub normalized: f32,
    /// Actual value after range mapping
    pub actual: f32,
}

impl Default for ParamValue {
    fn default() -> Self {
        Self {
            normalized: 0.5,
            actual: 0.5,
        }
    }
}

impl ParamValue {
    pub fn new(normalized: f32, actual: f32) -> Self {
        Self { normalized, actual }
    }

    /// Create from normalized value with the given param info
    pub fn from_normalized(normalized: f32, info: &ParamInfo) -> Self {
        let normalized = normalized.clamp(0.0, 1.0);
        let actual = info.min + normalized * (info.max - info.min);
        Self { normalized, actual }
    }
}

/// Information about an effect
#[derive(Debug, Clone)]
pub struct EffectInfo {
    /// Effect name for display
    pub name: String,
    /// Effect category (e.g., "Filter", "Delay", "Modulation")
    pub category: String,
    /// Parameter descriptions
    pub params: Vec<ParamInfo>,
}

impl EffectInfo {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter to this effect
    pub fn with_param(mut self, param: ParamInfo) -> Self {
        self.params.push(param);
        self
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

/// The core effect trait - implemented by all audio effects
///
/// Effects process stereo buffers in-place. All parameters are normalized
/// (0.0-1.0) for easy mapping to hardware knobs.
pub trait Effect: Send {
    /// Process a stereo buffer in-place
    fn process(&mut self, buffer: &mut StereoBuffer);

    /// Get information about this effect (name, category, parameters)
    fn info(&self) -> &EffectInfo;

    /// Get the current parameter values
    fn get_params(&self) -> &[ParamValue];

    /// Set a parameter by index (normalized value 0.0-1.0)
    fn set_param(&mut self, index: usize, value: f32);

    /// Set the bypass state
    fn set_bypass(&mut self, bypass: bool);

    /// Check if the effect is bypassed
    fn is_bypassed(&self) -> bool;

    /// Reset the effect state (called on track load, preset switch, etc.)
    fn reset(&mut self);

    /// Tell the effect the current track tempo for beat-synced parameters
    ///
    /// Default implementation ignores it; only tempo-aware effects care.
    fn set_bpm(&mut self, _bpm: f64) {}
}

/// Base implementation helper for effects
///
/// Provides common functionality like bypass state and parameter storage.
#[derive(Debug, Clone)]
pub struct EffectBase {
    info: EffectInfo,
    params: Vec<ParamValue>,
    bypassed: bool,
}

impl EffectBase {
    /// Create a new effect base from effect info
    pub fn new(info: EffectInfo) -> Self {
        let params: Vec<ParamValue> = info
            .params
            .iter()
            .map(|p| ParamValue::from_normalized(p.default, p))
            .collect();
        Self {
            info,
            params,
            bypassed: false,
        }
    }

    pub fn info(&self) -> &EffectInfo {
        &self.info
    }

    pub fn get_params(&self) -> &[ParamValue] {
        &self.params
    }

    /// Set a parameter value
    pub fn set_param(&mut self, index: usize, value: f32) {
        if index < self.params.len() {
            self.params[index] = ParamValue::from_normalized(value, &self.info.params[index]);
        }
    }

    /// Get a parameter's actual (denormalized) value
    pub fn param_actual(&self, index: usize) -> f32 {
        self.params.get(index).map(|p| p.actual).unwrap_or(0.0)
    }

    /// Get a parameter's normalized value
    pub fn param_normalized(&self, index: usize) -> f32 {
        self.params.get(index).map(|p| p.normalized).unwrap_or(0.0)
    }

    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypassed = bypass;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }
}

/// An ordered chain of effects processed in sequence
///
/// Each deck owns one chain; the wet/dry mix is applied across the whole
/// chain so a single knob can fade the entire preset in and out.
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
    /// 0.0 = fully dry, 1.0 = fully wet
    wet: f32,
    scratch: StereoBuffer,
}

impl EffectChain {
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
            wet: 1.0,
            scratch: StereoBuffer::default(),
        }
    }

    /// Append an effect to the end of the chain
    pub fn push(&mut self, effect: Box<dyn Effect>) {
        log::debug!("chain: added {}", effect.info().name);
        self.effects.push(effect);
    }

    /// Remove the effect at `index`, shifting later effects up
    pub fn remove(&mut self, index: usize) -> Option<Box<dyn Effect>> {
        if index < self.effects.len() {
            Some(self.effects.remove(index))
        } else {
            None
        }
    }

    /// Drop every effect
    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effect at `index`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Box<dyn Effect>> {
        self.effects.get_mut(index)
    }

    /// Names of the effects in chain order
    pub fn names(&self) -> Vec<String> {
        self.effects.iter().map(|e| e.info().name.clone()).collect()
    }

    /// Set the chain-wide wet/dry mix (clamped 0.0-1.0)
    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    pub fn wet(&self) -> f32 {
        self.wet
    }

    /// Propagate the track tempo to every effect in the chain
    pub fn set_bpm(&mut self, bpm: f64) {
        for effect in &mut self.effects {
            effect.set_bpm(bpm);
        }
    }

    /// Reset every effect's internal state
    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Run the buffer through every effect in order, then blend wet/dry
    pub fn process(&mut self, buffer: &mut StereoBuffer) {
        if self.effects.is_empty() || self.wet == 0.0 {
            return;
        }

        if self.scratch.len() != buffer.len() {
            self.scratch = StereoBuffer::silence(buffer.len());
        }
        self.scratch
            .as_mut_slice()
            .copy_from_slice(buffer.as_slice());

        for effect in &mut self.effects {
            effect.process(buffer);
        }

        if self.wet < 1.0 {
            let dry = 1.0 - self.wet;
            for (out, orig) in buffer.iter_mut().zip(self.scratch.iter()) {
                *out = *out * self.wet + *orig * dry;
            }
        }
    }
}

impl Default for EffectChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StereoSample;

    struct Doubler {
        base: EffectBase,
    }

    impl Doubler {
        fn new() -> Self {
            Self {
                base: EffectBase::new(EffectInfo::new("Doubler", "Test")),
            }
        }
    }

    impl Effect for Doubler {
        fn process(&mut self, buffer: &mut StereoBuffer) {
            if self.base.is_bypassed() {
                return;
            }
            buffer.scale(2.0);
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
        fn reset(&mut self) {}
    }

    #[test]
    fn test_param_value_mapping() {
        let info = ParamInfo::new("Test", 0.5).with_range(0.0, 100.0);

        let value = ParamValue::from_normalized(0.5, &info);
        assert_eq!(value.normalized, 0.5);
        assert_eq!(value.actual, 50.0);

        let value = ParamValue::from_normalized(2.0, &info);
        assert_eq!(value.normalized, 1.0);
        assert_eq!(value.actual, 100.0);
    }

    #[test]
    fn test_effect_base_defaults() {
        let info = EffectInfo::new("Test", "Test")
            .with_param(ParamInfo::new("P1", 0.5).with_range(0.0, 100.0))
            .with_param(ParamInfo::new("P2", 0.0).with_range(-1.0, 1.0));

        let mut base = EffectBase::new(info);
        assert_eq!(base.param_actual(0), 50.0);
        assert_eq!(base.param_actual(1), -1.0);

        base.set_param(1, 0.5);
        assert_eq!(base.param_actual(1), 0.0);
    }

    #[test]
    fn test_chain_processes_in_order() {
        let mut chain = EffectChain::new();
        chain.push(Box::new(Doubler::new()));
        chain.push(Box::new(Doubler::new()));

        let mut buffer = StereoBuffer::from_vec(vec![StereoSample::mono(1.0); 4]);
        chain.process(&mut buffer);
        assert_eq!(buffer[0].left, 4.0);
    }

    #[test]
    fn test_chain_wet_dry() {
        let mut chain = EffectChain::new();
        chain.push(Box::new(Doubler::new()));
        chain.set_wet(0.5);

        let mut buffer = StereoBuffer::from_vec(vec![StereoSample::mono(1.0); 4]);
        chain.process(&mut buffer);
        // 50% of doubled (2.0) + 50% of dry (1.0) = 1.5
        assert!((buffer[0].left - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_chain_fully_dry_is_passthrough() {
        let mut chain = EffectChain::new();
        chain.push(Box::new(Doubler::new()));
        chain.set_wet(0.0);

        let mut buffer = StereoBuffer::from_vec(vec![StereoSample::mono(1.0); 4]);
        chain.process(&mut buffer);
        assert_eq!(buffer[0].left, 1.0);
    }

    #[test]
    fn test_chain_remove_and_names() {
        let mut chain = EffectChain::new();
        chain.push(Box::new(Doubler::new()));
        chain.push(Box::new(Doubler::new()));
        assert_eq!(chain.len(), 2);

        chain.remove(0);
        assert_eq!(chain.names(), vec!["Doubler"]);
        assert!(chain.remove(5).is_none());
    }
}
