//! Sidechain ducking
//!
//! Pulls a target bus down whenever a key signal (microphone, other deck)
//! is hot. The key level is measured as normalized RMS; once it crosses
//! the threshold the target glides to the configured duck factor, with
//! separate attack and release time constants so the duck breathes
//! instead of pumping.

use serde::{Deserialize, Serialize};

use crate::types::{StereoBuffer, SAMPLE_RATE};

/// Ducker tuning
///
/// All level fields are normalized: `threshold` is the key RMS above
/// which ducking engages, `ratio` is the gain factor the target is
/// pulled down to (0.3 = duck to 30%), `knee` is the level width of the
/// soft transition centered on the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SidechainConfig {
    pub enabled: bool,
    /// Key level (0.0-1.0) above which ducking starts
    pub threshold: f32,
    /// Gain factor (0.0-1.0) the target ducks to
    pub ratio: f32,
    /// Soft knee width in normalized level, centered on the threshold
    pub knee: f32,
    /// Seconds to reach the duck when the key gets hot
    pub attack: f32,
    /// Seconds to recover once the key goes quiet
    pub release: f32,
}

impl Default for SidechainConfig {
    fn default() -> Self {
        Self::moderate()
    }
}

impl SidechainConfig {
    /// Gentle duck for background music under occasional speech
    pub fn subtle() -> Self {
        Self {
            enabled: true,
            threshold: 0.10,
            ratio: 0.6,
            knee: 0.05,
            attack: 0.015,
            release: 0.2,
        }
    }

    /// The all-round default: duck to 30%
    pub fn moderate() -> Self {
        Self {
            enabled: true,
            threshold: 0.05,
            ratio: 0.3,
            knee: 0.04,
            attack: 0.010,
            release: 0.3,
        }
    }

    /// Hard pump for talk-over segments
    pub fn aggressive() -> Self {
        Self {
            enabled: true,
            threshold: 0.04,
            ratio: 0.15,
            knee: 0.02,
            attack: 0.005,
            release: 0.5,
        }
    }

    /// Broadcast-style voice-over duck: deep and slow to recover
    pub fn radio() -> Self {
        Self {
            enabled: true,
            threshold: 0.03,
            ratio: 0.1,
            knee: 0.02,
            attack: 0.005,
            release: 0.7,
        }
    }

    /// Clamp all normalized fields into range
    pub fn validate(&mut self) {
        self.threshold = self.threshold.clamp(0.0, 1.0);
        self.ratio = self.ratio.clamp(0.0, 1.0);
        self.knee = self.knee.clamp(0.0, 1.0);
        self.attack = self.attack.max(0.0);
        self.release = self.release.max(0.0);
    }
}

/// Key-driven gain reduction for one target bus
pub struct SidechainDucker {
    config: SidechainConfig,
    /// Smoothed linear gain currently applied
    gain: f32,
}

impl SidechainDucker {
    pub fn new(mut config: SidechainConfig) -> Self {
        config.validate();
        Self { config, gain: 1.0 }
    }

    pub fn config(&self) -> &SidechainConfig {
        &self.config
    }

    /// Swap the tuning; disabling snaps the gain back to unity
    pub fn set_config(&mut self, mut config: SidechainConfig) {
        config.validate();
        if !config.enabled && self.config.enabled {
            log::debug!("sidechain disabled, restoring unity gain");
            self.gain = 1.0;
        }
        self.config = config;
    }

    /// Linear gain currently applied to the target
    pub fn current_gain(&self) -> f32 {
        self.gain
    }

    /// Whether the duck is audibly engaged
    pub fn is_ducking(&self) -> bool {
        self.config.enabled && self.gain < 0.99
    }

    /// Gain called for by a key level, before smoothing
    ///
    /// Unity below the knee, the configured duck factor above it, and a
    /// smoothstep blend between the two inside the knee.
    fn target_gain_for(&self, key_level: f32) -> f32 {
        let half_knee = self.config.knee * 0.5;
        let lower = self.config.threshold - half_knee;

        if key_level <= lower {
            return 1.0;
        }
        if key_level >= lower + self.config.knee.max(1e-6) {
            return self.config.ratio;
        }
        let t = (key_level - lower) / self.config.knee.max(1e-6);
        let smooth = t * t * (3.0 - 2.0 * t);
        1.0 + (self.config.ratio - 1.0) * smooth
    }

    /// Duck `target` by the level of `key`
    ///
    /// Both buffers must be the same length. The gain moves toward its
    /// target with the attack constant while ducking deeper and the
    /// release constant while recovering.
    pub fn process(&mut self, key: &StereoBuffer, target: &mut StereoBuffer) {
        if !self.config.enabled {
            return;
        }
        debug_assert_eq!(key.len(), target.len());

        // Block-level key measurement keeps the envelope cheap; the
        // per-sample gain glide supplies the smoothness
        let target_gain = self.target_gain_for(key.rms());

        let dt = 1.0 / SAMPLE_RATE as f32;
        let attack_coeff = 1.0 - (-dt / self.config.attack.max(1e-4)).exp();
        let release_coeff = 1.0 - (-dt / self.config.release.max(1e-4)).exp();

        for sample in target.iter_mut() {
            let coeff = if target_gain < self.gain {
                attack_coeff
            } else {
                release_coeff
            };
            self.gain += coeff * (target_gain - self.gain);
            *sample *= self.gain;
        }
    }

    /// Snap back to unity gain
    pub fn reset(&mut self) {
        self.gain = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StereoSample;

    fn loud_key(len: usize) -> StereoBuffer {
        StereoBuffer::from_vec(vec![StereoSample::mono(0.5); len])
    }

    fn quiet_key(len: usize) -> StereoBuffer {
        StereoBuffer::silence(len)
    }

    fn unity_target(len: usize) -> StereoBuffer {
        StereoBuffer::from_vec(vec![StereoSample::mono(1.0); len])
    }

    #[test]
    fn test_loud_key_ducks_to_ratio() {
        let mut ducker = SidechainDucker::new(SidechainConfig::moderate());
        let key = loud_key(4800); // 100ms, well past the 10ms attack
        let mut target = unity_target(4800);
        ducker.process(&key, &mut target);

        assert!(ducker.is_ducking());
        // Key RMS 0.5 is far above the knee: gain settles at the 0.3 factor
        assert!(
            (ducker.current_gain() - 0.3).abs() < 0.01,
            "gain {} should sit at the duck factor",
            ducker.current_gain()
        );
    }

    #[test]
    fn test_duck_depth_is_fixed_not_level_scaled() {
        // Any key level past the knee ducks to the same factor
        let mut soft = SidechainDucker::new(SidechainConfig::moderate());
        let mut loud = SidechainDucker::new(SidechainConfig::moderate());

        let key_soft = StereoBuffer::from_vec(vec![StereoSample::mono(0.15); 9600]);
        let key_loud = StereoBuffer::from_vec(vec![StereoSample::mono(0.9); 9600]);
        let mut a = unity_target(9600);
        let mut b = unity_target(9600);
        soft.process(&key_soft, &mut a);
        loud.process(&key_loud, &mut b);

        assert!((soft.current_gain() - loud.current_gain()).abs() < 1e-3);
        assert!((soft.current_gain() - 0.3).abs() < 0.01);
    }

    #[test]
    fn test_quiet_key_leaves_target_alone() {
        let mut ducker = SidechainDucker::new(SidechainConfig::moderate());
        let key = quiet_key(1024);
        let mut target = unity_target(1024);
        ducker.process(&key, &mut target);

        assert!(!ducker.is_ducking());
        assert!((target[1023].left - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_attack_takes_time() {
        let mut ducker = SidechainDucker::new(SidechainConfig::moderate());
        // 5ms of loud key: with a 10ms attack the gain is partway down
        let key = loud_key(240);
        let mut target = unity_target(240);
        ducker.process(&key, &mut target);

        let gain = ducker.current_gain();
        assert!(gain < 0.9, "should have started ducking: {gain}");
        assert!(gain > 0.4, "should not have fully ducked yet: {gain}");
    }

    #[test]
    fn test_release_honors_duration() {
        let mut ducker = SidechainDucker::new(SidechainConfig::moderate());
        let key = loud_key(9600);
        let mut target = unity_target(9600);
        ducker.process(&key, &mut target);
        let ducked = ducker.current_gain();

        // 50ms of silence against a 300ms release: partial recovery only
        let key = quiet_key(2400);
        let mut target = unity_target(2400);
        ducker.process(&key, &mut target);
        let recovering = ducker.current_gain();
        assert!(recovering > ducked, "gain should rise during release");
        assert!(recovering < 0.9, "300ms release cannot finish in 50ms");

        // After 2 seconds it is back to unity
        let key = quiet_key(96000);
        let mut target = unity_target(96000);
        ducker.process(&key, &mut target);
        assert!(ducker.current_gain() > 0.99);
        assert!(!ducker.is_ducking());
    }

    #[test]
    fn test_disable_restores_unity() {
        let mut ducker = SidechainDucker::new(SidechainConfig::aggressive());
        let key = loud_key(4800);
        let mut target = unity_target(4800);
        ducker.process(&key, &mut target);
        assert!(ducker.is_ducking());

        let mut config = *ducker.config();
        config.enabled = false;
        ducker.set_config(config);
        assert!(!ducker.is_ducking());

        let key = loud_key(1024);
        let mut target = unity_target(1024);
        ducker.process(&key, &mut target);
        assert!((target[0].left - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_knee_softens_threshold_edge() {
        let ducker = SidechainDucker::new(SidechainConfig::moderate());
        // threshold 0.05, knee 0.04: unity below 0.03, ratio above 0.07
        assert_eq!(ducker.target_gain_for(0.02), 1.0);
        assert_eq!(ducker.target_gain_for(0.2), 0.3);
        // Dead center of the knee sits halfway between unity and ratio
        let mid = ducker.target_gain_for(0.05);
        assert!((mid - 0.65).abs() < 1e-4);
        // Monotonic through the knee
        assert!(ducker.target_gain_for(0.04) > mid);
        assert!(ducker.target_gain_for(0.06) < mid);
    }

    #[test]
    fn test_config_validation_clamps() {
        let ducker = SidechainDucker::new(SidechainConfig {
            enabled: true,
            threshold: 1.5,
            ratio: -0.2,
            knee: 2.0,
            attack: -1.0,
            release: 0.3,
        });
        let config = ducker.config();
        assert_eq!(config.threshold, 1.0);
        assert_eq!(config.ratio, 0.0);
        assert_eq!(config.knee, 1.0);
        assert_eq!(config.attack, 0.0);
    }
}
