//! Mixer - combines deck outputs with EQ, faders, crossfader and cue bus
//!
//! Two channel strips feed the master bus through the crossfader; any
//! strip can also be routed pre-fader to the headphone bus, where the
//! cue/master blend and split-cue live.

mod crossfader;

pub use crossfader::{Crossfader, CrossfaderCurve};

use crate::effect::native::{BiquadCoeffs, BiquadState};
use crate::types::{StereoBuffer, StereoSample, NUM_DECKS, SAMPLE_RATE};

/// EQ band centers
const EQ_LO_FREQ: f32 = 100.0;
const EQ_MID_FREQ: f32 = 1000.0;
const EQ_HI_FREQ: f32 = 10000.0;
const EQ_MID_Q: f32 = 0.7;

/// Gain applied by a band kill
const KILL_DB: f32 = -60.0;

/// EQ bands addressable on a channel strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqBand {
    Low,
    Mid,
    High,
}

/// Channel strip state for a single deck
#[derive(Debug, Clone)]
pub struct ChannelStrip {
    /// Trim/gain (stored as linear multiplier)
    pub trim: f32,
    /// EQ knobs (0.0 = full cut, 0.5 = flat, 1.0 = +6dB)
    pub eq_lo: f32,
    pub eq_mid: f32,
    pub eq_hi: f32,
    /// Band kill switches, override the knobs
    pub kill_lo: bool,
    pub kill_mid: bool,
    pub kill_hi: bool,
    /// Volume fader (0.0 to 1.0)
    pub volume: f32,
    /// Routes this channel pre-fader to the headphone bus
    pub cue_enabled: bool,

    eq_lo_state: BiquadState,
    eq_mid_state: BiquadState,
    eq_hi_state: BiquadState,
    eq_lo_coeffs: BiquadCoeffs,
    eq_mid_coeffs: BiquadCoeffs,
    eq_hi_coeffs: BiquadCoeffs,
    eq_dirty: bool,
}

impl Default for ChannelStrip {
    fn default() -> Self {
        Self {
            trim: 1.0,
            eq_lo: 0.5,
            eq_mid: 0.5,
            eq_hi: 0.5,
            kill_lo: false,
            kill_mid: false,
            kill_hi: false,
            volume: 1.0,
            cue_enabled: false,
            eq_lo_state: BiquadState::default(),
            eq_mid_state: BiquadState::default(),
            eq_hi_state: BiquadState::default(),
            eq_lo_coeffs: BiquadCoeffs::passthrough(),
            eq_mid_coeffs: BiquadCoeffs::passthrough(),
            eq_hi_coeffs: BiquadCoeffs::passthrough(),
            eq_dirty: true,
        }
    }
}

impl ChannelStrip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set trim in dB (-24 to +12)
    pub fn set_trim_db(&mut self, db: f32) {
        let db = db.clamp(-24.0, 12.0);
        self.trim = 10.0_f32.powf(db / 20.0);
    }

    pub fn trim_db(&self) -> f32 {
        20.0 * self.trim.log10()
    }

    /// Set an EQ knob (0.0 = full cut, 0.5 = flat, 1.0 = +6dB)
    pub fn set_eq(&mut self, band: EqBand, value: f32) {
        let value = value.clamp(0.0, 1.0);
        match band {
            EqBand::Low => self.eq_lo = value,
            EqBand::Mid => self.eq_mid = value,
            EqBand::High => self.eq_hi = value,
        }
        self.eq_dirty = true;
    }

    /// Toggle a band kill; the knob position is untouched underneath
    pub fn set_kill(&mut self, band: EqBand, kill: bool) {
        match band {
            EqBand::Low => self.kill_lo = kill,
            EqBand::Mid => self.kill_mid = kill,
            EqBand::High => self.kill_hi = kill,
        }
        self.eq_dirty = true;
    }

    /// Convert EQ knob position (0-1) to dB gain
    /// 0.0 = -60dB (near-kill), 0.5 = 0dB, 1.0 = +6dB
    fn eq_to_db(value: f32) -> f32 {
        if value < 0.01 {
            KILL_DB
        } else if value < 0.5 {
            let t = (value - 0.01) / 0.49;
            KILL_DB * (1.0 - t)
        } else {
            (value - 0.5) * 12.0
        }
    }

    fn update_eq_coeffs(&mut self) {
        if !self.eq_dirty {
            return;
        }

        let sr = SAMPLE_RATE as f32;
        let lo_db = if self.kill_lo { KILL_DB } else { Self::eq_to_db(self.eq_lo) };
        let mid_db = if self.kill_mid { KILL_DB } else { Self::eq_to_db(self.eq_mid) };
        let hi_db = if self.kill_hi { KILL_DB } else { Self::eq_to_db(self.eq_hi) };

        self.eq_lo_coeffs = if lo_db.abs() > 0.1 {
            BiquadCoeffs::low_shelf(EQ_LO_FREQ, lo_db, sr)
        } else {
            BiquadCoeffs::passthrough()
        };
        self.eq_mid_coeffs = if mid_db.abs() > 0.1 {
            BiquadCoeffs::peaking(EQ_MID_FREQ, mid_db, EQ_MID_Q, sr)
        } else {
            BiquadCoeffs::passthrough()
        };
        self.eq_hi_coeffs = if hi_db.abs() > 0.1 {
            BiquadCoeffs::high_shelf(EQ_HI_FREQ, hi_db, sr)
        } else {
            BiquadCoeffs::passthrough()
        };

        self.eq_dirty = false;
    }

    /// Process audio through the strip (trim + 3-band EQ)
    pub fn process(&mut self, buffer: &mut StereoBuffer) {
        self.update_eq_coeffs();

        for sample in buffer.iter_mut() {
            let mut left = sample.left * self.trim;
            let mut right = sample.right * self.trim;

            (left, right) = self.eq_lo_state.process(left, right, &self.eq_lo_coeffs);
            (left, right) = self.eq_mid_state.process(left, right, &self.eq_mid_coeffs);
            (left, right) = self.eq_hi_state.process(left, right, &self.eq_hi_coeffs);

            *sample = StereoSample::new(left, right);
        }
    }

    /// Reset all EQ filter states
    pub fn reset(&mut self) {
        self.eq_lo_state.reset();
        self.eq_mid_state.reset();
        self.eq_hi_state.reset();
    }
}

/// Headphone routing settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadphoneCue {
    /// Headphone output level (0.0 to 1.0)
    pub volume: f32,
    /// Cue/master blend (0.0 = cue only, 1.0 = master only)
    pub mix: f32,
    /// Split cue: cue bus mono in the left ear, master mono in the right
    pub split: bool,
}

impl Default for HeadphoneCue {
    fn default() -> Self {
        Self {
            volume: 0.8,
            mix: 0.0,
            split: false,
        }
    }
}

/// Main mixer combining both deck outputs
pub struct Mixer {
    channels: [ChannelStrip; NUM_DECKS],
    crossfader: Crossfader,
    /// Master volume (0.0 to 1.0)
    master_volume: f32,
    headphone: HeadphoneCue,
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|_| ChannelStrip::new()),
            crossfader: Crossfader::new(),
            master_volume: 1.0,
            headphone: HeadphoneCue::default(),
        }
    }

    pub fn channel(&self, deck: usize) -> Option<&ChannelStrip> {
        self.channels.get(deck)
    }

    pub fn channel_mut(&mut self, deck: usize) -> Option<&mut ChannelStrip> {
        self.channels.get_mut(deck)
    }

    pub fn crossfader(&self) -> &Crossfader {
        &self.crossfader
    }

    pub fn crossfader_mut(&mut self) -> &mut Crossfader {
        &mut self.crossfader
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn headphone(&self) -> &HeadphoneCue {
        &self.headphone
    }

    pub fn headphone_mut(&mut self) -> &mut HeadphoneCue {
        &mut self.headphone
    }

    /// Process deck outputs into master + headphone buses
    ///
    /// Deck buffers are processed in-place through their channel strips,
    /// then summed to master through volume faders and crossfader gains.
    /// Cue-enabled channels are tapped pre-fader into the headphone bus.
    pub fn process(
        &mut self,
        deck_buffers: &mut [StereoBuffer; NUM_DECKS],
        master_out: &mut StereoBuffer,
        headphone_out: &mut StereoBuffer,
    ) {
        let buffer_len = master_out.len();
        master_out.fill_silence();
        headphone_out.fill_silence();

        for (channel, buffer) in self.channels.iter_mut().zip(deck_buffers.iter_mut()) {
            channel.process(buffer);
        }

        let (gain_a, gain_b) = self.crossfader.gains();
        let xf_gains = [gain_a, gain_b];

        for (deck_idx, buffer) in deck_buffers.iter().enumerate() {
            let channel = &self.channels[deck_idx];
            let master_gain = channel.volume * xf_gains[deck_idx];

            for i in 0..buffer_len.min(buffer.len()) {
                let sample = buffer[i];
                master_out.as_mut_slice()[i] += sample * master_gain;
                if channel.cue_enabled {
                    // Pre-fader, pre-crossfader tap
                    headphone_out.as_mut_slice()[i] += sample;
                }
            }
        }

        master_out.scale(self.master_volume);

        // Compose the headphone output from cue and master buses
        let hp = self.headphone;
        for i in 0..buffer_len {
            let master = master_out[i];
            let cue = headphone_out[i];

            let out = if hp.split {
                // Cue mono left, master mono right
                StereoSample::new(cue.to_mono(), master.to_mono())
            } else {
                StereoSample::new(
                    cue.left * (1.0 - hp.mix) + master.left * hp.mix,
                    cue.right * (1.0 - hp.mix) + master.right * hp.mix,
                )
            };
            headphone_out.as_mut_slice()[i] = out * hp.volume;
        }
    }

    /// Reset all channel strip filter states
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck_buffers(a: f32, b: f32, len: usize) -> [StereoBuffer; NUM_DECKS] {
        [
            StereoBuffer::from_vec(vec![StereoSample::mono(a); len]),
            StereoBuffer::from_vec(vec![StereoSample::mono(b); len]),
        ]
    }

    #[test]
    fn test_trim_db_conversion() {
        let mut strip = ChannelStrip::new();
        strip.set_trim_db(0.0);
        assert!((strip.trim - 1.0).abs() < 0.001);
        strip.set_trim_db(6.0);
        assert!((strip.trim - 2.0).abs() < 0.01);
        strip.set_trim_db(-6.0);
        assert!((strip.trim - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_low_kill_removes_bass() {
        let mut strip = ChannelStrip::new();
        strip.set_kill(EqBand::Low, true);

        // 50Hz tone, well inside the low shelf
        let mut buffer = StereoBuffer::silence(SAMPLE_RATE as usize / 4);
        for (i, s) in buffer.iter_mut().enumerate() {
            let t = i as f32 / SAMPLE_RATE as f32;
            *s = StereoSample::mono((2.0 * std::f32::consts::PI * 50.0 * t).sin());
        }
        strip.process(&mut buffer);

        let tail_rms: f32 = {
            let n = 4096;
            let start = buffer.len() - n;
            let sum: f32 = buffer.iter().skip(start).map(|s| s.left * s.left).sum();
            (sum / n as f32).sqrt()
        };
        assert!(tail_rms < 0.1, "killed bass should be gone: {tail_rms}");
    }

    #[test]
    fn test_kill_release_restores_knob() {
        let mut strip = ChannelStrip::new();
        strip.set_kill(EqBand::Mid, true);
        strip.set_kill(EqBand::Mid, false);
        // Knob still at flat: strip should be transparent again
        let mut buffer = StereoBuffer::from_vec(vec![StereoSample::mono(0.5); 64]);
        strip.process(&mut buffer);
        assert!((buffer[32].left - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_crossfader_full_a_mutes_b() {
        let mut mixer = Mixer::new();
        mixer.crossfader_mut().set_position(0.0);

        let mut decks = deck_buffers(0.0, 1.0, 64);
        let mut master = StereoBuffer::silence(64);
        let mut phones = StereoBuffer::silence(64);
        mixer.process(&mut decks, &mut master, &mut phones);

        assert!(master.peak() < 1e-6, "deck B should be silent at full A");
    }

    #[test]
    fn test_center_smooth_sums_both() {
        let mut mixer = Mixer::new();
        mixer.crossfader_mut().set_position(0.5);

        let mut decks = deck_buffers(0.5, 0.5, 64);
        let mut master = StereoBuffer::silence(64);
        let mut phones = StereoBuffer::silence(64);
        mixer.process(&mut decks, &mut master, &mut phones);

        // Both at cos(45) = 0.707 gain: 0.5*0.707*2 = 0.707
        assert!((master[32].left - 0.707).abs() < 0.01);
    }

    #[test]
    fn test_cue_is_pre_fader() {
        let mut mixer = Mixer::new();
        mixer.crossfader_mut().set_position(1.0); // deck A silent on master
        mixer.channel_mut(0).unwrap().volume = 0.0; // fader down too
        mixer.channel_mut(0).unwrap().cue_enabled = true;
        mixer.headphone_mut().volume = 1.0;

        let mut decks = deck_buffers(0.8, 0.0, 64);
        let mut master = StereoBuffer::silence(64);
        let mut phones = StereoBuffer::silence(64);
        mixer.process(&mut decks, &mut master, &mut phones);

        assert!(master.peak() < 1e-6);
        assert!((phones[32].left - 0.8).abs() < 0.01, "cue taps pre-fader");
    }

    #[test]
    fn test_split_cue_routing() {
        let mut mixer = Mixer::new();
        mixer.crossfader_mut().set_position(1.0); // master carries deck B
        mixer.channel_mut(0).unwrap().cue_enabled = true;
        mixer.headphone_mut().split = true;
        mixer.headphone_mut().volume = 1.0;

        let mut decks = deck_buffers(0.4, 0.6, 64);
        let mut master = StereoBuffer::silence(64);
        let mut phones = StereoBuffer::silence(64);
        mixer.process(&mut decks, &mut master, &mut phones);

        // Left ear: cued deck A; right ear: master (deck B)
        assert!((phones[32].left - 0.4).abs() < 0.01);
        assert!((phones[32].right - 0.6).abs() < 0.01);
    }

    #[test]
    fn test_cue_master_blend() {
        let mut mixer = Mixer::new();
        mixer.crossfader_mut().set_position(1.0);
        mixer.headphone_mut().mix = 1.0; // master only
        mixer.headphone_mut().volume = 1.0;

        let mut decks = deck_buffers(0.0, 0.5, 64);
        let mut master = StereoBuffer::silence(64);
        let mut phones = StereoBuffer::silence(64);
        mixer.process(&mut decks, &mut master, &mut phones);

        // No cue enabled; headphones follow the master
        assert!((phones[32].left - master[32].left).abs() < 1e-6);
    }
}
