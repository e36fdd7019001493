//! Tempo-synced stereo echo

use crate::effect::{Effect, EffectBase, EffectInfo, ParamInfo, ParamValue};
use crate::types::{StereoBuffer, StereoSample, SAMPLE_RATE};

/// Maximum delay time in seconds (2 beats at 30 BPM)
const MAX_DELAY_SECONDS: f32 = 4.0;
const MAX_DELAY_SAMPLES: usize = (SAMPLE_RATE as f32 * MAX_DELAY_SECONDS) as usize;

/// Circular stereo delay line
struct DelayLine {
    buffer: Vec<StereoSample>,
    write_pos: usize,
    delay_samples: usize,
}

impl DelayLine {
    fn new() -> Self {
        Self {
            buffer: vec![StereoSample::silence(); MAX_DELAY_SAMPLES],
            write_pos: 0,
            delay_samples: SAMPLE_RATE as usize / 2,
        }
    }

    fn set_delay_samples(&mut self, samples: usize) {
        self.delay_samples = samples.clamp(1, MAX_DELAY_SAMPLES - 1);
    }

    #[inline]
    fn read(&self) -> StereoSample {
        let read_pos = (self.write_pos + MAX_DELAY_SAMPLES - self.delay_samples) % MAX_DELAY_SAMPLES;
        self.buffer[read_pos]
    }

    #[inline]
    fn write(&mut self, sample: StereoSample) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % MAX_DELAY_SAMPLES;
    }

    fn reset(&mut self) {
        self.buffer.fill(StereoSample::silence());
        self.write_pos = 0;
    }
}

/// Beat-locked stereo echo
///
/// Parameters:
/// - Time: delay time in beats (1/8 to 2)
/// - Feedback: amount fed back into the line (0-95%)
/// - Mix: dry/wet balance
/// - Ping-Pong: swap L/R in the feedback path
///
/// The delay time follows the deck tempo via [`Effect::set_bpm`].
pub struct EchoEffect {
    base: EffectBase,
    line: DelayLine,
    bpm: f64,
}

impl EchoEffect {
    pub fn new() -> Self {
        let info = EffectInfo::new("Echo", "Delay")
            .with_param(
                ParamInfo::new("Time", 0.2) // 0.125 + 0.2*1.875 = 1/2 beat
                    .with_range(0.125, 2.0)
                    .with_unit("beats"),
            )
            .with_param(ParamInfo::new("Feedback", 0.4).with_range(0.0, 0.95))
            .with_param(ParamInfo::new("Mix", 0.35))
            .with_param(ParamInfo::new("Ping-Pong", 0.0));

        let mut effect = Self {
            base: EffectBase::new(info),
            line: DelayLine::new(),
            bpm: 120.0,
        };
        effect.update_delay_time();
        effect
    }

    fn time_beats(&self) -> f32 {
        self.base.param_actual(0)
    }

    fn feedback(&self) -> f32 {
        self.base.param_actual(1)
    }

    fn mix(&self) -> f32 {
        self.base.param_actual(2)
    }

    fn ping_pong(&self) -> bool {
        self.base.param_actual(3) > 0.5
    }

    fn update_delay_time(&mut self) {
        let seconds = self.time_beats() * 60.0 / self.bpm as f32;
        let samples = (seconds * SAMPLE_RATE as f32) as usize;
        self.line.set_delay_samples(samples);
    }
}

impl Default for EchoEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for EchoEffect {
    fn process(&mut self, buffer: &mut StereoBuffer) {
        if self.base.is_bypassed() {
            return;
        }

        let feedback = self.feedback();
        let mix = self.mix();
        let dry = 1.0 - mix;
        let ping_pong = self.ping_pong();

        for sample in buffer.iter_mut() {
            let delayed = self.line.read();

            let fed = if ping_pong {
                StereoSample::new(delayed.right * feedback, delayed.left * feedback)
            } else {
                delayed * feedback
            };
            self.line.write(*sample + fed);

            *sample = *sample * dry + delayed * mix;
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
        if index == 0 {
            self.update_delay_time();
        }
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.base.set_bypass(bypass);
    }

    fn is_bypassed(&self) -> bool {
        self.base.is_bypassed()
    }

    fn reset(&mut self) {
        self.line.reset();
    }

    fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm.clamp(30.0, 300.0);
        self.update_delay_time();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_dry_is_passthrough() {
        let mut effect = EchoEffect::new();
        effect.set_param(2, 0.0); // full dry

        let mut buffer = StereoBuffer::silence(64);
        buffer.as_mut_slice()[0] = StereoSample::mono(1.0);
        effect.process(&mut buffer);

        assert!((buffer[0].left - 1.0).abs() < 1e-6);
        assert!(buffer[32].left.abs() < 1e-6);
    }

    #[test]
    fn test_echo_follows_tempo() {
        let mut effect = EchoEffect::new();
        effect.set_bpm(120.0);
        effect.set_param(0, 0.2); // 1/2 beat = 250ms at 120 BPM
        effect.set_param(1, 0.0); // no feedback
        effect.set_param(2, 1.0); // full wet

        let delay_samples = (0.25 * SAMPLE_RATE as f32) as usize;
        let mut buffer = StereoBuffer::silence(delay_samples + 64);
        buffer.as_mut_slice()[0] = StereoSample::mono(1.0);
        effect.process(&mut buffer);

        // Impulse reappears exactly one half-beat later
        assert!(buffer[delay_samples].left.abs() > 0.9);
        assert!(buffer[delay_samples - 100].left.abs() < 1e-6);
    }

    #[test]
    fn test_echo_feedback_repeats() {
        let mut effect = EchoEffect::new();
        effect.set_bpm(240.0);
        effect.set_param(0, 0.0); // 1/8 beat = 31.25ms at 240 BPM
        effect.set_param(1, 0.5);
        effect.set_param(2, 1.0);

        let delay_samples = (0.03125 * SAMPLE_RATE as f32) as usize;
        let mut buffer = StereoBuffer::silence(delay_samples * 3 + 64);
        buffer.as_mut_slice()[0] = StereoSample::mono(1.0);
        effect.process(&mut buffer);

        // Second echo exists and is quieter than the first
        let first = buffer[delay_samples].left.abs();
        let second = buffer[delay_samples * 2].left.abs();
        assert!(first > 0.9);
        assert!(second > 0.1 && second < first);
    }

    #[test]
    fn test_ping_pong_swaps_channels() {
        let mut effect = EchoEffect::new();
        effect.set_bpm(120.0);
        effect.set_param(0, 0.2);
        effect.set_param(1, 0.9);
        effect.set_param(2, 1.0);
        effect.set_param(3, 1.0); // ping-pong on

        let delay_samples = (0.25 * SAMPLE_RATE as f32) as usize;
        let mut buffer = StereoBuffer::silence(delay_samples * 2 + 64);
        // Left-only impulse
        buffer.as_mut_slice()[0] = StereoSample::new(1.0, 0.0);
        effect.process(&mut buffer);

        // Second repeat comes back on the right
        let second = buffer[delay_samples * 2];
        assert!(second.right.abs() > second.left.abs());
    }

    #[test]
    fn test_reset_clears_tail() {
        let mut effect = EchoEffect::new();
        effect.set_param(2, 1.0);

        let mut buffer = StereoBuffer::silence(4096);
        for s in buffer.iter_mut() {
            *s = StereoSample::mono(1.0);
        }
        effect.process(&mut buffer);
        effect.reset();

        let mut silent = StereoBuffer::silence(256);
        effect.process(&mut silent);
        assert!(silent.peak() < 1e-6);
    }
}
