//! Crossfader
//!
//! Blends the two decks. Supports the usual curve family plus timed
//! automated transitions driven by `tick`.

use serde::{Deserialize, Serialize};

/// Crossfader response curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossfaderCurve {
    /// Constant-power blend, equal loudness at center
    #[default]
    Smooth,
    /// Fast cut near the ends, for scratching
    Sharp,
    /// Straight linear gains
    Linear,
}

impl CrossfaderCurve {
    /// Deck gains for a fader position (0.0 = full A, 1.0 = full B)
    pub fn gains(&self, position: f64) -> (f32, f32) {
        let p = position.clamp(0.0, 1.0) as f32;
        match self {
            CrossfaderCurve::Smooth => {
                let angle = p * std::f32::consts::FRAC_PI_2;
                (angle.cos(), angle.sin())
            }
            CrossfaderCurve::Sharp => {
                // Full volume except very near the opposite end
                let a = ((1.0 - p) * 10.0).min(1.0);
                let b = (p * 10.0).min(1.0);
                (a, b)
            }
            CrossfaderCurve::Linear => (1.0 - p, p),
        }
    }
}

/// Crossfader state with optional timed transition
#[derive(Debug)]
pub struct Crossfader {
    position: f64,
    curve: CrossfaderCurve,
    transition: Option<Transition>,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: f64,
    to: f64,
    duration: f64,
    elapsed: f64,
}

impl Crossfader {
    pub fn new() -> Self {
        Self {
            position: 0.5,
            curve: CrossfaderCurve::default(),
            transition: None,
        }
    }

    /// Current fader position (0.0 = full A, 1.0 = full B)
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Move the fader by hand; cancels any running transition
    pub fn set_position(&mut self, position: f64) {
        self.position = position.clamp(0.0, 1.0);
        self.transition = None;
    }

    pub fn curve(&self) -> CrossfaderCurve {
        self.curve
    }

    pub fn set_curve(&mut self, curve: CrossfaderCurve) {
        self.curve = curve;
    }

    /// Gains for both decks at the current position
    pub fn gains(&self) -> (f32, f32) {
        self.curve.gains(self.position)
    }

    /// Start an automated fade to `target` over `duration` seconds
    ///
    /// A non-positive duration jumps immediately.
    pub fn start_transition(&mut self, target: f64, duration: f64) {
        let target = target.clamp(0.0, 1.0);
        if duration <= 0.0 {
            self.position = target;
            self.transition = None;
            return;
        }
        log::debug!("crossfade {:.2} -> {target:.2} over {duration}s", self.position);
        self.transition = Some(Transition {
            from: self.position,
            to: target,
            duration,
            elapsed: 0.0,
        });
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Advance an automated transition by `dt` seconds
    pub fn tick(&mut self, dt: f64) {
        let Some(mut t) = self.transition else {
            return;
        };
        t.elapsed = (t.elapsed + dt).min(t.duration);

        // Smoothstep easing so the fade starts and lands gently
        let x = t.elapsed / t.duration;
        let eased = x * x * (3.0 - 2.0 * x);
        self.position = t.from + (t.to - t.from) * eased;

        if t.elapsed >= t.duration {
            self.position = t.to;
            self.transition = None;
        } else {
            self.transition = Some(t);
        }
    }
}

impl Default for Crossfader {
    fn default() -> Self {
        Self::new()
    }
}
