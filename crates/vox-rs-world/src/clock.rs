//! Frame-delta to simulation-step conversion.

use crate::physics::MAX_STEP_SECONDS;

/// Longest frame delta a fixed-step clock will try to catch up on.
pub const MAX_FRAME_SECONDS: f32 = 0.25;

/// How frame time becomes simulation steps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Timestep {
    /// One step per frame, clamped to [`MAX_STEP_SECONDS`].
    #[default]
    Variable,
    /// Whole steps of exactly `step` seconds; leftovers carry to the next frame.
    Fixed { step: f32 },
}

/// Turns frame deltas into a sequence of step durations.
#[derive(Debug, Clone)]
pub struct StepClock {
    timestep: Timestep,
    accumulator: f32,
}

impl StepClock {
    pub fn new(timestep: Timestep) -> Self {
        let timestep = match timestep {
            Timestep::Fixed { step } if !(step.is_finite() && step > 0.0) => Timestep::Variable,
            Timestep::Fixed { step } => Timestep::Fixed {
                step: step.min(MAX_STEP_SECONDS),
            },
            Timestep::Variable => Timestep::Variable,
        };
        Self {
            timestep,
            accumulator: 0.0,
        }
    }

    pub fn timestep(&self) -> Timestep {
        self.timestep
    }

    /// Time banked towards the next fixed step.
    pub fn pending(&self) -> f32 {
        self.accumulator
    }

    /// Step durations to simulate for a frame that took `frame_dt` seconds.
    pub fn advance(&mut self, frame_dt: f32) -> Steps {
        let frame_dt = if frame_dt.is_finite() {
            frame_dt.max(0.0)
        } else {
            0.0
        };
        match self.timestep {
            Timestep::Variable => Steps {
                step: frame_dt.min(MAX_STEP_SECONDS),
                remaining: 1,
            },
            Timestep::Fixed { step } => {
                self.accumulator += frame_dt.min(MAX_FRAME_SECONDS);
                let count = (self.accumulator / step).floor() as u32;
                self.accumulator -= count as f32 * step;
                if self.accumulator < 0.0 {
                    self.accumulator = 0.0;
                }
                Steps {
                    step,
                    remaining: count,
                }
            }
        }
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new(Timestep::default())
    }
}

/// Iterator over the step durations produced by one [`StepClock::advance`].
#[derive(Debug, Clone)]
pub struct Steps {
    step: f32,
    remaining: u32,
}

impl Iterator for Steps {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for Steps {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_clamps_long_frames() {
        let mut clock = StepClock::new(Timestep::Variable);
        let steps: Vec<f32> = clock.advance(1.0).collect();
        assert_eq!(steps, vec![MAX_STEP_SECONDS]);
        let steps: Vec<f32> = clock.advance(0.016).collect();
        assert_eq!(steps, vec![0.016]);
    }

    #[test]
    fn variable_rejects_negative_and_nan() {
        let mut clock = StepClock::new(Timestep::Variable);
        assert_eq!(clock.advance(-1.0).collect::<Vec<_>>(), vec![0.0]);
        assert_eq!(clock.advance(f32::NAN).collect::<Vec<_>>(), vec![0.0]);
    }

    #[test]
    fn fixed_accumulates_remainder() {
        let mut clock = StepClock::new(Timestep::Fixed { step: 0.01 });
        assert_eq!(clock.advance(0.025).len(), 2);
        assert!((clock.pending() - 0.005).abs() < 1e-5);
        assert_eq!(clock.advance(0.006).len(), 1);
        assert!(clock.pending() < 0.002);
    }

    #[test]
    fn fixed_caps_catch_up() {
        let mut clock = StepClock::new(Timestep::Fixed { step: 0.01 });
        let n = clock.advance(10.0).len();
        assert!((24..=25).contains(&n), "got {n} steps");
    }

    #[test]
    fn fixed_step_never_exceeds_max() {
        let clock = StepClock::new(Timestep::Fixed { step: 0.5 });
        assert_eq!(clock.timestep(), Timestep::Fixed { step: MAX_STEP_SECONDS });
    }

    #[test]
    fn invalid_fixed_step_falls_back() {
        let clock = StepClock::new(Timestep::Fixed { step: 0.0 });
        assert_eq!(clock.timestep(), Timestep::Variable);
    }
}
