//! Timed multi-step stimulus presentations.
//!
//! A presentation shows a list of stimulus steps back to back, each for its
//! own duration, inside a response window. Once a response has arrived and
//! the minimum stimulus duration has passed, the presentation ends at the
//! next step boundary. After the last step the stimulus slot goes blank.

use std::time::Duration;

use crate::error::SpecError;
use crate::stimulus::{FrameSpec, Slot, StimulusSpec};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StimulusStep {
    pub spec: StimulusSpec,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StimulusSequence {
    steps: Vec<StimulusStep>,
    /// Minimum time the stimulus stays up once a response arrives.
    duration: Duration,
    /// Time from onset during which a response is accepted.
    response_window: Duration,
}

impl StimulusSequence {
    /// Requires at least one step, a positive duration, a response window
    /// longer than the duration, and every step valid with a positive
    /// duration.
    pub fn new(
        steps: Vec<StimulusStep>,
        duration: Duration,
        response_window: Duration,
    ) -> Result<Self, SpecError> {
        if steps.is_empty() {
            return Err(SpecError::EmptySequence);
        }
        if duration.is_zero() {
            return Err(SpecError::ZeroDuration);
        }
        if response_window <= duration {
            return Err(SpecError::ResponseWindow {
                window_ms: response_window.as_millis(),
                duration_ms: duration.as_millis(),
            });
        }
        for (step, s) in steps.iter().enumerate() {
            if s.duration.is_zero() {
                return Err(SpecError::ZeroStepDuration { step });
            }
            s.spec.validate(Slot::Stimulus)?;
        }
        Ok(Self {
            steps,
            duration,
            response_window,
        })
    }

    /// A single step shown for `duration`.
    pub fn single(
        spec: StimulusSpec,
        duration: Duration,
        response_window: Duration,
    ) -> Result<Self, SpecError> {
        Self::new(vec![StimulusStep { spec, duration }], duration, response_window)
    }

    pub fn steps(&self) -> &[StimulusStep] {
        &self.steps
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn response_window(&self) -> Duration {
        self.response_window
    }

    /// Sum of all step durations.
    pub fn total_step_time(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Step on screen `elapsed` after onset, `None` once finished.
    ///
    /// `response` is the response time since onset, if any. The check runs
    /// only at step boundaries: a step that has started always runs to its end.
    pub fn active_step(&self, elapsed: Duration, response: Option<Duration>) -> Option<usize> {
        let mut step_end = Duration::ZERO;
        for (index, step) in self.steps.iter().enumerate() {
            step_end += step.duration;
            if elapsed < step_end {
                return Some(index);
            }
            let responded = response.is_some_and(|r| r <= step_end);
            if responded && step_end > self.duration {
                return None;
            }
        }
        None
    }

    pub fn is_finished(&self, elapsed: Duration, response: Option<Duration>) -> bool {
        self.active_step(elapsed, response).is_none()
    }

    /// Whether a response at `elapsed` counts.
    pub fn accepts_response(&self, elapsed: Duration) -> bool {
        elapsed < self.response_window
    }

    /// Stimulus slot at `elapsed`: the active step, or a blank stimulus.
    pub fn stimulus_at(&self, elapsed: Duration, response: Option<Duration>) -> StimulusSpec {
        self.active_step(elapsed, response)
            .map(|index| self.steps[index].spec)
            .unwrap_or_default()
    }

    /// `base` with its stimulus slot replaced by the one showing at `elapsed`.
    pub fn frame_at(&self, base: &FrameSpec, elapsed: Duration, response: Option<Duration>) -> FrameSpec {
        FrameSpec {
            stimulus: self.stimulus_at(elapsed, response),
            ..*base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ShapeKind;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn step(kind: ShapeKind, duration: u64) -> StimulusStep {
        StimulusStep {
            spec: StimulusSpec {
                kind,
                size: [1.0, 1.0],
                luminance: 0.8,
                ..Default::default()
            },
            duration: ms(duration),
        }
    }

    fn three_steps() -> StimulusSequence {
        let steps = vec![
            step(ShapeKind::Circle, 100),
            step(ShapeKind::Square, 100),
            step(ShapeKind::Annulus, 100),
        ];
        StimulusSequence::new(steps, ms(150), ms(1500)).expect("valid sequence")
    }

    #[test]
    fn steps_follow_each_other() {
        let seq = three_steps();
        assert_eq!(seq.active_step(ms(0), None), Some(0));
        assert_eq!(seq.active_step(ms(99), None), Some(0));
        assert_eq!(seq.active_step(ms(100), None), Some(1));
        assert_eq!(seq.active_step(ms(250), None), Some(2));
        assert_eq!(seq.active_step(ms(300), None), None);
        assert_eq!(seq.total_step_time(), ms(300));
    }

    #[test]
    fn blank_after_last_step() {
        let seq = three_steps();
        assert_eq!(seq.stimulus_at(ms(120), None).kind, ShapeKind::Square);
        assert_eq!(seq.stimulus_at(ms(400), None), StimulusSpec::default());
        assert!(seq.is_finished(ms(400), None));
    }

    #[test]
    fn response_ends_at_boundary_after_duration() {
        let seq = three_steps();
        // Boundary at 100 ms is still inside the 150 ms minimum.
        assert_eq!(seq.active_step(ms(120), Some(ms(50))), Some(1));
        // Boundary at 200 ms is past it.
        assert_eq!(seq.active_step(ms(210), Some(ms(50))), None);
        // A response after the boundary does not cut the step short.
        assert_eq!(seq.active_step(ms(210), Some(ms(205))), Some(2));
    }

    #[test]
    fn frame_keeps_background_and_fixation() {
        let seq = three_steps();
        let base = FrameSpec::default();
        let frame = seq.frame_at(&base, ms(10), None);
        assert_eq!(frame.background, base.background);
        assert_eq!(frame.fixation, base.fixation);
        assert_eq!(frame.stimulus.kind, ShapeKind::Circle);
    }

    #[test]
    fn response_window() {
        let seq = three_steps();
        assert!(seq.accepts_response(ms(1499)));
        assert!(!seq.accepts_response(ms(1500)));
    }

    #[test]
    fn rejects_invalid_timing() {
        let one = || vec![step(ShapeKind::Circle, 100)];
        assert_eq!(
            StimulusSequence::new(Vec::new(), ms(100), ms(200)),
            Err(SpecError::EmptySequence)
        );
        assert_eq!(
            StimulusSequence::new(one(), Duration::ZERO, ms(200)),
            Err(SpecError::ZeroDuration)
        );
        assert_eq!(
            StimulusSequence::new(one(), ms(200), ms(200)),
            Err(SpecError::ResponseWindow {
                window_ms: 200,
                duration_ms: 200
            })
        );
        assert_eq!(
            StimulusSequence::new(vec![step(ShapeKind::Circle, 0)], ms(100), ms(200)),
            Err(SpecError::ZeroStepDuration { step: 0 })
        );
    }

    #[test]
    fn rejects_invalid_step() {
        let mut bad = step(ShapeKind::Cross, 100);
        bad.spec.luminance = 1.5;
        assert!(matches!(
            StimulusSequence::single(bad.spec, ms(100), ms(200)),
            Err(SpecError::Luminance { .. })
        ));
    }
}
