//! Calibrated range tracking for the rep-phase indicator
//!
//! Absolute image coordinates vary with body size, camera distance and
//! framing, so the indicator is anchored to the user's own range: the first
//! frame with complete landmark data fixes a top and a bottom reference, and
//! every later measurement is expressed as a percentage of that range.

use crate::bridge::{
    Observation, LEFT_ELBOW, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER, LEFT_WRIST, RIGHT_ELBOW,
    RIGHT_HIP, RIGHT_KNEE, RIGHT_SHOULDER, RIGHT_WRIST,
};
use crate::exercise::Exercise;

/// Reported while uncalibrated and for a zero-width range
pub const NEUTRAL_PERCENTAGE: f32 = 50.0;

/// Ranges narrower than this are treated as degenerate
const MIN_RANGE: f32 = 1e-6;

/// Per-session reference values, captured exactly once
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CalibrationState {
    #[default]
    Uncaptured,
    Captured {
        top_reference: f32,
        bottom_reference: f32,
    },
}

impl CalibrationState {
    pub fn is_captured(&self) -> bool {
        matches!(self, CalibrationState::Captured { .. })
    }

    /// Commit the references if nothing has been captured yet.
    ///
    /// Returns true only on the call that performed the capture.
    pub fn capture_once(&mut self, top_reference: f32, bottom_reference: f32) -> bool {
        if self.is_captured() {
            return false;
        }
        *self = CalibrationState::Captured { top_reference, bottom_reference };
        true
    }

    /// Position of `current` inside the captured range, 0-100
    pub fn percentage(&self, current: f32) -> Option<f32> {
        match *self {
            CalibrationState::Uncaptured => None,
            CalibrationState::Captured { top_reference, bottom_reference } => {
                Some(range_percentage(current, top_reference, bottom_reference))
            }
        }
    }
}

/// `((current - bottom) / (top - bottom)) * 100`, clamped to [0, 100]
pub fn range_percentage(current: f32, top: f32, bottom: f32) -> f32 {
    let span = top - bottom;
    if span.abs() < MIN_RANGE || !span.is_finite() {
        return NEUTRAL_PERCENTAGE;
    }
    let pct = (current - bottom) / span * 100.0;
    if pct.is_nan() {
        return NEUTRAL_PERCENTAGE;
    }
    pct.clamp(0.0, 100.0)
}

/// One frame's measurement and the reference candidates from its geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSample {
    pub current: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Extract the tracked height and the reference heights for `exercise`.
///
/// Returns `None` unless every required landmark group is present.
pub fn range_sample(exercise: Exercise, obs: &Observation) -> Option<RangeSample> {
    let pair = |left: usize, right: usize| Some((obs.get(left)?.y, obs.get(right)?.y));
    let mean = |(l, r): (f32, f32)| (l + r) / 2.0;

    match exercise {
        Exercise::PushUps => {
            let shoulders = pair(LEFT_SHOULDER, RIGHT_SHOULDER)?;
            let elbows = pair(LEFT_ELBOW, RIGHT_ELBOW)?;
            Some(RangeSample {
                current: mean(shoulders),
                top: mean(shoulders),
                bottom: mean(elbows),
            })
        }
        Exercise::PullUps => {
            let shoulders = pair(LEFT_SHOULDER, RIGHT_SHOULDER)?;
            let wrists = pair(LEFT_WRIST, RIGHT_WRIST)?;
            Some(RangeSample {
                current: mean(shoulders),
                top: shoulders.0.min(shoulders.1),
                bottom: wrists.0.max(wrists.1),
            })
        }
        Exercise::Squats => {
            let hips = pair(LEFT_HIP, RIGHT_HIP)?;
            let knees = pair(LEFT_KNEE, RIGHT_KNEE)?;
            Some(RangeSample {
                current: mean(hips),
                top: mean(hips),
                bottom: mean(knees),
            })
        }
    }
}

/// Converts observations into calibrated position percentages
#[derive(Debug, Clone)]
pub struct RangeTracker {
    exercise: Exercise,
    calibration: CalibrationState,
}

impl RangeTracker {
    /// Fresh, uncalibrated tracker; create a new one whenever the exercise changes
    pub fn new(exercise: Exercise) -> Self {
        Self {
            exercise,
            calibration: CalibrationState::Uncaptured,
        }
    }

    pub fn calibration(&self) -> CalibrationState {
        self.calibration
    }

    /// Percentage for this observation, or `None` if required landmarks are missing
    pub fn observe(&mut self, obs: &Observation) -> Option<f32> {
        let sample = range_sample(self.exercise, obs)?;
        Some(self.update(sample))
    }

    /// Capture on the first sample, then normalize against the fixed range
    pub fn update(&mut self, sample: RangeSample) -> f32 {
        if self.calibration.capture_once(sample.top, sample.bottom) {
            log::info!(
                "Calibrated {} range: top {:.3}, bottom {:.3}",
                self.exercise,
                sample.top,
                sample.bottom
            );
        }
        self.calibration
            .percentage(sample.current)
            .unwrap_or(NEUTRAL_PERCENTAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{observation_from, Landmark};

    fn squat_frame(hip_y: f32, knee_y: f32) -> Observation {
        observation_from(&[
            (LEFT_HIP, Landmark::new(0.45, hip_y, 1.0)),
            (RIGHT_HIP, Landmark::new(0.55, hip_y, 1.0)),
            (LEFT_KNEE, Landmark::new(0.45, knee_y, 1.0)),
            (RIGHT_KNEE, Landmark::new(0.55, knee_y, 1.0)),
        ])
    }

    #[test]
    fn test_capture_once() {
        let mut state = CalibrationState::default();
        assert!(state.capture_once(0.2, 0.8));
        assert!(!state.capture_once(0.0, 1.0));
        assert_eq!(
            state,
            CalibrationState::Captured { top_reference: 0.2, bottom_reference: 0.8 }
        );
    }

    #[test]
    fn test_percentage_formula() {
        assert!((range_percentage(0.5, 0.2, 0.8) - 50.0).abs() < 1e-3);
        assert!((range_percentage(0.2, 0.2, 0.8) - 100.0).abs() < 1e-3);
        assert_eq!(range_percentage(0.9, 0.2, 0.8), 0.0);
        assert_eq!(range_percentage(0.0, 0.2, 0.8), 100.0);
    }

    #[test]
    fn test_degenerate_range_is_neutral() {
        assert_eq!(range_percentage(0.3, 0.5, 0.5), NEUTRAL_PERCENTAGE);
        assert_eq!(range_percentage(0.3, f32::INFINITY, 0.5), NEUTRAL_PERCENTAGE);
    }

    #[test]
    fn test_missing_landmarks_do_not_calibrate() {
        let mut tracker = RangeTracker::new(Exercise::Squats);
        let incomplete = observation_from(&[(LEFT_HIP, Landmark::new(0.45, 0.5, 1.0))]);
        assert_eq!(tracker.observe(&incomplete), None);
        assert!(!tracker.calibration().is_captured());
    }

    #[test]
    fn test_first_valid_frame_fixes_range() {
        let mut tracker = RangeTracker::new(Exercise::Squats);
        // standing: hips at 0.5, knees at 0.7
        assert_eq!(tracker.observe(&squat_frame(0.5, 0.7)), Some(100.0));

        // a later, larger range must not move the references
        tracker.observe(&squat_frame(0.1, 0.95));
        assert_eq!(
            tracker.calibration(),
            CalibrationState::Captured { top_reference: 0.5, bottom_reference: 0.7 }
        );

        let pct = tracker.observe(&squat_frame(0.6, 0.7)).unwrap();
        assert!((pct - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_calibration_frame_position_matters() {
        let frames = [squat_frame(0.5, 0.7), squat_frame(0.4, 0.9), squat_frame(0.6, 0.7)];

        let run = |order: &[usize]| {
            let mut tracker = RangeTracker::new(Exercise::Squats);
            order
                .iter()
                .map(|&i| tracker.observe(&frames[i]).unwrap())
                .collect::<Vec<_>>()
        };

        let first = run(&[0, 1, 2]);
        let swapped = run(&[1, 0, 2]);
        assert_ne!(first[2], swapped[2]);
    }

    #[test]
    fn test_pullup_references() {
        let obs = observation_from(&[
            (LEFT_SHOULDER, Landmark::new(0.4, 0.30, 1.0)),
            (RIGHT_SHOULDER, Landmark::new(0.6, 0.34, 1.0)),
            (LEFT_WRIST, Landmark::new(0.4, 0.10, 1.0)),
            (RIGHT_WRIST, Landmark::new(0.6, 0.12, 1.0)),
        ]);
        let sample = range_sample(Exercise::PullUps, &obs).unwrap();
        assert!((sample.current - 0.32).abs() < 1e-6);
        assert!((sample.top - 0.30).abs() < 1e-6);
        assert!((sample.bottom - 0.12).abs() < 1e-6);
    }

    #[test]
    fn test_pushup_uses_elbows_as_bottom() {
        let obs = observation_from(&[
            (LEFT_SHOULDER, Landmark::new(0.4, 0.40, 1.0)),
            (RIGHT_SHOULDER, Landmark::new(0.6, 0.40, 1.0)),
            (LEFT_ELBOW, Landmark::new(0.4, 0.55, 1.0)),
            (RIGHT_ELBOW, Landmark::new(0.6, 0.57, 1.0)),
        ]);
        let sample = range_sample(Exercise::PushUps, &obs).unwrap();
        assert!((sample.bottom - 0.56).abs() < 1e-6);
        assert!(range_sample(Exercise::Squats, &obs).is_none());
    }
}
