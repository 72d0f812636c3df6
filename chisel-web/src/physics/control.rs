//! Control signal mapping for the paddle game
//!
//! Unlike the calibrated indicator, the game needs a usable signal from the
//! first frame, so the joint angle is normalized against fixed per-exercise
//! bounds instead of a learned range.

use super::angles::joint_angle;
use crate::bridge::Observation;
use crate::exercise::{AngleRange, Exercise};

/// Used when the required landmarks are missing
pub const NEUTRAL_ANGLE: f32 = 90.0;

/// Continuous controller value in [0, 1] (0 = top of the field)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ControlSignal(f32);

impl ControlSignal {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(0.5);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Top edge of a paddle of `paddle_height` inside a field of `field_height`
    pub fn paddle_offset(self, field_height: f32, paddle_height: f32) -> f32 {
        self.0 * (field_height - paddle_height).max(0.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ControlSignalMapper {
    exercise: Exercise,
    range: AngleRange,
}

impl ControlSignalMapper {
    pub fn new(exercise: Exercise) -> Self {
        Self {
            exercise,
            range: exercise.angle_range(),
        }
    }

    /// Mean of the left and right joint angles, or the neutral angle
    pub fn tracked_angle(&self, obs: Option<&Observation>) -> f32 {
        let Some(obs) = obs else {
            return NEUTRAL_ANGLE;
        };
        let [left, right] = self.exercise.angle_triples();

        let side = |(a, b, c): (usize, usize, usize)| {
            let (a, b, c) = (obs.get(a)?, obs.get(b)?, obs.get(c)?);
            Some(joint_angle(Some(a), Some(b), Some(c)))
        };

        match (side(left), side(right)) {
            (Some(l), Some(r)) => (l + r) / 2.0,
            _ => NEUTRAL_ANGLE,
        }
    }

    /// Clamp into the exercise range and scale to [0, 1]
    pub fn normalize_angle(&self, angle: f32) -> ControlSignal {
        let AngleRange { min, max } = self.range;
        let clamped = angle.clamp(min, max);
        ControlSignal::new((clamped - min) / (max - min))
    }

    pub fn map(&self, obs: Option<&Observation>) -> ControlSignal {
        self.normalize_angle(self.tracked_angle(obs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{
        observation_from, Landmark, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER, RIGHT_HIP, RIGHT_KNEE,
        RIGHT_SHOULDER,
    };
    use crate::physics::{classify_phase, Phase};

    /// Squat frame with the given hip angle on both sides
    fn squat_with_hip_angle(degrees: f32) -> Observation {
        let theta = degrees.to_radians();
        // knee straight below the hip, shoulder rotated about the hip
        let hip = (0.5, 0.5);
        let knee = (0.5, 0.7);
        let shoulder = (hip.0 + 0.2 * theta.sin(), hip.1 + 0.2 * theta.cos());
        observation_from(&[
            (LEFT_SHOULDER, Landmark::new(shoulder.0, shoulder.1, 1.0)),
            (RIGHT_SHOULDER, Landmark::new(shoulder.0, shoulder.1, 1.0)),
            (LEFT_HIP, Landmark::new(hip.0, hip.1, 1.0)),
            (RIGHT_HIP, Landmark::new(hip.0, hip.1, 1.0)),
            (LEFT_KNEE, Landmark::new(knee.0, knee.1, 1.0)),
            (RIGHT_KNEE, Landmark::new(knee.0, knee.1, 1.0)),
        ])
    }

    #[test]
    fn test_output_always_in_unit_range() {
        let mapper = ControlSignalMapper::new(Exercise::PushUps);
        for angle in [-45.0, 0.0, 69.9, 70.0, 115.0, 160.0, 179.0, 360.0] {
            let v = mapper.normalize_angle(angle).value();
            assert!((0.0..=1.0).contains(&v), "{angle} -> {v}");
        }
        assert_eq!(mapper.normalize_angle(10.0).value(), 0.0);
        assert_eq!(mapper.normalize_angle(175.0).value(), 1.0);
    }

    #[test]
    fn test_missing_landmarks_fall_back_to_neutral() {
        let mapper = ControlSignalMapper::new(Exercise::PullUps);
        assert_eq!(mapper.tracked_angle(None), NEUTRAL_ANGLE);

        let partial = observation_from(&[(LEFT_SHOULDER, Landmark::new(0.4, 0.3, 1.0))]);
        assert_eq!(mapper.tracked_angle(Some(&partial)), NEUTRAL_ANGLE);
        // 90 in [60, 160]
        assert!((mapper.map(Some(&partial)).value() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_squat_hip_angle() {
        let mapper = ControlSignalMapper::new(Exercise::Squats);
        let angle = mapper.tracked_angle(Some(&squat_with_hip_angle(130.0)));
        assert!((angle - 130.0).abs() < 0.05);
        assert!((mapper.map(Some(&squat_with_hip_angle(130.0))).value() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_paddle_offset() {
        let signal = ControlSignal::new(0.5);
        assert_eq!(signal.paddle_offset(600.0, 100.0), 250.0);
        assert_eq!(ControlSignal::new(1.0).paddle_offset(600.0, 100.0), 500.0);
    }

    #[test]
    fn test_squat_descent_phase_sequence() {
        let mapper = ControlSignalMapper::new(Exercise::Squats);
        let phases: Vec<Phase> = [170.0, 140.0, 100.0, 90.0, 170.0]
            .into_iter()
            .map(|deg| {
                let signal = mapper.map(Some(&squat_with_hip_angle(deg)));
                classify_phase(signal.value() * 100.0)
            })
            .collect();
        assert_eq!(phases, vec![Phase::Up, Phase::Up, Phase::Down, Phase::Down, Phase::Up]);
    }
}
