//! Exercise selection - which joints drive the signal for each movement

use crate::bridge::{
    LEFT_ELBOW, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER, LEFT_WRIST, RIGHT_ELBOW, RIGHT_HIP,
    RIGHT_KNEE, RIGHT_SHOULDER, RIGHT_WRIST,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Three landmark indices: first ray end, vertex, second ray end
pub type JointTriple = (usize, usize, usize);

/// Biomechanical bounds of the tracked angle, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exercise {
    PushUps,
    PullUps,
    Squats,
}

impl Exercise {
    pub const ALL: [Exercise; 3] = [Exercise::PushUps, Exercise::PullUps, Exercise::Squats];

    /// Name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Exercise::PushUps => "pushups",
            Exercise::PullUps => "pullups",
            Exercise::Squats => "squats",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Exercise::PushUps => "Push-Ups",
            Exercise::PullUps => "Pull-Ups",
            Exercise::Squats => "Squats",
        }
    }

    /// Left and right angle triples for the game control signal.
    ///
    /// Elbow angle for push-ups and pull-ups, hip angle for squats.
    pub fn angle_triples(&self) -> [JointTriple; 2] {
        match self {
            Exercise::PushUps | Exercise::PullUps => [
                (LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST),
                (RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST),
            ],
            Exercise::Squats => [
                (LEFT_SHOULDER, LEFT_HIP, LEFT_KNEE),
                (RIGHT_SHOULDER, RIGHT_HIP, RIGHT_KNEE),
            ],
        }
    }

    pub fn angle_range(&self) -> AngleRange {
        match self {
            Exercise::PushUps => AngleRange { min: 70.0, max: 160.0 },
            Exercise::PullUps => AngleRange { min: 60.0, max: 160.0 },
            Exercise::Squats => AngleRange { min: 90.0, max: 170.0 },
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exercise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Exercise::ALL
            .into_iter()
            .find(|exercise| exercise.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}
