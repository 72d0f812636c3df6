//! Landmark storage and ingestion
//!
//! Receives pose landmarks from the channel `update` messages, validates the
//! payload shape and keeps the latest observation for the tracker, the game
//! loop and the skeleton overlay to read on their next tick.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use thiserror::Error;

// ============================================================================
// LANDMARK INDICES (MediaPipe Pose - 33 total)
// ============================================================================

pub const LANDMARK_COUNT: usize = 33;

pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;

/// Points at or below this confidence are treated as missing
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

/// Skeleton connections drawn over the camera feed (torso, arms, legs)
pub const POSE_CONNECTIONS: [(usize, usize); 12] = [
    (LEFT_SHOULDER, RIGHT_SHOULDER),
    (LEFT_SHOULDER, LEFT_HIP),
    (RIGHT_SHOULDER, RIGHT_HIP),
    (LEFT_HIP, RIGHT_HIP),
    (LEFT_SHOULDER, LEFT_ELBOW),
    (LEFT_ELBOW, LEFT_WRIST),
    (RIGHT_SHOULDER, RIGHT_ELBOW),
    (RIGHT_ELBOW, RIGHT_WRIST),
    (LEFT_HIP, LEFT_KNEE),
    (LEFT_KNEE, LEFT_ANKLE),
    (RIGHT_HIP, RIGHT_KNEE),
    (RIGHT_KNEE, RIGHT_ANKLE),
];

// ============================================================================
// LANDMARK DATA STRUCTURE
// ============================================================================

/// A single tracked body point (normalized image coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32, // 0-1 normalized
    pub y: f32, // 0-1 normalized
    /// Relative depth, absent when the estimator does not report it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, z: None, visibility }
    }

    #[cfg(test)]
    pub fn with_depth(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z: Some(z), visibility }
    }

    pub fn is_visible(&self) -> bool {
        self.visibility > VISIBILITY_THRESHOLD
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.visibility.is_finite()
            && self.z.map_or(true, f32::is_finite)
    }
}

/// Rejected landmark payloads
#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("invalid landmark count: {0} (expected {LANDMARK_COUNT})")]
    InvalidCount(usize),
    #[error("landmark {0} has a non-finite coordinate")]
    NonFinite(usize),
}

/// The full set of landmarks for one instant, indexed by the pose numbering
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    landmarks: Vec<Landmark>,
}

impl Observation {
    pub fn from_landmarks(landmarks: Vec<Landmark>) -> Result<Self, IngestError> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(IngestError::InvalidCount(landmarks.len()));
        }
        if let Some(index) = landmarks.iter().position(|lm| !lm.is_finite()) {
            return Err(IngestError::NonFinite(index));
        }
        Ok(Self { landmarks })
    }

    /// Landmark at `index`, or `None` when it is low-confidence
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index).filter(|lm| lm.is_visible())
    }

    /// All landmarks regardless of confidence
    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }
}

/// Internal storage for the most recent observation
#[derive(Default)]
struct LandmarkStore {
    latest: Option<Observation>,
    /// Incremented on every accepted update, including "no pose" frames
    sequence: u64,
}

// Thread-local storage (WASM is single-threaded)
thread_local! {
    static LANDMARKS: RefCell<LandmarkStore> = RefCell::new(LandmarkStore::default());
}

// ============================================================================
// INGESTION
// ============================================================================

/// Validates a payload from the pose service.
///
/// An empty list means no pose was detected in that frame.
pub fn parse_landmarks(landmarks: Vec<Landmark>) -> Result<Option<Observation>, IngestError> {
    if landmarks.is_empty() {
        return Ok(None);
    }
    Observation::from_landmarks(landmarks).map(Some)
}

/// Replaces the stored observation with the latest arrival.
///
/// Invalid payloads are logged and dropped; the previous observation stays.
pub fn ingest_landmarks(landmarks: Vec<Landmark>) {
    let observation = match parse_landmarks(landmarks) {
        Ok(observation) => observation,
        Err(err) => {
            log::warn!("Dropping landmark payload: {err}");
            return;
        }
    };

    LANDMARKS.with(|store_cell| {
        if let Ok(mut store) = store_cell.try_borrow_mut() {
            store.latest = observation;
            store.sequence += 1;
        }
    });
}

/// Forget any stored observation (called on session change)
pub fn clear_landmarks() {
    LANDMARKS.with(|store_cell| {
        if let Ok(mut store) = store_cell.try_borrow_mut() {
            *store = LandmarkStore::default();
        }
    });
}

// ============================================================================
// INTERNAL API (no wasm_bindgen)
// ============================================================================

/// Latest observation together with its arrival sequence number
pub fn latest_observation() -> (u64, Option<Observation>) {
    LANDMARKS.with(|store_cell| match store_cell.try_borrow() {
        Ok(store) => (store.sequence, store.latest.clone()),
        Err(_) => (0, None),
    })
}

/// Number of accepted updates so far
pub fn landmark_sequence() -> u64 {
    LANDMARKS.with(|store_cell| store_cell.try_borrow().map(|s| s.sequence).unwrap_or(0))
}

#[cfg(test)]
pub(crate) fn observation_from(points: &[(usize, Landmark)]) -> Observation {
    let mut landmarks = vec![Landmark::new(0.0, 0.0, 0.0); LANDMARK_COUNT];
    for (index, lm) in points {
        landmarks[*index] = *lm;
    }
    Observation::from_landmarks(landmarks).unwrap()
}
