//! Workout status - phase indicator, rep count, feedback and summary
//!
//! The indicator is recomputed by the tracker loop from whatever observation
//! arrived last; rep count, feedback and summary come straight from the
//! pose service.

use super::landmarks::{latest_observation, Observation};
use crate::exercise::Exercise;
use crate::physics::{classify_phase, Phase, RangeTracker, NEUTRAL_PERCENTAGE};
use crate::speech::{self, should_speak};
use crate::transport::{format_feedback, ConnectionStatus, RepUpdate, WorkoutSummary};
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

/// Position indicator as shown next to the camera feed
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndicatorSnapshot {
    percentage: f32,
    phase: Phase,
    calibrated: bool,
}

impl Default for IndicatorSnapshot {
    fn default() -> Self {
        Self {
            percentage: NEUTRAL_PERCENTAGE,
            phase: classify_phase(NEUTRAL_PERCENTAGE),
            calibrated: false,
        }
    }
}

#[wasm_bindgen]
impl IndicatorSnapshot {
    #[wasm_bindgen(getter)]
    pub fn percentage(&self) -> f32 {
        self.percentage
    }

    /// "up" or "down"
    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        self.phase.as_str().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn calibrated(&self) -> bool {
        self.calibrated
    }
}

#[derive(Default)]
struct WorkoutStore {
    exercise: Option<Exercise>,
    /// Fresh per session; carries the one-shot calibration
    tracker: Option<RangeTracker>,
    indicator: IndicatorSnapshot,
    last_sequence: u64,
    rep_count: u32,
    feedback: String,
    status: ConnectionStatus,
    summary: Option<WorkoutSummary>,
    camera_error: Option<String>,
}

impl WorkoutStore {
    fn begin(&mut self, exercise: Exercise) {
        *self = Self {
            exercise: Some(exercise),
            tracker: Some(RangeTracker::new(exercise)),
            ..Self::default()
        };
    }

    /// Returns whether the new feedback should be read aloud
    fn apply_update(&mut self, update: &RepUpdate) -> bool {
        let speak = should_speak(&self.feedback, &update.feedback);
        self.rep_count = update.rep_count;
        self.feedback = update.feedback.clone();
        speak
    }

    /// Refresh the indicator if a new observation arrived since last time
    fn observe(&mut self, sequence: u64, obs: Option<&Observation>) {
        if sequence == self.last_sequence {
            return;
        }
        self.last_sequence = sequence;

        let (Some(tracker), Some(obs)) = (self.tracker.as_mut(), obs) else {
            return;
        };
        if let Some(percentage) = tracker.observe(obs) {
            self.indicator = IndicatorSnapshot {
                percentage,
                phase: classify_phase(percentage),
                calibrated: tracker.calibration().is_captured(),
            };
        }
    }
}

thread_local! {
    static WORKOUT: RefCell<WorkoutStore> = RefCell::new(WorkoutStore::default());
}

fn with_store(f: impl FnOnce(&mut WorkoutStore)) {
    WORKOUT.with(|cell| match cell.try_borrow_mut() {
        Ok(mut store) => f(&mut store),
        Err(_) => log::warn!("Workout store busy, update skipped"),
    });
}

fn read_store<T>(f: impl FnOnce(&WorkoutStore) -> T) -> T {
    WORKOUT.with(|cell| f(&cell.borrow()))
}

// ============================================================================
// INTERNAL API (no wasm_bindgen)
// ============================================================================

/// Reset everything for a new session with a new calibration
pub fn begin_workout(exercise: Exercise) {
    with_store(|store| store.begin(exercise));
}

/// Store the update and speak changed feedback
pub fn apply_rep_update(update: &RepUpdate) {
    let mut speak = false;
    with_store(|store| speak = store.apply_update(update));
    if speak {
        speech::speak(&update.feedback);
    }
}

pub fn set_connection_status(status: ConnectionStatus) {
    with_store(|store| store.status = status);
}

pub fn set_summary(summary: WorkoutSummary) {
    with_store(|store| store.summary = Some(summary));
}

pub fn set_camera_error(message: String) {
    with_store(|store| store.camera_error = Some(message));
}

/// One tracker tick: calibrate/normalize the latest observation
pub fn tracker_tick() {
    let (sequence, latest) = latest_observation();
    with_store(|store| store.observe(sequence, latest.as_ref()));
}

// ============================================================================
// WASM ENTRY POINTS
// ============================================================================

#[wasm_bindgen]
pub fn get_indicator() -> IndicatorSnapshot {
    read_store(|store| store.indicator)
}

#[wasm_bindgen]
pub fn get_rep_count() -> u32 {
    read_store(|store| store.rep_count)
}

/// Feedback formatted for display
#[wasm_bindgen]
pub fn get_feedback() -> String {
    read_store(|store| format_feedback(&store.feedback))
}

/// "disconnected", "connected" or "error"
#[wasm_bindgen]
pub fn get_connection_status() -> String {
    read_store(|store| store.status.as_str().to_string())
}

/// Wire name of the exercise of the current session
#[wasm_bindgen]
pub fn get_exercise() -> Option<String> {
    read_store(|store| store.exercise.map(|e| e.as_str().to_string()))
}

/// Summary as JSON once the service has sent it
#[wasm_bindgen]
pub fn get_workout_summary() -> Option<String> {
    read_store(|store| {
        store
            .summary
            .as_ref()
            .and_then(|summary| serde_json::to_string(summary).ok())
    })
}

#[wasm_bindgen]
pub fn get_camera_error() -> Option<String> {
    read_store(|store| store.camera_error.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{observation_from, Landmark, LEFT_HIP, LEFT_KNEE, RIGHT_HIP, RIGHT_KNEE};

    fn squat_frame(hip_y: f32, knee_y: f32) -> Observation {
        observation_from(&[
            (LEFT_HIP, Landmark::new(0.45, hip_y, 0.9)),
            (RIGHT_HIP, Landmark::new(0.55, hip_y, 0.9)),
            (LEFT_KNEE, Landmark::new(0.45, knee_y, 0.9)),
            (RIGHT_KNEE, Landmark::new(0.55, knee_y, 0.9)),
        ])
    }

    #[test]
    fn test_neutral_before_calibration() {
        let mut store = WorkoutStore::default();
        store.begin(Exercise::Squats);
        assert_eq!(store.indicator.percentage, 50.0);
        assert_eq!(store.indicator.phase, Phase::Up);
        assert!(!store.indicator.calibrated);

        // no pose in frame
        store.observe(1, None);
        assert_eq!(store.indicator, IndicatorSnapshot::default());
    }

    #[test]
    fn test_first_frame_calibrates() {
        let mut store = WorkoutStore::default();
        store.begin(Exercise::Squats);
        store.observe(1, Some(&squat_frame(0.5, 0.7)));
        assert!(store.indicator.calibrated);

        // hips drop towards the knees: past the bottom reference
        store.observe(2, Some(&squat_frame(0.69, 0.75)));
        assert_eq!(store.indicator.phase, Phase::Down);
    }

    #[test]
    fn test_same_sequence_is_not_reprocessed() {
        let mut store = WorkoutStore::default();
        store.begin(Exercise::Squats);
        store.observe(1, Some(&squat_frame(0.5, 0.7)));
        let before = store.indicator;
        store.observe(1, Some(&squat_frame(0.69, 0.75)));
        assert_eq!(store.indicator, before);
    }

    #[test]
    fn test_begin_resets_session() {
        let mut store = WorkoutStore::default();
        store.begin(Exercise::Squats);
        store.apply_update(&RepUpdate {
            rep_count: 4,
            feedback: "go lower".into(),
            landmarks: vec![],
        });
        store.summary = Some(WorkoutSummary::default());
        store.observe(1, Some(&squat_frame(0.5, 0.7)));

        store.begin(Exercise::PushUps);
        assert_eq!(store.rep_count, 0);
        assert!(store.feedback.is_empty());
        assert!(store.summary.is_none());
        assert!(!store.indicator.calibrated);
        assert_eq!(store.exercise, Some(Exercise::PushUps));
    }

    #[test]
    fn test_only_changed_feedback_is_spoken() {
        let mut store = WorkoutStore::default();
        store.begin(Exercise::PushUps);
        let update = |feedback: &str| RepUpdate {
            rep_count: 1,
            feedback: feedback.into(),
            landmarks: vec![],
        };
        assert!(!store.apply_update(&update("")));
        assert!(store.apply_update(&update("go lower")));
        assert!(!store.apply_update(&update("go lower")));
        assert!(!store.apply_update(&update("Good job")));
        assert!(store.apply_update(&update("go lower")));
    }
}
