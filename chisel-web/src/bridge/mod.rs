//! Bridge module - JS ↔ Rust communication
//!
//! All #[wasm_bindgen] entry points live here.
//! Re-exports only in mod.rs, logic in submodules.

mod game;
mod landmarks;
mod session;
mod workout;

pub use landmarks::{
    // Internal API
    latest_observation,
    Landmark,
    Observation,
    // Constants
    LANDMARK_COUNT, POSE_CONNECTIONS, VISIBILITY_THRESHOLD,
    LEFT_SHOULDER, RIGHT_SHOULDER,
    LEFT_ELBOW, RIGHT_ELBOW,
    LEFT_WRIST, RIGHT_WRIST,
    LEFT_HIP, RIGHT_HIP,
    LEFT_KNEE, RIGHT_KNEE,
    LEFT_ANKLE, RIGHT_ANKLE,
};

#[cfg(test)]
pub(crate) use landmarks::observation_from;

pub use session::{
    // WASM entry points
    end_workout,
    is_session_active,
    restart_game,
    start_game,
    start_workout,
    stop_session,
};

pub use workout::{
    get_camera_error,
    get_connection_status,
    get_exercise,
    get_feedback,
    get_indicator,
    get_rep_count,
    get_workout_summary,
    IndicatorSnapshot,
};

pub use game::{get_game_snapshot, GameSnapshot};
