//! Chisel Web - camera-driven exercise tracking and paddle game
//!
//! Entry point for WASM module. Only contains:
//! - Module declarations
//! - wasm_bindgen entry points that delegate to submodules

mod bridge;
mod config;
mod error;
mod exercise;
mod game;
mod logging;
mod physics;
mod renderer;
mod schedule;
mod speech;
mod transport;

use wasm_bindgen::prelude::*;

// Re-export wasm_bindgen functions for JS access
pub use bridge::{
    end_workout, get_camera_error, get_connection_status, get_exercise, get_feedback,
    get_game_snapshot, get_indicator, get_rep_count, get_workout_summary, is_session_active,
    restart_game, start_game, start_workout, stop_session, GameSnapshot, IndicatorSnapshot,
};
pub use renderer::get_debug_overlay_text;

// ============================================================================
// WASM ENTRY POINTS
// ============================================================================

/// Called automatically when WASM module loads
#[wasm_bindgen(start)]
pub fn init_runtime() {
    console_error_panic_hook::set_once();
    logging::init(log::LevelFilter::Info);
}

/// Initialize WebGPU for the game canvas and, optionally, the skeleton
/// overlay canvas stacked on the camera video
#[wasm_bindgen]
pub async fn init_renderer(
    game_canvas_id: String,
    overlay_canvas_id: Option<String>,
) -> Result<(), JsValue> {
    renderer::initialize_gpu(&game_canvas_id, overlay_canvas_id.as_deref()).await?;
    log::info!("WebGPU initialized");
    Ok(())
}

/// Whether `init_renderer` has completed
#[wasm_bindgen]
pub fn is_renderer_ready() -> bool {
    renderer::is_initialized()
}

/// Wire names of the supported exercises
#[wasm_bindgen]
pub fn supported_exercises() -> Vec<String> {
    exercise::Exercise::ALL
        .iter()
        .map(|e| e.as_str().to_string())
        .collect()
}
