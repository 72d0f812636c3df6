//! Renderer module - WebGPU rendering for the game field and pose overlay
//!
//! Re-exports only. All logic in submodules.

mod debug_ui;
mod scene;
mod shapes;
mod skeleton;
mod state;

pub use debug_ui::{get_debug_overlay_text, record_frame, reset_metrics, update_transport_metrics};
pub use scene::render_game;
pub use skeleton::render_overlay;
pub use state::{initialize_gpu, is_initialized};
