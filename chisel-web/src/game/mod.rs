//! Paddle game module - ball, paddles and the per-frame step
//!
//! Re-exports only; logic lives in the submodules.

mod engine;
mod state;

pub use engine::{GameEngine, StepOutcome};
pub use state::{Ball, GamePhase, GameState, Paddle};
