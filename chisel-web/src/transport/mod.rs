//! Transport module - camera capture, frame send policy and the channel
//!
//! Re-exports only. All logic in submodules.

mod camera;
mod channel;
mod frame_gate;
mod protocol;
mod reconnect;

pub use camera::Camera;
pub use channel::{Channel, ChannelEvent, ChannelOptions};
pub use frame_gate::{FrameCounters, FrameDecision, FrameGate};
pub use protocol::{
    format_feedback, ClientMessage, ConnectionStatus, RepUpdate, ServerMessage, WorkoutSummary,
};
