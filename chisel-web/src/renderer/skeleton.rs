//! Skeleton overlay - pose connections and joints over the camera feed

use super::scene::colors;
use super::shapes::{push_circle, push_line, Vertex};
use super::state::{CanvasRole, GPU_STATE};
use crate::bridge::{self, Observation, POSE_CONNECTIONS};

/// Pixel sizes on the overlay canvas
const BONE_HALF_WIDTH_PX: f32 = 1.5;
const JOINT_RADIUS_PX: f32 = 5.0;
const JOINT_SEGMENTS: u32 = 12;

const CLEAR: wgpu::Color = wgpu::Color::TRANSPARENT;

/// Convert normalized landmark (0-1) to clip space (-1 to 1), flip Y
fn to_clip_space(x: f32, y: f32) -> (f32, f32) {
    (x * 2.0 - 1.0, -(y * 2.0 - 1.0))
}

/// Bones whose endpoints are both visible, then every visible joint.
/// `size` is the target canvas size in pixels.
pub fn build_overlay_vertices(obs: &Observation, (width, height): (u32, u32)) -> Vec<Vertex> {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let mut vertices = Vec::new();

    for &(start, end) in POSE_CONNECTIONS.iter() {
        let (Some(a), Some(b)) = (obs.get(start), obs.get(end)) else {
            continue;
        };
        push_line(
            &mut vertices,
            to_clip_space(a.x, a.y),
            to_clip_space(b.x, b.y),
            BONE_HALF_WIDTH_PX * 2.0 / w.min(h),
            colors::PURPLE,
        );
    }

    let radius = (JOINT_RADIUS_PX * 2.0 / w, JOINT_RADIUS_PX * 2.0 / h);
    for lm in obs.landmarks().iter().filter(|lm| lm.is_visible()) {
        push_circle(
            &mut vertices,
            to_clip_space(lm.x, lm.y),
            radius,
            colors::LILAC,
            JOINT_SEGMENTS,
        );
    }

    vertices
}

/// Draw the latest observation; clears the overlay when there is none
pub fn render_overlay() {
    let (_, latest) = bridge::latest_observation();

    GPU_STATE.with(|state_cell| {
        let Ok(state_ref) = state_cell.try_borrow() else {
            return;
        };
        let Some(state) = state_ref.as_ref() else {
            return;
        };
        let Some(size) = state.target_size(CanvasRole::Overlay) else {
            return;
        };
        let vertices = latest
            .as_ref()
            .map(|obs| build_overlay_vertices(obs, size))
            .unwrap_or_default();
        state.draw(CanvasRole::Overlay, &vertices, CLEAR);
    });
}
