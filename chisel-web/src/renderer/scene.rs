//! Game scene - GameState to vertices
//!
//! Pure: reads the state, never mutates it. Everything is laid out in field
//! pixels and projected to clip space at the end.

use super::shapes::{push_circle, push_rect, Rgba, Vertex};
use super::state::{CanvasRole, GPU_STATE};
use crate::config::GameConfig;
use crate::game::{GamePhase, GameState};

pub(crate) mod colors {
    use super::Rgba;

    /// #a855f7
    pub const PURPLE: Rgba = [0.659, 0.333, 0.969, 1.0];
    /// #c084fc
    pub const LILAC: Rgba = [0.753, 0.518, 0.988, 1.0];
    pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];
    pub const FIELD: wgpu::Color = wgpu::Color::BLACK;
}

const DASH_LEN: f32 = 10.0;
const DASH_WIDTH: f32 = 2.0;
const SCORE_TOP: f32 = 20.0;
const SCORE_HEIGHT: f32 = 48.0;
const COUNTDOWN_HEIGHT: f32 = 160.0;
const BALL_SEGMENTS: u32 = 24;

/// Field pixels (origin top-left, y down) to clip space
#[derive(Clone, Copy, Debug)]
pub struct FieldProjection {
    width: f32,
    height: f32,
}

impl FieldProjection {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (x / self.width * 2.0 - 1.0, 1.0 - y / self.height * 2.0)
    }

    pub fn extent(&self, dx: f32, dy: f32) -> (f32, f32) {
        (dx / self.width * 2.0, dy / self.height * 2.0)
    }

    /// Rect given by its top-left corner and size in field pixels
    fn rect(&self, out: &mut Vec<Vertex>, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        push_rect(out, self.point(x, y), self.point(x + w, y + h), color);
    }
}

// ============================================================================
// SEVEN-SEGMENT DIGITS
// ============================================================================

/// Bits a..g = 0..6 (top, upper right, lower right, bottom, lower left,
/// upper left, middle)
const DIGIT_SEGMENTS: [u8; 10] = [
    0b011_1111, // 0
    0b000_0110, // 1
    0b101_1011, // 2
    0b100_1111, // 3
    0b110_0110, // 4
    0b110_1101, // 5
    0b111_1101, // 6
    0b000_0111, // 7
    0b111_1111, // 8
    0b110_1111, // 9
];

fn push_digit(
    out: &mut Vec<Vertex>,
    proj: &FieldProjection,
    digit: u32,
    (x, y): (f32, f32),
    height: f32,
    color: Rgba,
) {
    let Some(&mask) = DIGIT_SEGMENTS.get(digit as usize) else {
        return;
    };
    let w = height * 0.5;
    let h = height;
    let t = height * 0.12;
    let half = h / 2.0;

    // (left, top, width, height) relative to the digit origin
    let segments = [
        (0.0, 0.0, w, t),
        (w - t, 0.0, t, half),
        (w - t, half, t, half),
        (0.0, h - t, w, t),
        (0.0, half, t, half),
        (0.0, 0.0, t, half),
        (0.0, half - t / 2.0, w, t),
    ];
    for (bit, (sx, sy, sw, sh)) in segments.into_iter().enumerate() {
        if mask & (1 << bit) != 0 {
            proj.rect(out, x + sx, y + sy, sw, sh, color);
        }
    }
}

/// Decimal number horizontally centred on `center_x`, top edge at `top`
pub fn push_number(
    out: &mut Vec<Vertex>,
    proj: &FieldProjection,
    value: u32,
    (center_x, top): (f32, f32),
    height: f32,
    color: Rgba,
) {
    let digits: Vec<u32> = value
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();
    let digit_w = height * 0.5;
    let gap = height * 0.2;
    let total = digits.len() as f32 * digit_w + (digits.len().saturating_sub(1)) as f32 * gap;
    let mut x = center_x - total / 2.0;
    for digit in digits {
        push_digit(out, proj, digit, (x, top), height, color);
        x += digit_w + gap;
    }
}

// ============================================================================
// SCENE
// ============================================================================

pub fn build_game_vertices(state: &GameState, config: &GameConfig) -> Vec<Vertex> {
    let proj = FieldProjection::new(config.field_width, config.field_height);
    let mut out = Vec::with_capacity(512);

    // Dashed centre line
    let cx = config.field_width / 2.0 - DASH_WIDTH / 2.0;
    let mut y = 0.0;
    while y < config.field_height {
        let len = DASH_LEN.min(config.field_height - y);
        proj.rect(&mut out, cx, y, DASH_WIDTH, len, colors::PURPLE);
        y += DASH_LEN * 2.0;
    }

    for (paddle, color) in [(&state.player, colors::PURPLE), (&state.ai, colors::WHITE)] {
        proj.rect(&mut out, paddle.x, paddle.y, paddle.width, paddle.height, color);
    }

    let ball = &state.ball;
    push_circle(
        &mut out,
        proj.point(ball.position.x, ball.position.y),
        proj.extent(ball.radius, ball.radius),
        colors::LILAC,
        BALL_SEGMENTS,
    );

    push_number(
        &mut out,
        &proj,
        state.score,
        (config.field_width / 2.0, SCORE_TOP),
        SCORE_HEIGHT,
        colors::PURPLE,
    );

    if let GamePhase::Countdown(n) = state.phase {
        push_number(
            &mut out,
            &proj,
            n,
            (
                config.field_width / 2.0,
                (config.field_height - COUNTDOWN_HEIGHT) / 2.0,
            ),
            COUNTDOWN_HEIGHT,
            colors::WHITE,
        );
    }

    out
}

/// Draw one game frame; no-op until the renderer is initialized
pub fn render_game(state: &GameState, config: &GameConfig) {
    let vertices = build_game_vertices(state, config);
    GPU_STATE.with(|state_cell| {
        let Ok(gpu) = state_cell.try_borrow() else {
            return;
        };
        if let Some(gpu) = gpu.as_ref() {
            gpu.draw(CanvasRole::Game, &vertices, colors::FIELD);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_vertices(value: u32) -> usize {
        let proj = FieldProjection::new(800.0, 600.0);
        let mut out = Vec::new();
        push_number(&mut out, &proj, value, (400.0, 20.0), 48.0, colors::WHITE);
        out.len()
    }

    #[test]
    fn test_projection_corners() {
        let proj = FieldProjection::new(800.0, 600.0);
        assert_eq!(proj.point(0.0, 0.0), (-1.0, 1.0));
        assert_eq!(proj.point(800.0, 600.0), (1.0, -1.0));
        assert_eq!(proj.point(400.0, 300.0), (0.0, 0.0));
    }

    #[test]
    fn test_seven_segment_counts() {
        // 6 vertices per lit segment
        assert_eq!(number_vertices(8), 7 * 6);
        assert_eq!(number_vertices(1), 2 * 6);
        assert_eq!(number_vertices(10), (2 + 6) * 6);
        assert_eq!(number_vertices(0), 6 * 6);
    }

    #[test]
    fn test_scene_stays_in_clip_space() {
        let config = GameConfig::default();
        let state = GameState::new(&config);
        let vertices = build_game_vertices(&state, &config);
        assert!(!vertices.is_empty());
        assert_eq!(vertices.len() % 3, 0);
        for v in &vertices {
            assert!(v.position.iter().all(|c| (-1.0..=1.0).contains(c)), "{:?}", v);
        }
    }

    #[test]
    fn test_countdown_digits_only_before_running() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config);
        state.phase = GamePhase::Countdown(8);
        let counting = build_game_vertices(&state, &config).len();
        state.phase = GamePhase::Running;
        let running = build_game_vertices(&state, &config).len();
        assert_eq!(counting - running, 7 * 6);
    }
}
