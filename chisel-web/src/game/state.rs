//! Game state - ball, paddles, score and the countdown/running/over phase

use crate::config::GameConfig;
use nalgebra::Vector2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GamePhase {
    /// Seconds left before play starts
    Countdown(u32),
    Running,
    Over,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ball {
    pub position: Vector2<f32>,
    /// Pixels per frame
    pub velocity: Vector2<f32>,
    pub radius: f32,
}

impl Ball {
    pub fn speed(&self) -> f32 {
        self.velocity.norm()
    }

    pub fn left(&self) -> f32 {
        self.position.x - self.radius
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.radius
    }
}

/// Axis-aligned paddle; `y` is the top edge
#[derive(Clone, Debug, PartialEq)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Paddle {
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Ball edges overlap the paddle horizontally and its centre is
    /// within the paddle's vertical span
    pub fn touches(&self, ball: &Ball) -> bool {
        ball.left() < self.x + self.width
            && ball.right() > self.x
            && ball.position.y > self.y
            && ball.position.y < self.y + self.height
    }
}

/// Everything the game loop owns; mutated once per step
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub ball: Ball,
    pub player: Paddle,
    pub ai: Paddle,
    pub score: u32,
    pub phase: GamePhase,
    /// Timestamp (ms) recorded when the countdown finished
    pub started_at_ms: Option<f64>,
    /// Frozen when the game ends, live while running
    pub elapsed_ms: f64,
    /// Horizontal sign of the most recent serve
    pub serve_direction: f32,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            ball: Ball {
                position: Self::field_center(config),
                velocity: Vector2::new(config.serve_velocity.0, config.serve_velocity.1),
                radius: config.ball_radius,
            },
            player: Paddle {
                x: config.player_paddle_x,
                y: config.paddle_start_y,
                width: config.paddle_width,
                height: config.paddle_height,
            },
            ai: Paddle {
                x: config.ai_paddle_x,
                y: config.paddle_start_y,
                width: config.paddle_width,
                height: config.paddle_height,
            },
            score: 0,
            phase: GamePhase::Countdown(config.countdown_secs),
            started_at_ms: None,
            elapsed_ms: 0.0,
            serve_direction: config.serve_velocity.0.signum(),
        }
    }

    pub fn field_center(config: &GameConfig) -> Vector2<f32> {
        Vector2::new(config.field_width / 2.0, config.field_height / 2.0)
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::Over
    }

    /// Whole seconds survived, as shown on the results screen
    pub fn elapsed_secs(&self) -> u32 {
        (self.elapsed_ms / 1000.0).floor().max(0.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_layout() {
        let state = GameState::new(&GameConfig::default());
        assert_eq!(state.ball.position, Vector2::new(400.0, 300.0));
        assert_eq!(state.phase, GamePhase::Countdown(10));
        assert_eq!(state.serve_direction, 1.0);
        assert_eq!(state.player.center_y(), 300.0);
    }

    #[test]
    fn test_touch_requires_vertical_overlap() {
        let state = GameState::new(&GameConfig::default());
        let mut ball = state.ball.clone();
        ball.position = Vector2::new(40.0, 300.0);
        assert!(state.player.touches(&ball));

        ball.position.y = 240.0;
        assert!(!state.player.touches(&ball));
    }
}
