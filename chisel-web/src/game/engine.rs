//! Game loop engine - one physics step per rendered frame
//!
//! The engine is a pure state machine driven by timestamps from the caller,
//! so it can be stepped from `requestAnimationFrame` or from tests alike.

use super::state::{GamePhase, GameState};
use crate::config::GameConfig;
use crate::physics::ControlSignal;
use nalgebra::Vector2;

/// What a call to [`GameEngine::step`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Not running (countdown or already over), nothing advanced
    Idle,
    Continue,
    /// Ball got past the player on this step
    GameOver,
}

pub struct GameEngine {
    config: GameConfig,
    state: GameState,
}

impl GameEngine {
    pub fn new(config: GameConfig) -> Self {
        let state = GameState::new(&config);
        Self { config, state }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Fresh state with a new countdown; nothing carries over
    pub fn restart(&mut self) {
        self.state = GameState::new(&self.config);
    }

    /// Start immediately when configured without a countdown
    pub fn start_if_ready(&mut self, now_ms: f64) {
        if self.state.phase == GamePhase::Countdown(0) {
            self.begin_running(now_ms);
        }
    }

    /// Called once per second while counting down
    pub fn tick_countdown(&mut self, now_ms: f64) -> GamePhase {
        if let GamePhase::Countdown(n) = self.state.phase {
            let remaining = n.saturating_sub(1);
            if remaining == 0 {
                self.begin_running(now_ms);
            } else {
                self.state.phase = GamePhase::Countdown(remaining);
            }
        }
        self.state.phase
    }

    fn begin_running(&mut self, now_ms: f64) {
        self.state.phase = GamePhase::Running;
        self.state.started_at_ms = Some(now_ms);
        self.state.elapsed_ms = 0.0;
        log::info!("Game started");
    }

    /// Direct positional control of the player paddle
    pub fn set_player_position(&mut self, signal: ControlSignal) {
        if self.state.is_over() {
            return;
        }
        let player = &mut self.state.player;
        player.y = signal.paddle_offset(self.config.field_height, player.height);
    }

    /// Advance the simulation by one frame
    pub fn step(&mut self, now_ms: f64) -> StepOutcome {
        if self.state.phase != GamePhase::Running {
            return StepOutcome::Idle;
        }
        let config = &self.config;
        let state = &mut self.state;

        // 1. Move
        state.ball.position += state.ball.velocity;

        // 2. Top/bottom walls
        let ball = &mut state.ball;
        if ball.position.y - ball.radius < 0.0 {
            ball.velocity.y = ball.velocity.y.abs();
        } else if ball.position.y + ball.radius > config.field_height {
            ball.velocity.y = -ball.velocity.y.abs();
        }

        // 3. Player paddle: a contact only counts while the ball approaches
        if state.ball.velocity.x < 0.0 && state.player.touches(&state.ball) {
            state.ball.velocity.x = state.ball.velocity.x.abs();
            state.score += 1;
            state.ball.velocity *= config.speed_up;
            if let Some(cap) = config.max_ball_speed {
                let speed = state.ball.speed();
                if speed > cap {
                    state.ball.velocity *= cap / speed;
                }
            }
        }

        // 4. AI paddle
        if state.ball.velocity.x > 0.0 && state.ai.touches(&state.ball) {
            state.ball.velocity.x = -state.ball.velocity.x.abs();
        }

        // 5. AI tracks the ball proportionally
        let diff = state.ball.position.y - state.ai.center_y();
        state.ai.y += diff * config.ai_gain;
        state.ai.y = state.ai.y.clamp(0.0, config.field_height - state.ai.height);

        let started = state.started_at_ms.unwrap_or(now_ms);
        state.elapsed_ms = (now_ms - started).max(0.0);

        // 6. Past the player: game over
        if state.ball.position.x < 0.0 {
            state.phase = GamePhase::Over;
            log::info!(
                "Game over: score {}, survived {}s",
                state.score,
                state.elapsed_secs()
            );
            return StepOutcome::GameOver;
        }

        // 7. Past the AI: serve again from the centre, opposite direction
        if state.ball.position.x > config.field_width {
            state.serve_direction = -state.serve_direction;
            state.ball.position = GameState::field_center(config);
            state.ball.velocity = Vector2::new(
                config.serve_velocity.0.abs() * state.serve_direction,
                config.serve_velocity.1,
            );
        }

        StepOutcome::Continue
    }
}
