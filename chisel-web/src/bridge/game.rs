//! Paddle game store and per-frame step
//!
//! The game loop is the only writer of the game state. Each frame it reads
//! the latest observation, maps it to the player paddle, steps the physics
//! and draws.

use super::landmarks::{latest_observation, Observation};
use crate::config::GameConfig;
use crate::exercise::Exercise;
use crate::game::{GameEngine, GamePhase, StepOutcome};
use crate::physics::ControlSignalMapper;
use crate::renderer;
use crate::schedule::LoopControl;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

const COUNTDOWN_TICK_MS: f64 = 1000.0;

struct GameSession {
    engine: GameEngine,
    mapper: ControlSignalMapper,
    /// Timestamp of the last countdown decrement (or of the start)
    last_countdown_ms: Option<f64>,
    paddle_signal: f32,
}

impl GameSession {
    fn new(exercise: Exercise, config: GameConfig) -> Self {
        Self {
            engine: GameEngine::new(config),
            mapper: ControlSignalMapper::new(exercise),
            last_countdown_ms: None,
            paddle_signal: 0.5,
        }
    }

    fn restart(&mut self) {
        self.engine.restart();
        self.last_countdown_ms = None;
    }

    /// Everything a frame does except drawing
    fn frame(&mut self, now_ms: f64, obs: Option<&Observation>) -> LoopControl {
        self.engine.start_if_ready(now_ms);

        if let GamePhase::Countdown(_) = self.engine.state().phase {
            let last = *self.last_countdown_ms.get_or_insert(now_ms);
            if now_ms - last >= COUNTDOWN_TICK_MS {
                self.engine.tick_countdown(now_ms);
                self.last_countdown_ms = Some(last + COUNTDOWN_TICK_MS);
            }
        }

        let signal = self.mapper.map(obs);
        self.paddle_signal = signal.value();
        self.engine.set_player_position(signal);

        match self.engine.step(now_ms) {
            StepOutcome::GameOver => LoopControl::Break,
            StepOutcome::Idle if self.engine.state().is_over() => LoopControl::Break,
            _ => LoopControl::Continue,
        }
    }

    fn snapshot(&self) -> GameSnapshot {
        let state = self.engine.state();
        GameSnapshot {
            score: state.score,
            elapsed_secs: state.elapsed_secs(),
            phase: state.phase,
            paddle_signal: self.paddle_signal,
        }
    }
}

/// Read-only view of the game for the page
#[wasm_bindgen]
#[derive(Clone, Debug, PartialEq)]
pub struct GameSnapshot {
    score: u32,
    elapsed_secs: u32,
    phase: GamePhase,
    paddle_signal: f32,
}

#[wasm_bindgen]
impl GameSnapshot {
    #[wasm_bindgen(getter)]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Whole seconds survived; frozen once the game is over
    #[wasm_bindgen(getter)]
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// Seconds left before play starts, 0 otherwise
    #[wasm_bindgen(getter)]
    pub fn countdown(&self) -> u32 {
        match self.phase {
            GamePhase::Countdown(n) => n,
            _ => 0,
        }
    }

    /// "countdown", "running" or "over"
    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        match self.phase {
            GamePhase::Countdown(_) => "countdown",
            GamePhase::Running => "running",
            GamePhase::Over => "over",
        }
        .to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::Over
    }

    /// Control signal driving the player paddle, 0 (top) to 1 (bottom)
    #[wasm_bindgen(getter)]
    pub fn paddle_signal(&self) -> f32 {
        self.paddle_signal
    }
}

thread_local! {
    static GAME: RefCell<Option<GameSession>> = const { RefCell::new(None) };
}

// ============================================================================
// INTERNAL API (no wasm_bindgen)
// ============================================================================

pub fn begin_game(exercise: Exercise, config: GameConfig) {
    GAME.with(|cell| {
        if let Ok(mut game) = cell.try_borrow_mut() {
            *game = Some(GameSession::new(exercise, config));
        }
    });
}

pub fn end_game() {
    GAME.with(|cell| {
        if let Ok(mut game) = cell.try_borrow_mut() {
            *game = None;
        }
    });
}

/// Fresh state and countdown; returns false when no game exists
pub fn restart_current_game() -> bool {
    GAME.with(|cell| match cell.try_borrow_mut() {
        Ok(mut game) => match game.as_mut() {
            Some(session) => {
                session.restart();
                true
            }
            None => false,
        },
        Err(_) => false,
    })
}

/// Animation-frame body of the game loop
pub fn game_frame(now_ms: f64) -> LoopControl {
    let (_, latest) = latest_observation();
    GAME.with(|cell| {
        let Ok(mut game) = cell.try_borrow_mut() else {
            // re-entrant call, skip this frame
            return LoopControl::Continue;
        };
        let Some(session) = game.as_mut() else {
            return LoopControl::Break;
        };
        let control = session.frame(now_ms, latest.as_ref());
        renderer::render_game(session.engine.state(), session.engine.config());
        control
    })
}

// ============================================================================
// WASM ENTRY POINTS
// ============================================================================

#[wasm_bindgen]
pub fn get_game_snapshot() -> Option<GameSnapshot> {
    GAME.with(|cell| {
        cell.try_borrow()
            .ok()
            .and_then(|game| game.as_ref().map(GameSession::snapshot))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(config: GameConfig) -> GameSession {
        GameSession::new(Exercise::PushUps, config)
    }

    #[test]
    fn test_countdown_follows_frame_time() {
        let mut game = session(GameConfig {
            countdown_secs: 3,
            ..GameConfig::default()
        });
        let mut now = 0.0;
        while now < 2_990.0 {
            assert_eq!(game.frame(now, None), LoopControl::Continue);
            now += 10.0;
        }
        assert_eq!(game.snapshot().phase(), "countdown");
        assert_eq!(game.snapshot().countdown(), 1);

        game.frame(3_000.0, None);
        assert_eq!(game.snapshot().phase(), "running");
        assert_eq!(game.engine.state().started_at_ms, Some(3_000.0));
    }

    #[test]
    fn test_missing_pose_maps_to_neutral_angle() {
        let mut game = session(GameConfig {
            countdown_secs: 0,
            ..GameConfig::default()
        });
        game.frame(0.0, None);
        // 90 degrees in [70, 160]
        let expected = (90.0 - 70.0) / 90.0;
        assert!((game.snapshot().paddle_signal() - expected).abs() < 1e-6);
        assert!((game.engine.state().player.y - expected * 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_loop_breaks_when_over_and_restarts() {
        // AI never moves, so the first serve gets past it and the
        // return serve gets past the idle player
        let mut game = session(GameConfig {
            countdown_secs: 0,
            ai_gain: 0.0,
            ..GameConfig::default()
        });
        let mut now = 0.0;
        let mut control = LoopControl::Continue;
        for _ in 0..1_000 {
            control = game.frame(now, None);
            if control == LoopControl::Break {
                break;
            }
            now += 16.0;
        }
        assert_eq!(control, LoopControl::Break);
        assert!(game.snapshot().is_over());
        assert_eq!(game.snapshot().score(), 0);
        let elapsed = game.snapshot().elapsed_secs();
        assert_eq!(game.frame(now + 16.0, None), LoopControl::Break);
        assert_eq!(game.snapshot().elapsed_secs(), elapsed);

        game.restart();
        assert_eq!(game.frame(now + 32.0, None), LoopControl::Continue);
        assert_eq!(game.snapshot().phase(), "running");
    }
}
