//! Session lifecycle - camera, channel, frame transport and render loops
//!
//! Three independent timing sources run per session: the transport interval,
//! the tracker/overlay animation loop and (in game mode) the game loop.
//! Channel messages land in the landmark and workout stores; the loops read
//! those stores on their next tick.
//!
//! Stopping from a callback only halts (cancels timers, closes the channel).
//! Dropping the session happens from page-initiated calls only.

use super::game;
use super::landmarks::{clear_landmarks, ingest_landmarks, landmark_sequence};
use super::workout;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::exercise::Exercise;
use crate::renderer;
use crate::schedule::{AnimationLoop, Interval, LoopControl};
use crate::speech;
use crate::transport::{
    Camera, Channel, ChannelEvent, ChannelOptions, ClientMessage, ConnectionStatus, FrameDecision,
    FrameGate, ServerMessage,
};
use std::cell::{Cell, RefCell};
use wasm_bindgen::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionMode {
    Workout,
    Game,
}

struct Session {
    mode: SessionMode,
    exercise: Exercise,
    camera: Camera,
    channel: Channel,
    gate: FrameGate,
    transport: Interval,
    tracker_loop: AnimationLoop,
    game_loop: Option<AnimationLoop>,
}

impl Session {
    /// One transport tick: send the current frame or skip it
    fn send_frame(&mut self) {
        let decision = self
            .gate
            .decide(self.channel.is_ready(), self.camera.has_frame());
        if decision == FrameDecision::Send {
            let sent = self
                .camera
                .capture_jpeg()
                .and_then(|frame| self.channel.send(&ClientMessage::VideoFrame { frame }));
            if let Err(e) = sent {
                log::debug!("Frame dropped: {}", e);
                self.gate.record_failure();
            }
        }
        renderer::update_transport_metrics(self.gate.counters(), landmark_sequence());
    }

    /// Stop all timers, the channel and the camera. Safe from any callback.
    fn halt(&self) {
        self.transport.cancel();
        self.tracker_loop.cancel();
        if let Some(game_loop) = &self.game_loop {
            game_loop.cancel();
        }
        self.channel.close();
        self.camera.stop();
        speech::cancel();
        log::info!("{:?} session for {} halted", self.mode, self.exercise);
    }

    fn is_active(&self) -> bool {
        self.transport.is_running() && !self.channel.is_closed()
    }
}

thread_local! {
    static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
    /// Bumped on every start/stop so a superseded async start can bail out
    static GENERATION: Cell<u64> = const { Cell::new(0) };
}

fn next_generation() -> u64 {
    GENERATION.with(|g| {
        let next = g.get() + 1;
        g.set(next);
        next
    })
}

/// Drop the current session. Page-initiated calls only.
fn teardown() {
    let previous = SESSION.with(|cell| cell.try_borrow_mut().ok().and_then(|mut s| s.take()));
    if let Some(session) = previous {
        session.halt();
    }
}

/// Halt without dropping; used from channel callbacks
fn halt_session() {
    SESSION.with(|cell| match cell.try_borrow() {
        Ok(session) => {
            if let Some(session) = session.as_ref() {
                session.halt();
            }
        }
        Err(_) => log::warn!("Session busy, halt skipped"),
    });
}

fn on_channel_event(event: ChannelEvent) {
    match event {
        ChannelEvent::Status(status) => workout::set_connection_status(status),
        ChannelEvent::Message(ServerMessage::Update(update)) => {
            workout::apply_rep_update(&update);
            ingest_landmarks(update.landmarks);
        }
        ChannelEvent::Message(ServerMessage::WorkoutSummary(summary)) => {
            log::info!(
                "Workout summary: {} reps, avg score {:.1}",
                summary.total_reps,
                summary.avg_score
            );
            workout::set_summary(summary);
            halt_session();
        }
        ChannelEvent::Message(ServerMessage::ExerciseSelected { exercise }) => {
            log::info!("Server tracking {}", exercise);
        }
        ChannelEvent::Message(ServerMessage::Error { message }) => {
            log::warn!("Server error: {}", message);
        }
        // the last close already reported the status
        ChannelEvent::GaveUp => halt_session(),
    }
}

fn transport_tick() -> LoopControl {
    SESSION.with(|cell| {
        let Ok(mut session) = cell.try_borrow_mut() else {
            return LoopControl::Continue;
        };
        match session.as_mut() {
            Some(session) => {
                session.send_frame();
                LoopControl::Continue
            }
            None => LoopControl::Break,
        }
    })
}

fn tracker_frame(timestamp_ms: f64) -> LoopControl {
    workout::tracker_tick();
    renderer::render_overlay();
    renderer::record_frame(timestamp_ms);
    LoopControl::Continue
}

async fn start_session(
    mode: SessionMode,
    exercise: &str,
    config_json: Option<String>,
) -> Result<(), SessionError> {
    let exercise: Exercise = exercise
        .parse()
        .map_err(|_| SessionError::UnknownExercise(exercise.to_string()))?;
    let config = SessionConfig::from_json(config_json.as_deref())?;

    teardown();
    let generation = next_generation();

    clear_landmarks();
    renderer::reset_metrics();
    workout::begin_workout(exercise);
    match mode {
        SessionMode::Game => game::begin_game(exercise, config.game.clone()),
        SessionMode::Workout => game::end_game(),
    }
    log::info!("Starting {:?} session for {}", mode, exercise.display_name());

    let camera = match Camera::acquire(&config).await {
        Ok(camera) => camera,
        Err(e) => {
            log::error!("{}", e);
            workout::set_camera_error(e.to_string());
            return Err(e);
        }
    };
    if GENERATION.with(Cell::get) != generation {
        log::info!("Session superseded while waiting for the camera");
        return Ok(());
    }

    let channel = Channel::open(
        ChannelOptions {
            url: config.server_url.clone(),
            exercise,
            send_buffer_limit: config.send_buffer_limit,
            reconnect_attempts: config.reconnect_attempts,
            reconnect_delay_ms: config.reconnect_delay_ms,
        },
        Box::new(on_channel_event),
    )?;
    let transport = Interval::start(config.frame_interval_ms, transport_tick)?;
    let tracker_loop = AnimationLoop::start(tracker_frame)?;
    let game_loop = match mode {
        SessionMode::Game => Some(AnimationLoop::start(game::game_frame)?),
        SessionMode::Workout => None,
    };

    SESSION.with(|cell| -> Result<(), SessionError> {
        let mut slot = cell.try_borrow_mut().map_err(|_| SessionError::Busy)?;
        *slot = Some(Session {
            mode,
            exercise,
            camera,
            channel,
            gate: FrameGate::new(),
            transport,
            tracker_loop,
            game_loop,
        });
        Ok(())
    })
}

// ============================================================================
// WASM ENTRY POINTS
// ============================================================================

/// Start camera, channel and the phase indicator for `exercise`
/// (`pushups`, `pullups` or `squats`). `config_json` may be omitted.
#[wasm_bindgen]
pub async fn start_workout(exercise: String, config_json: Option<String>) -> Result<(), JsValue> {
    start_session(SessionMode::Workout, &exercise, config_json)
        .await
        .map_err(JsValue::from)
}

/// Same as `start_workout`, plus the paddle game driven by the exercise
#[wasm_bindgen]
pub async fn start_game(exercise: String, config_json: Option<String>) -> Result<(), JsValue> {
    start_session(SessionMode::Game, &exercise, config_json)
        .await
        .map_err(JsValue::from)
}

/// Stop sending frames and ask the service for the summary. The session
/// halts once the summary arrives, or right away if the channel is down.
#[wasm_bindgen]
pub fn end_workout() -> Result<(), JsValue> {
    SESSION
        .with(|cell| -> Result<(), SessionError> {
            let session = cell.try_borrow().map_err(|_| SessionError::Busy)?;
            let Some(session) = session.as_ref() else {
                return Ok(());
            };
            session.transport.cancel();
            session.tracker_loop.cancel();
            if let Some(game_loop) = &session.game_loop {
                game_loop.cancel();
            }
            match session.channel.send(&ClientMessage::EndWorkout) {
                Ok(()) => {
                    log::info!("Requested workout summary");
                    Ok(())
                }
                Err(e) => {
                    session.halt();
                    Err(e)
                }
            }
        })
        .map_err(JsValue::from)
}

/// New game state and countdown; restarts the game loop if it had stopped
#[wasm_bindgen]
pub fn restart_game() -> Result<(), JsValue> {
    if !game::restart_current_game() {
        return Err(SessionError::NoGame.into());
    }
    SESSION
        .with(|cell| -> Result<(), SessionError> {
            let mut session = cell.try_borrow_mut().map_err(|_| SessionError::Busy)?;
            let Some(session) = session.as_mut() else {
                return Err(SessionError::NoGame);
            };
            let running = session
                .game_loop
                .as_ref()
                .is_some_and(AnimationLoop::is_running);
            if !running {
                session.game_loop = Some(AnimationLoop::start(game::game_frame)?);
            }
            Ok(())
        })
        .map_err(JsValue::from)
}

/// Tear everything down and release the camera
#[wasm_bindgen]
pub fn stop_session() {
    next_generation();
    teardown();
    game::end_game();
    clear_landmarks();
    workout::set_connection_status(ConnectionStatus::Disconnected);
}

#[wasm_bindgen]
pub fn is_session_active() -> bool {
    SESSION.with(|cell| {
        cell.try_borrow()
            .map(|s| s.as_ref().is_some_and(Session::is_active))
            .unwrap_or(false)
    })
}
