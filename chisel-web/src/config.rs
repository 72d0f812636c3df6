//! Session configuration supplied by the page as JSON
//!
//! Every field is optional; missing fields take the defaults below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(String),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Geometry and tuning of the paddle game, in field pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub field_width: f32,
    pub field_height: f32,
    pub ball_radius: f32,
    /// Serve velocity in pixels per frame
    pub serve_velocity: (f32, f32),
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub player_paddle_x: f32,
    pub ai_paddle_x: f32,
    pub paddle_start_y: f32,
    /// Multiplier applied to the ball velocity on every player hit
    pub speed_up: f32,
    /// Proportional gain of the AI paddle
    pub ai_gain: f32,
    pub countdown_secs: u32,
    /// Cap on ball speed in pixels per frame; `None` keeps it unbounded
    pub max_ball_speed: Option<f32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            field_width: 800.0,
            field_height: 600.0,
            ball_radius: 12.0,
            serve_velocity: (4.0, 4.0),
            paddle_width: 15.0,
            paddle_height: 100.0,
            player_paddle_x: 20.0,
            ai_paddle_x: 765.0,
            paddle_start_y: 250.0,
            speed_up: 1.05,
            ai_gain: 0.3,
            countdown_secs: 10,
            max_ball_speed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub server_url: String,
    pub video_element_id: String,
    pub capture_width: u32,
    pub capture_height: u32,
    pub jpeg_quality: f64,
    pub frame_interval_ms: u32,
    /// Frames are only sent while the socket has at most this many bytes queued
    pub send_buffer_limit: u32,
    pub reconnect_attempts: u32,
    pub reconnect_delay_ms: u32,
    pub game: GameConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8765".to_string(),
            video_element_id: "camera-video".to_string(),
            capture_width: 640,
            capture_height: 480,
            jpeg_quality: 0.8,
            frame_interval_ms: 100,
            send_buffer_limit: 0,
            reconnect_attempts: 5,
            reconnect_delay_ms: 1000,
            game: GameConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate; `None` or an empty string yields the defaults
    pub fn from_json(json: Option<&str>) -> Result<Self, ConfigError> {
        let config = match json.map(str::trim) {
            None | Some("") => Self::default(),
            Some(text) => {
                serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.frame_interval_ms == 0 {
            return invalid("frame_interval_ms must be positive");
        }
        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            return invalid("jpeg_quality must be in (0, 1]");
        }
        if self.capture_width == 0 || self.capture_height == 0 {
            return invalid("capture size must be positive");
        }

        let game = &self.game;
        if game.field_width <= 0.0 || game.field_height <= 0.0 {
            return invalid("field size must be positive");
        }
        if game.paddle_height <= 0.0 || game.paddle_height > game.field_height {
            return invalid("paddle_height must fit inside the field");
        }
        if game.ball_radius <= 0.0 {
            return invalid("ball_radius must be positive");
        }
        if game.speed_up < 1.0 {
            return invalid("speed_up must be at least 1");
        }
        if game.max_ball_speed.is_some_and(|cap| cap <= 0.0) {
            return invalid("max_ball_speed must be positive");
        }
        Ok(())
    }
}
