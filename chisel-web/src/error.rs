//! Session-level errors surfaced to the page

use crate::config::ConfigError;
use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No window found")]
    NoWindow,
    #[error("No document found")]
    NoDocument,
    #[error("No element with id '{0}' found")]
    ElementNotFound(String),
    /// Terminal for the session; the user restarts to retry
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("Channel error: {0}")]
    Channel(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Unknown exercise '{0}'")]
    UnknownExercise(String),
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("No game in progress")]
    NoGame,
    #[error("Session busy, try again")]
    Busy,
}

impl SessionError {
    /// Build from a JS exception value
    pub fn camera(err: impl Into<JsValue>) -> Self {
        SessionError::CameraUnavailable(js_error_text(&err.into()))
    }

    pub fn channel(err: impl Into<JsValue>) -> Self {
        SessionError::Channel(js_error_text(&err.into()))
    }
}

impl From<SessionError> for JsValue {
    fn from(err: SessionError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Best-effort readable text from a thrown JS value
fn js_error_text(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    js_sys::Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", err))
}
