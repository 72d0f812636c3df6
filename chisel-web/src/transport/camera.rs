//! Camera capture - getUserMedia stream into a video element, JPEG encode
//! through an offscreen canvas

use crate::config::SessionConfig;
use crate::error::SessionError;
use js_sys::{Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, HtmlCanvasElement, HtmlMediaElement, HtmlVideoElement, MediaStream,
    MediaStreamConstraints, MediaStreamTrack,
};

pub struct Camera {
    video: HtmlVideoElement,
    stream: MediaStream,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    jpeg_quality: f64,
}

/// `{ ideal: n, max: n }`
fn capped(value: u32) -> Result<Object, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &"ideal".into(), &value.into())?;
    Reflect::set(&obj, &"max".into(), &value.into())?;
    Ok(obj)
}

fn video_constraints(width: u32, height: u32) -> Result<MediaStreamConstraints, JsValue> {
    let video = Object::new();
    Reflect::set(&video, &"width".into(), &capped(width)?.into())?;
    Reflect::set(&video, &"height".into(), &capped(height)?.into())?;

    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&video);
    constraints.set_audio(&JsValue::FALSE);
    Ok(constraints)
}

impl Camera {
    /// Request the camera and attach it to the configured video element.
    /// Failure is terminal for the session and not retried.
    pub async fn acquire(config: &SessionConfig) -> Result<Self, SessionError> {
        let window = web_sys::window().ok_or(SessionError::NoWindow)?;
        let document = window.document().ok_or(SessionError::NoDocument)?;

        let video = document
            .get_element_by_id(&config.video_element_id)
            .ok_or_else(|| SessionError::ElementNotFound(config.video_element_id.clone()))?
            .dyn_into::<HtmlVideoElement>()
            .map_err(|_| SessionError::ElementNotFound(config.video_element_id.clone()))?;

        let constraints = video_constraints(config.capture_width, config.capture_height)
            .map_err(SessionError::camera)?;
        let promise = window
            .navigator()
            .media_devices()
            .and_then(|devices| devices.get_user_media_with_constraints(&constraints))
            .map_err(SessionError::camera)?;
        let stream = JsFuture::from(promise)
            .await
            .map_err(SessionError::camera)?
            .dyn_into::<MediaStream>()
            .map_err(SessionError::camera)?;

        video.set_src_object(Some(&stream));
        video.set_muted(true);
        video.set_autoplay(true);
        if let Err(e) = video.play() {
            log::warn!("Video autoplay rejected: {:?}", e);
        }

        let canvas = document
            .create_element("canvas")
            .map_err(SessionError::camera)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(SessionError::camera)?;
        let context = canvas
            .get_context("2d")
            .map_err(SessionError::camera)?
            .ok_or_else(|| SessionError::CameraUnavailable("no 2d canvas context".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(SessionError::camera)?;

        log::info!(
            "Camera acquired ({}x{} max)",
            config.capture_width,
            config.capture_height
        );
        Ok(Self {
            video,
            stream,
            canvas,
            context,
            jpeg_quality: config.jpeg_quality,
        })
    }

    /// At least one decodable frame is available
    pub fn has_frame(&self) -> bool {
        self.video.video_width() > 0
            && self.video.ready_state() >= HtmlMediaElement::HAVE_CURRENT_DATA
    }

    /// Current frame as a JPEG data URL
    pub fn capture_jpeg(&self) -> Result<String, SessionError> {
        let (width, height) = (self.video.video_width(), self.video.video_height());
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
        self.context
            .draw_image_with_html_video_element(&self.video, 0.0, 0.0)
            .map_err(SessionError::camera)?;
        self.canvas
            .to_data_url_with_type_and_encoder_options(
                "image/jpeg",
                &JsValue::from_f64(self.jpeg_quality),
            )
            .map_err(SessionError::camera)
    }

    /// Stop all tracks and detach from the video element
    pub fn stop(&self) {
        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
        self.video.set_src_object(None);
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        self.stop();
    }
}
