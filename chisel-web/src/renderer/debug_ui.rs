//! Performance metrics for the debug overlay
//!
//! Tracks render FPS and frame-transport counters for real-time display.

use crate::transport::FrameCounters;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

/// Frames slower than this (tab backgrounded, first frame) are ignored
const MAX_FRAME_MS: f64 = 200.0;

#[derive(Debug, Default)]
struct Metrics {
    fps: f64,
    frame_time_ms: f64,
    last_frame_ms: Option<f64>,
    frames: FrameCounters,
    landmark_updates: u64,
}

impl Metrics {
    fn record_frame(&mut self, timestamp_ms: f64) {
        let previous = self.last_frame_ms.replace(timestamp_ms);
        let Some(previous) = previous else {
            return;
        };
        let dt = timestamp_ms - previous;
        if !(1.0..=MAX_FRAME_MS).contains(&dt) {
            return;
        }
        // Exponential moving average for smooth display
        if self.frame_time_ms == 0.0 {
            self.frame_time_ms = dt;
        } else {
            self.frame_time_ms = self.frame_time_ms * 0.9 + dt * 0.1;
        }
        self.fps = 1000.0 / self.frame_time_ms;
    }

    fn overlay_text(&self) -> String {
        format!(
            "FPS: {:.0} | Frame: {:.1}ms\n\
             Frames sent: {} | busy: {} | no camera: {} | failed: {}\n\
             Landmark updates: {}",
            self.fps,
            self.frame_time_ms,
            self.frames.sent,
            self.frames.skipped_channel,
            self.frames.skipped_no_frame,
            self.frames.failed,
            self.landmark_updates,
        )
    }
}

thread_local! {
    static METRICS: RefCell<Metrics> = RefCell::new(Metrics::default());
}

/// Called from each render loop tick with the animation-frame timestamp
pub fn record_frame(timestamp_ms: f64) {
    METRICS.with(|m| {
        if let Ok(mut metrics) = m.try_borrow_mut() {
            metrics.record_frame(timestamp_ms);
        }
    });
}

pub fn update_transport_metrics(frames: FrameCounters, landmark_updates: u64) {
    METRICS.with(|m| {
        if let Ok(mut metrics) = m.try_borrow_mut() {
            metrics.frames = frames;
            metrics.landmark_updates = landmark_updates;
        }
    });
}

pub fn reset_metrics() {
    METRICS.with(|m| {
        if let Ok(mut metrics) = m.try_borrow_mut() {
            *metrics = Metrics::default();
        }
    });
}

// ============================================================================
// WASM ENTRY POINTS
// ============================================================================

/// Get formatted overlay text (called from JS to update HTML)
#[wasm_bindgen]
pub fn get_debug_overlay_text() -> String {
    METRICS.with(|m| m.borrow().overlay_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_from_timestamps() {
        let mut metrics = Metrics::default();
        let mut t = 0.0;
        for _ in 0..120 {
            metrics.record_frame(t);
            t += 1000.0 / 60.0;
        }
        assert!((metrics.fps - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_ignores_stalls() {
        let mut metrics = Metrics::default();
        metrics.record_frame(0.0);
        metrics.record_frame(16.0);
        let before = metrics.frame_time_ms;
        // backgrounded tab
        metrics.record_frame(5000.0);
        assert_eq!(metrics.frame_time_ms, before);
    }

    #[test]
    fn test_overlay_text_counters() {
        let metrics = Metrics {
            frames: FrameCounters {
                sent: 12,
                skipped_channel: 3,
                skipped_no_frame: 1,
                failed: 0,
            },
            ..Metrics::default()
        };
        let text = metrics.overlay_text();
        assert!(text.contains("Frames sent: 12 | busy: 3 | no camera: 1"));
    }
}
