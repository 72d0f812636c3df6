//! Browser timers - animation-frame loops, intervals and one-shot timeouts
//!
//! Each handle owns its JS closure. Closures only hold a weak reference back
//! to the handle, so dropping the handle frees everything. Cancelling is
//! idempotent and safe to call from inside any callback; dropping must happen
//! outside the handle's own callback.

use crate::error::SessionError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Returned by loop bodies to keep going or stop scheduling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Break,
}

// ============================================================================
// ANIMATION FRAME LOOP
// ============================================================================

struct AnimationInner {
    handle: Cell<Option<i32>>,
    stopped: Cell<bool>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl AnimationInner {
    fn schedule(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Ok(callback) = self.callback.try_borrow() else {
            return;
        };
        if let Some(cb) = callback.as_ref() {
            match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                Ok(id) => self.handle.set(Some(id)),
                Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
            }
        }
    }
}

/// Display-synchronized loop; reschedules itself only while the body
/// returns [`LoopControl::Continue`]
pub struct AnimationLoop {
    inner: Rc<AnimationInner>,
}

impl AnimationLoop {
    pub fn start<F>(mut body: F) -> Result<Self, SessionError>
    where
        F: FnMut(f64) -> LoopControl + 'static,
    {
        web_sys::window().ok_or(SessionError::NoWindow)?;

        let inner = Rc::new(AnimationInner {
            handle: Cell::new(None),
            stopped: Cell::new(false),
            callback: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move |timestamp: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.handle.set(None);
            if inner.stopped.get() {
                return;
            }
            match body(timestamp) {
                LoopControl::Continue if !inner.stopped.get() => inner.schedule(),
                _ => inner.stopped.set(true),
            }
        }) as Box<dyn FnMut(f64)>);

        *inner.callback.borrow_mut() = Some(closure);
        inner.schedule();
        Ok(Self { inner })
    }

    pub fn is_running(&self) -> bool {
        !self.inner.stopped.get()
    }

    /// Stop future frames; pending request is cancelled
    pub fn cancel(&self) {
        self.inner.stopped.set(true);
        if let Some(id) = self.inner.handle.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// FIXED INTERVAL
// ============================================================================

struct IntervalInner {
    handle: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl IntervalInner {
    fn clear(&self) {
        if let Some(id) = self.handle.take() {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(id);
            }
        }
    }
}

/// `setInterval` wrapper
pub struct Interval {
    inner: Rc<IntervalInner>,
}

impl Interval {
    pub fn start<F>(period_ms: u32, mut tick: F) -> Result<Self, SessionError>
    where
        F: FnMut() -> LoopControl + 'static,
    {
        let window = web_sys::window().ok_or(SessionError::NoWindow)?;

        let inner = Rc::new(IntervalInner {
            handle: Cell::new(None),
            callback: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.handle.get().is_none() {
                return;
            }
            if tick() == LoopControl::Break {
                inner.clear();
            }
        }) as Box<dyn FnMut()>);

        let id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                period_ms.min(i32::MAX as u32) as i32,
            )
            .map_err(SessionError::channel)?;
        inner.handle.set(Some(id));
        *inner.callback.borrow_mut() = Some(closure);

        Ok(Self { inner })
    }

    pub fn is_running(&self) -> bool {
        self.inner.handle.get().is_some()
    }

    pub fn cancel(&self) {
        self.inner.clear();
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// ONE-SHOT TIMEOUT
// ============================================================================

struct TimeoutInner {
    handle: Cell<Option<i32>>,
}

/// `setTimeout` wrapper; the callback runs at most once
pub struct Timeout {
    inner: Rc<TimeoutInner>,
    _callback: Closure<dyn FnMut()>,
}

impl Timeout {
    pub fn start<F>(delay_ms: u32, callback: F) -> Result<Self, SessionError>
    where
        F: FnOnce() + 'static,
    {
        let window = web_sys::window().ok_or(SessionError::NoWindow)?;
        let inner = Rc::new(TimeoutInner {
            handle: Cell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::once(move || {
            if let Some(inner) = weak.upgrade() {
                if inner.handle.take().is_some() {
                    callback();
                }
            }
        });

        let id = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                delay_ms.min(i32::MAX as u32) as i32,
            )
            .map_err(SessionError::channel)?;
        inner.handle.set(Some(id));

        Ok(Self {
            inner,
            _callback: closure,
        })
    }

    pub fn cancel(&self) {
        if let Some(id) = self.inner.handle.take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(id);
            }
        }
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.cancel();
    }
}
