//! WebSocket channel to the pose service
//!
//! Owns the socket and its event closures, re-sends `select_exercise` on
//! every (re)connect and retries a bounded number of times after an
//! unexpected close. Everything the page needs to know is reported through
//! a single [`ChannelEvent`] handler.

use super::protocol::{ClientMessage, ConnectionStatus, ServerMessage};
use super::reconnect::ReconnectPolicy;
use crate::error::SessionError;
use crate::exercise::Exercise;
use crate::schedule::Timeout;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Status(ConnectionStatus),
    Message(ServerMessage),
    /// Reconnect attempts exhausted; the channel stays down
    GaveUp,
}

pub type ChannelHandler = Box<dyn FnMut(ChannelEvent)>;

#[derive(Debug, Clone)]
pub struct ChannelOptions {
    pub url: String,
    pub exercise: Exercise,
    /// Socket counts as ready while at most this many bytes are queued
    pub send_buffer_limit: u32,
    pub reconnect_attempts: u32,
    pub reconnect_delay_ms: u32,
}

struct SocketClosures {
    _on_open: Closure<dyn FnMut()>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

struct ChannelInner {
    options: ChannelOptions,
    socket: RefCell<Option<WebSocket>>,
    closures: RefCell<Option<SocketClosures>>,
    reconnect: RefCell<ReconnectPolicy>,
    reconnect_timer: RefCell<Option<Timeout>>,
    /// Closed on purpose; no reconnects
    closed: Cell<bool>,
    /// Current socket reached OPEN
    opened: Cell<bool>,
    /// Current socket reported an error
    errored: Cell<bool>,
    handler: RefCell<ChannelHandler>,
}

pub struct Channel {
    inner: Rc<ChannelInner>,
}

impl Channel {
    pub fn open(options: ChannelOptions, handler: ChannelHandler) -> Result<Self, SessionError> {
        let reconnect = ReconnectPolicy::new(options.reconnect_attempts, options.reconnect_delay_ms);
        let inner = Rc::new(ChannelInner {
            options,
            socket: RefCell::new(None),
            closures: RefCell::new(None),
            reconnect: RefCell::new(reconnect),
            reconnect_timer: RefCell::new(None),
            closed: Cell::new(false),
            opened: Cell::new(false),
            errored: Cell::new(false),
            handler: RefCell::new(handler),
        });
        ChannelInner::connect(&inner)?;
        Ok(Self { inner })
    }

    /// Open and not backed up beyond the configured buffer limit
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    pub fn send(&self, message: &ClientMessage) -> Result<(), SessionError> {
        self.inner.send(message)
    }

    /// Close without reconnecting; idempotent
    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.inner.close();
        if let Some(socket) = self.inner.socket.borrow_mut().take() {
            detach(&socket);
        }
    }
}

/// Status reported when the socket closes. A socket that errored or never
/// opened stays in `Error`; only a clean close of an open socket is
/// `Disconnected`.
fn status_after_close(opened: bool, errored: bool) -> ConnectionStatus {
    if errored || !opened {
        ConnectionStatus::Error
    } else {
        ConnectionStatus::Disconnected
    }
}

fn detach(socket: &WebSocket) {
    socket.set_onopen(None);
    socket.set_onmessage(None);
    socket.set_onerror(None);
    socket.set_onclose(None);
}

impl ChannelInner {
    fn connect(this: &Rc<Self>) -> Result<(), SessionError> {
        let socket = WebSocket::new(&this.options.url).map_err(SessionError::channel)?;
        log::info!("Connecting to {}", this.options.url);

        let weak = Rc::downgrade(this);
        let on_open = Closure::wrap(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.handle_open();
            }
        }) as Box<dyn FnMut()>);

        let weak = Rc::downgrade(this);
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_message(event);
            }
        }) as Box<dyn FnMut(MessageEvent)>);

        let weak = Rc::downgrade(this);
        let on_error = Closure::wrap(Box::new(move |_event: Event| {
            if let Some(inner) = weak.upgrade() {
                log::warn!("Channel error");
                inner.errored.set(true);
                inner.emit(ChannelEvent::Status(ConnectionStatus::Error));
            }
        }) as Box<dyn FnMut(Event)>);

        let weak: Weak<Self> = Rc::downgrade(this);
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            if let Some(inner) = weak.upgrade() {
                log::info!("Channel closed (code {})", event.code());
                ChannelInner::handle_close(&inner);
            }
        }) as Box<dyn FnMut(CloseEvent)>);

        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        this.opened.set(false);
        this.errored.set(false);
        if let Some(old) = this.socket.borrow_mut().replace(socket) {
            detach(&old);
            let _ = old.close();
        }
        *this.closures.borrow_mut() = Some(SocketClosures {
            _on_open: on_open,
            _on_message: on_message,
            _on_error: on_error,
            _on_close: on_close,
        });
        Ok(())
    }

    fn emit(&self, event: ChannelEvent) {
        match self.handler.try_borrow_mut() {
            Ok(mut handler) => handler(event),
            Err(_) => log::warn!("Channel event dropped: handler busy"),
        }
    }

    fn is_ready(&self) -> bool {
        let socket = self.socket.borrow();
        socket.as_ref().is_some_and(|s| {
            s.ready_state() == WebSocket::OPEN
                && s.buffered_amount() <= self.options.send_buffer_limit
        })
    }

    fn send(&self, message: &ClientMessage) -> Result<(), SessionError> {
        let text = message.to_json()?;
        let socket = self.socket.borrow();
        match socket.as_ref() {
            Some(s) if s.ready_state() == WebSocket::OPEN => {
                s.send_with_str(&text).map_err(SessionError::channel)
            }
            _ => Err(SessionError::Channel("not connected".to_string())),
        }
    }

    fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        if let Some(timer) = self.reconnect_timer.borrow_mut().take() {
            timer.cancel();
        }
        if let Some(socket) = self.socket.borrow().as_ref() {
            let _ = socket.close();
        }
    }

    fn handle_open(&self) {
        self.opened.set(true);
        self.reconnect.borrow_mut().reset();
        log::info!("Channel connected");
        self.emit(ChannelEvent::Status(ConnectionStatus::Connected));

        let select = ClientMessage::SelectExercise {
            exercise: self.options.exercise,
        };
        if let Err(e) = self.send(&select) {
            log::warn!("Failed to select exercise: {}", e);
        }
    }

    fn handle_message(&self, event: MessageEvent) {
        let Some(text) = event.data().as_string() else {
            log::debug!("Ignoring non-text channel message");
            return;
        };
        match ServerMessage::from_json(&text) {
            Ok(message) => self.emit(ChannelEvent::Message(message)),
            Err(e) => log::warn!("Dropping malformed server message: {}", e),
        }
    }

    fn handle_close(this: &Rc<Self>) {
        let status = status_after_close(this.opened.get(), this.errored.get());
        this.emit(ChannelEvent::Status(status));
        if this.closed.get() {
            return;
        }

        let delay = this.reconnect.borrow_mut().next_delay();
        let Some(delay_ms) = delay else {
            log::warn!("Giving up on channel after {} attempts", this.reconnect.borrow().attempts());
            this.emit(ChannelEvent::GaveUp);
            return;
        };

        log::info!(
            "Reconnecting in {}ms (attempt {})",
            delay_ms,
            this.reconnect.borrow().attempts()
        );
        let weak = Rc::downgrade(this);
        let timer = Timeout::start(delay_ms, move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.closed.get() {
                return;
            }
            if let Err(e) = ChannelInner::connect(&inner) {
                log::error!("Reconnect failed: {}", e);
                inner.closed.set(true);
                inner.emit(ChannelEvent::GaveUp);
            }
        });
        match timer {
            Ok(timer) => *this.reconnect_timer.borrow_mut() = Some(timer),
            Err(e) => {
                log::error!("Could not schedule reconnect: {}", e);
                this.emit(ChannelEvent::GaveUp);
            }
        }
    }
}
