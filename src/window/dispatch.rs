//! Turns backend events into state updates and callbacks.
//!
//! Every backend reports what the platform told it, duplicates included. The
//! dispatcher is the single place where notifications are gated, so all
//! backends share the same observable behavior:
//!
//! * Motion, resize and move are change-gated. A value equal to the tracked
//!   one updates nothing and notifies nobody; a different value is stored
//!   first and then reported.
//! * Resizes reported while the window is minimized are dropped.
//! * Keys, buttons, focus and enter/exit are reported whenever they arrive.
//! * A close request moves the window to [`Lifecycle::Closing`] before the
//!   close callback runs, and the callback runs exactly once per window.
//! * A destroyed window reports nothing.
//!
//! [`Lifecycle::Closing`]: crate::window::Lifecycle::Closing

use crate::{
    backend::BackendEvent,
    window::{callbacks::Callbacks, state::WindowState, Lifecycle},
};

use ::tracing::trace;

#[derive(Debug)]
pub(crate) struct EventDispatcher {
    pub(crate) state: WindowState,
    pub(crate) callbacks: Callbacks,
}

impl EventDispatcher {
    pub(crate) fn new(state: WindowState) -> Self {
        Self {
            state,
            callbacks: Callbacks::default(),
        }
    }

    pub(crate) fn dispatch(&mut self, event: BackendEvent) {
        if self.state.lifecycle() == Lifecycle::Destroyed {
            trace!(?event, "Event for destroyed window dropped");
            return;
        }

        let Self { state, callbacks } = self;
        match event {
            BackendEvent::KeyPress(code) => callbacks.emit_key_press(code),
            BackendEvent::KeyRelease(code) => callbacks.emit_key_release(code),
            BackendEvent::CursorMoved { x, y } => {
                if state.move_cursor(x, y) {
                    callbacks.emit_mouse_motion(x, y);
                } else {
                    trace!(x, y, "Duplicate motion suppressed");
                }
            }
            BackendEvent::Moved { x, y } => {
                if state.move_to(x, y) {
                    callbacks.emit_moved(x, y);
                } else {
                    trace!(x, y, "Duplicate move suppressed");
                }
            }
            BackendEvent::Resized { width, height } => {
                if state.is_minimized() {
                    trace!(width, height, "Resize while minimized suppressed");
                } else if state.resize(width, height) {
                    callbacks.emit_resize(width, height);
                } else {
                    trace!(width, height, "Duplicate resize suppressed");
                }
            }
            BackendEvent::Minimized(minimized) => state.set_minimized(minimized),
            BackendEvent::Focus(focused) => {
                state.set_focused(focused);
                callbacks.emit_focus(focused);
            }
            BackendEvent::CursorEntered(entered) => {
                state.set_mouse_inside(entered);
                callbacks.emit_mouse_enter_exit(entered);
            }
            BackendEvent::CloseRequested => {
                if state.request_close() {
                    callbacks.emit_close();
                } else {
                    trace!(lifecycle = %state.lifecycle(), "Repeated close request ignored");
                }
            }
        }
    }
}
