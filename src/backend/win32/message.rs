//! Conversion of Win32 window messages into backend events.

use crate::{
    backend::{win32::keystroke::KeystrokeFlags, BackendEvent},
    input::{keyboard::KeyCode, translate::win32 as translate},
};

use ::tracing::warn;
use ::windows::Win32::UI::WindowsAndMessaging::{
    WM_CLOSE, WM_DESTROY, WM_KEYDOWN, WM_KEYUP, WM_KILLFOCUS, WM_LBUTTONDOWN, WM_LBUTTONUP,
    WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEHWHEEL, WM_MOUSEMOVE, WM_MOUSEWHEEL, WM_MOVE,
    WM_RBUTTONDOWN, WM_RBUTTONUP, WM_SETFOCUS, WM_SIZE, WM_SYSKEYDOWN, WM_SYSKEYUP,
    WM_XBUTTONDOWN, WM_XBUTTONUP,
};

pub(super) const WM_MOUSELEAVE: u32 = 0x02A3;
pub(super) const WM_DPICHANGED: u32 = 0x02E0;

const SIZE_RESTORED: usize = 0;
const SIZE_MINIMIZED: usize = 1;
const SIZE_MAXIMIZED: usize = 2;

/// Windows parks minimized windows at this position.
const MINIMIZED_POSITION: (i32, i32) = (-32000, -32000);

/// The parameters of a single message received by a window procedure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WindowsProcessMessage {
    pub(crate) umsg: u32,
    pub(crate) wparam: usize,
    pub(crate) lparam: isize,
}

impl WindowsProcessMessage {
    pub(crate) const fn identifier(&self) -> u32 {
        self.umsg
    }

    /// Signed low word of the `LPARAM`.
    const fn lparam_x(&self) -> i32 {
        (self.lparam & 0xFFFF) as u16 as i16 as i32
    }

    /// Signed high word of the `LPARAM`.
    const fn lparam_y(&self) -> i32 {
        ((self.lparam >> 16) & 0xFFFF) as u16 as i16 as i32
    }
}

/// What the window procedure should do with a message after conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// Pass the message on to the default window procedure.
    Default,
    /// The message is fully handled; return zero.
    Handled,
    /// The cursor has just entered the client area. Leave notifications must
    /// be requested before passing the message on.
    TrackLeave,
}

/// Converts one window message, reporting the resulting events to `emit`.
///
/// `cursor_inside` tracks whether the cursor is known to be over the client
/// area. Win32 has no enter notification, so the first motion after the
/// cursor left (or after creation) reports the enter before the motion.
pub(crate) fn convert(
    msg: WindowsProcessMessage,
    cursor_inside: &mut bool,
    emit: &mut dyn FnMut(BackendEvent),
) -> Disposition {
    match msg.identifier() {
        WM_KEYDOWN | WM_SYSKEYDOWN | WM_KEYUP | WM_SYSKEYUP => {
            let flags = match KeystrokeFlags::from_lparam(msg.lparam) {
                Ok(flags) => flags,
                Err(e) => {
                    warn!(?msg, error = %e, "Undecodable keystroke flags");
                    return Disposition::Default;
                }
            };
            let native =
                translate::pack_key(msg.wparam as u16, flags.scan_code, flags.is_extended_key);
            let code = translate::translate_key(native);

            match msg.identifier() {
                WM_KEYDOWN | WM_SYSKEYDOWN => emit(BackendEvent::KeyPress(code)),
                _ => emit(BackendEvent::KeyRelease(code)),
            }

            // System keys still need the default procedure for menus and
            // Alt+F4.
            match msg.identifier() {
                WM_SYSKEYDOWN | WM_SYSKEYUP => Disposition::Default,
                _ => Disposition::Handled,
            }
        }
        WM_LBUTTONDOWN | WM_RBUTTONDOWN | WM_MBUTTONDOWN => {
            emit(BackendEvent::KeyPress(translate::translate_button(
                msg.umsg, msg.wparam,
            )));
            Disposition::Handled
        }
        WM_LBUTTONUP | WM_RBUTTONUP | WM_MBUTTONUP => {
            emit(BackendEvent::KeyRelease(translate::translate_button(
                msg.umsg, msg.wparam,
            )));
            Disposition::Handled
        }
        WM_XBUTTONDOWN => {
            emit(BackendEvent::KeyPress(translate::translate_button(
                msg.umsg, msg.wparam,
            )));
            Disposition::Default
        }
        WM_XBUTTONUP => {
            emit(BackendEvent::KeyRelease(translate::translate_button(
                msg.umsg, msg.wparam,
            )));
            Disposition::Default
        }
        WM_MOUSEWHEEL | WM_MOUSEHWHEEL => {
            let code = translate::translate_wheel(msg.umsg, msg.wparam);
            if code != KeyCode::Unsupported {
                emit(BackendEvent::KeyPress(code));
                emit(BackendEvent::KeyRelease(code));
            }
            Disposition::Handled
        }
        WM_MOUSEMOVE => {
            let entered = !*cursor_inside;
            if entered {
                *cursor_inside = true;
                emit(BackendEvent::CursorEntered(true));
            }
            emit(BackendEvent::CursorMoved {
                x: msg.lparam_x().max(0) as u32,
                y: msg.lparam_y().max(0) as u32,
            });
            if entered {
                Disposition::TrackLeave
            } else {
                Disposition::Handled
            }
        }
        WM_MOUSELEAVE => {
            *cursor_inside = false;
            emit(BackendEvent::CursorEntered(false));
            Disposition::Handled
        }
        WM_MOVE => {
            let (x, y) = (msg.lparam_x(), msg.lparam_y());
            if (x, y) != MINIMIZED_POSITION {
                emit(BackendEvent::Moved { x, y });
            }
            Disposition::Handled
        }
        WM_SIZE => {
            match msg.wparam {
                SIZE_MINIMIZED => emit(BackendEvent::Minimized(true)),
                SIZE_RESTORED | SIZE_MAXIMIZED => {
                    emit(BackendEvent::Minimized(false));
                    emit(BackendEvent::Resized {
                        width: (msg.lparam & 0xFFFF) as u32,
                        height: ((msg.lparam >> 16) & 0xFFFF) as u32,
                    });
                }
                _ => (),
            }
            Disposition::Default
        }
        WM_SETFOCUS => {
            emit(BackendEvent::Focus(true));
            Disposition::Default
        }
        WM_KILLFOCUS => {
            emit(BackendEvent::Focus(false));
            Disposition::Default
        }
        WM_CLOSE => {
            // Closing is up to the owner; the default procedure would destroy
            // the window.
            emit(BackendEvent::CloseRequested);
            Disposition::Handled
        }
        WM_DESTROY => {
            emit(BackendEvent::CloseRequested);
            Disposition::Default
        }
        _ => Disposition::Default,
    }
}
