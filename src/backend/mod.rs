//! Native windowing backends.
//!
//! A [`Backend`] owns one native window together with whatever context the
//! platform needs to drive it (a display connection, a registered window
//! class). It turns the platform's native events into [`BackendEvent`]s,
//! which are already expressed in the unified vocabulary but not yet
//! change-gated. Gating, state tracking and callback dispatch happen in
//! [`window`](crate::window), identically for every backend.
//!
//! Exactly one backend drives each window. [`platform_default`] selects the
//! native backend at build time; [`Builder::build_with_backend`] allows a
//! different one to be chosen at startup.
//!
//! [`Builder::build_with_backend`]: crate::window::Builder::build_with_backend

pub mod headless;
#[cfg(windows)]
pub mod win32;
#[cfg(all(
    unix,
    not(any(target_os = "macos", target_os = "ios", target_os = "android"))
))]
pub mod x11;

use crate::{errors::Result, graphics::SurfaceTarget, input::keyboard::KeyCode};

use ::geoms::d2::{Point2D, Size2D};
use ::raw_window_handle::RawDisplayHandle;

/// The properties a native window is created with.
#[derive(Clone, Debug)]
pub struct NativeConfig {
    pub title: String,
    /// Size of the client area in pixels. Both dimensions are non-zero.
    pub size: Size2D<u32>,
    /// Requested position in the platform's screen coordinates.
    pub position: Point2D<i32>,
}

/// A native event, translated into the unified vocabulary by a backend.
///
/// Backends report what the platform told them, duplicates included. The
/// window's dispatcher decides which events become callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendEvent {
    /// A key or mouse button was pressed, or the wheel was scrolled.
    KeyPress(KeyCode),
    /// A key or mouse button was released.
    KeyRelease(KeyCode),
    /// The cursor moved within the client area.
    CursorMoved { x: u32, y: u32 },
    /// The window moved on screen.
    Moved { x: i32, y: i32 },
    /// The client area changed size.
    Resized { width: u32, height: u32 },
    /// The window was minimized (`true`) or restored (`false`).
    Minimized(bool),
    /// Keyboard focus was gained (`true`) or lost (`false`).
    Focus(bool),
    /// The cursor entered (`true`) or left (`false`) the client area.
    CursorEntered(bool),
    /// The window manager asked the window to close, or the native window
    /// was destroyed from outside.
    CloseRequested,
}

/// A native windowing system.
///
/// A backend is created empty, owns at most one native window between
/// [`create_native`] and [`destroy_native`], and is driven from the thread
/// that created it.
///
/// [`create_native`]: Backend::create_native
/// [`destroy_native`]: Backend::destroy_native
pub trait Backend {
    /// A short name for logs.
    fn name(&self) -> &'static str;

    /// Opens the native window (and display connection, if the platform uses
    /// one) and returns the handles a rendering surface is created from.
    ///
    /// On failure no native resources remain open.
    fn create_native(&mut self, config: &NativeConfig) -> Result<SurfaceTarget>;

    /// Drains every native event which is pending right now and reports each
    /// to `sink`, in order. Never blocks. Does nothing once the native window
    /// has been destroyed.
    fn pump_events(&mut self, sink: &mut dyn FnMut(BackendEvent));

    /// Releases the native window and display resources. Safe to call more
    /// than once and on a partially created window. Failures are logged.
    fn destroy_native(&mut self);

    /// Translates one of this backend's native key codes.
    fn translate_key(&self, native: u32) -> KeyCode;
}

/// Creates the native backend for the platform this crate was built for.
pub fn platform_default() -> Result<Box<dyn Backend>> {
    #[cfg(windows)]
    {
        Ok(Box::new(win32::Win32Backend::new()))
    }

    #[cfg(all(
        unix,
        not(any(target_os = "macos", target_os = "ios", target_os = "android"))
    ))]
    {
        Ok(Box::new(x11::X11Backend::new()))
    }

    #[cfg(not(any(
        windows,
        all(
            unix,
            not(any(target_os = "macos", target_os = "ios", target_os = "android"))
        )
    )))]
    {
        Err(crate::Error::Unsupported)
    }
}

/// A representative display handle for the default backend. Only the variant
/// is meaningful; it tells which surface extension the platform needs.
pub(crate) fn platform_display_kind() -> Result<RawDisplayHandle> {
    #[cfg(windows)]
    {
        Ok(RawDisplayHandle::Windows(
            ::raw_window_handle::WindowsDisplayHandle::new(),
        ))
    }

    #[cfg(all(
        unix,
        not(any(target_os = "macos", target_os = "ios", target_os = "android"))
    ))]
    {
        Ok(RawDisplayHandle::Xcb(::raw_window_handle::XcbDisplayHandle::new(
            None, 0,
        )))
    }

    #[cfg(not(any(
        windows,
        all(
            unix,
            not(any(target_os = "macos", target_os = "ios", target_os = "android"))
        )
    )))]
    {
        Err(crate::Error::Unsupported)
    }
}
