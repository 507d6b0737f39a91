//! The authoritative record of what a window looks like right now.

use crate::backend::NativeConfig;

use ::strum::{Display, IntoStaticStr};

/// Where a window is in its life.
///
/// A window starts `Open`. A close request from the window manager, or the
/// native window being destroyed from outside, moves it to `Closing`; the
/// window keeps working and must still be torn down. Only an explicit
/// teardown moves it to `Destroyed`, from which there is no way back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum Lifecycle {
    Open,
    Closing,
    Destroyed,
}

/// Geometry, cursor, focus and lifecycle of a window.
///
/// Every mutator reports whether it changed anything, so the dispatcher can
/// decide whether a notification is due.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct WindowState {
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    /// `None` until the first motion event has been seen.
    cursor: Option<(u32, u32)>,
    focused: bool,
    mouse_inside: bool,
    minimized: bool,
    lifecycle: Lifecycle,
}

impl WindowState {
    /// State of a freshly created window: the requested geometry, no cursor,
    /// unfocused, open.
    pub(crate) fn new(config: &NativeConfig) -> Self {
        Self {
            width: config.size.width,
            height: config.size.height,
            x: config.position.x,
            y: config.position.y,
            cursor: None,
            focused: false,
            mouse_inside: false,
            minimized: false,
            lifecycle: Lifecycle::Open,
        }
    }

    pub(crate) fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Last known cursor position, `(0, 0)` until the cursor has moved over
    /// the window.
    pub(crate) fn cursor(&self) -> (u32, u32) {
        self.cursor.unwrap_or_default()
    }

    pub(crate) fn is_focused(&self) -> bool {
        self.focused
    }

    pub(crate) fn is_mouse_inside(&self) -> bool {
        self.mouse_inside
    }

    pub(crate) fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub(crate) fn should_close(&self) -> bool {
        self.lifecycle != Lifecycle::Open
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) -> bool {
        let changed = (self.width, self.height) != (width, height);
        if changed {
            self.width = width;
            self.height = height;
        }
        changed
    }

    pub(crate) fn move_to(&mut self, x: i32, y: i32) -> bool {
        let changed = (self.x, self.y) != (x, y);
        if changed {
            self.x = x;
            self.y = y;
        }
        changed
    }

    pub(crate) fn move_cursor(&mut self, x: u32, y: u32) -> bool {
        let changed = self.cursor != Some((x, y));
        if changed {
            self.cursor = Some((x, y));
        }
        changed
    }

    pub(crate) fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub(crate) fn set_mouse_inside(&mut self, inside: bool) {
        self.mouse_inside = inside;
    }

    pub(crate) fn set_minimized(&mut self, minimized: bool) {
        self.minimized = minimized;
    }

    /// Moves an open window to [`Lifecycle::Closing`]. Returns `true` only for
    /// that transition.
    pub(crate) fn request_close(&mut self) -> bool {
        let transition = self.lifecycle == Lifecycle::Open;
        if transition {
            self.lifecycle = Lifecycle::Closing;
        }
        transition
    }

    /// Moves the window to [`Lifecycle::Destroyed`]. Returns `false` if it
    /// already was.
    pub(crate) fn destroy(&mut self) -> bool {
        let transition = self.lifecycle != Lifecycle::Destroyed;
        self.lifecycle = Lifecycle::Destroyed;
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ::geoms::d2::{Point2D, Size2D};
    use ::pretty_assertions::assert_eq;

    fn state() -> WindowState {
        WindowState::new(&NativeConfig {
            title: String::new(),
            size: Size2D {
                width: 800,
                height: 600,
            },
            position: Point2D { x: 100, y: 100 },
        })
    }

    #[test]
    fn test_initial_state() {
        let state = state();

        assert_eq!(state.size(), (800, 600));
        assert_eq!(state.position(), (100, 100));
        assert_eq!(state.cursor(), (0, 0));
        assert_eq!(state.lifecycle(), Lifecycle::Open);
        assert!(!state.should_close());
        assert!(!state.is_focused());
        assert!(!state.is_mouse_inside());
        assert!(!state.is_minimized());
    }

    /// Mutators report a change only when the value differs.
    #[test]
    fn test_change_detection() {
        let mut state = state();

        assert!(!state.resize(800, 600));
        assert!(state.resize(640, 480));
        assert!(!state.resize(640, 480));
        assert_eq!(state.size(), (640, 480));

        assert!(!state.move_to(100, 100));
        assert!(state.move_to(-20, 40));
        assert_eq!(state.position(), (-20, 40));
    }

    /// The first cursor report is always a change, even at the origin.
    #[test]
    fn test_first_cursor_report() {
        let mut state = state();

        assert!(state.move_cursor(0, 0));
        assert!(!state.move_cursor(0, 0));
        assert!(state.move_cursor(3, 4));
        assert_eq!(state.cursor(), (3, 4));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut state = state();

        assert!(state.request_close());
        assert!(!state.request_close());
        assert_eq!(state.lifecycle(), Lifecycle::Closing);
        assert!(state.should_close());

        assert!(state.destroy());
        assert!(!state.destroy());
        assert!(!state.request_close());
        assert_eq!(state.lifecycle(), Lifecycle::Destroyed);
        assert_eq!(state.lifecycle().to_string(), "Destroyed");
    }
}
