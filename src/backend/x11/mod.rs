//! The X11 backend, speaking the core protocol through XCB.
//!
//! Each window opens its own connection to the X server, so several windows
//! never share protocol state. The connection is an [`XCBConnection`] because
//! Vulkan's XCB surface extension needs the raw `xcb_connection_t`.

mod event;

use crate::{
    backend::{Backend, BackendEvent, NativeConfig},
    errors::{Context, Error, NativeError, Result},
    graphics::SurfaceTarget,
    input::{keyboard::KeyCode, translate::x11::KeysymTable},
};

use self::event::{CloseProtocol, Followup};

use ::raw_window_handle::{RawDisplayHandle, RawWindowHandle, XcbDisplayHandle, XcbWindowHandle};
use ::std::{
    num::NonZeroU32,
    ptr::NonNull,
};
use ::tracing::{debug, error};
use ::x11rb::{
    connection::Connection,
    properties::{WmSizeHints, WmSizeHintsSpecification},
    protocol::{
        xproto::{
            AtomEnum, ConnectionExt as _, CreateWindowAux, EventMask, PropMode, Window,
            WindowClass,
        },
        Event,
    },
    wrapper::ConnectionExt as _,
    xcb_ffi::XCBConnection,
    COPY_DEPTH_FROM_PARENT,
};

::x11rb::atom_manager! {
    Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        _NET_WM_NAME,
        UTF8_STRING,
    }
}

/// A native X11 window.
#[derive(Default)]
pub struct X11Backend {
    native: Option<Native>,
}

/// The connection and window of an open [`X11Backend`].
struct Native {
    conn: XCBConnection,
    window: Window,
    root: Window,
    close: CloseProtocol,
    keysyms: KeysymTable,
    /// An event read ahead while checking for autorepeat.
    lookahead: Option<Event>,
    /// Set once the window is gone from the server or the connection broke.
    /// Nothing is sent to the server afterwards.
    defunct: bool,
}

impl X11Backend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Fetches the keycode to keysym mapping for the server's whole keycode range.
fn load_keysyms(conn: &XCBConnection) -> Result<KeysymTable> {
    let setup = conn.setup();
    let min_keycode = setup.min_keycode;
    let count = setup
        .max_keycode
        .saturating_sub(min_keycode)
        .saturating_add(1);

    let reply = conn
        .get_keyboard_mapping(min_keycode, count)
        .context("Failed to request keyboard mapping")
        .function("xcb_get_keyboard_mapping")?
        .reply()
        .context("Failed to read keyboard mapping")
        .function("xcb_get_keyboard_mapping_reply")?;

    Ok(KeysymTable::new(
        min_keycode,
        reply.keysyms_per_keycode,
        reply.keysyms,
    ))
}

/// Reads the next queued event without blocking. A broken connection is
/// recorded in `lost` and ends the queue.
fn poll(conn: &XCBConnection, lost: &mut Option<Error>) -> Option<Event> {
    if lost.is_some() {
        return None;
    }

    match conn
        .poll_for_event()
        .context("Lost connection to the X server")
        .function("xcb_poll_for_event")
    {
        Ok(event) => event,
        Err(e) => {
            *lost = Some(e);
            None
        }
    }
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

fn clamp_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

impl Native {
    fn open(config: &NativeConfig) -> Result<(Self, SurfaceTarget)> {
        let (conn, screen_num) = XCBConnection::connect(None)
            .context("Failed to connect to the X server")
            .function("xcb_connect")?;
        let screen = conn.setup().roots.get(screen_num).ok_or_else(|| {
            Error::Native(NativeError::new(format!(
                "X server has no screen {screen_num}"
            )))
        })?;
        let (root, root_visual, black_pixel) =
            (screen.root, screen.root_visual, screen.black_pixel);

        let atoms = Atoms::new(&conn)
            .context("Failed to intern atoms")
            .function("xcb_intern_atom")?
            .reply()
            .context("Failed to intern atoms")
            .function("xcb_intern_atom_reply")?;
        let keysyms = load_keysyms(&conn)?;

        let window = conn
            .generate_id()
            .context("Failed to allocate window id")
            .function("xcb_generate_id")?;
        let event_mask = EventMask::KEY_PRESS
            | EventMask::KEY_RELEASE
            | EventMask::BUTTON_PRESS
            | EventMask::BUTTON_RELEASE
            | EventMask::POINTER_MOTION
            | EventMask::ENTER_WINDOW
            | EventMask::LEAVE_WINDOW
            | EventMask::FOCUS_CHANGE
            | EventMask::STRUCTURE_NOTIFY;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            root,
            clamp_i16(config.position.x),
            clamp_i16(config.position.y),
            clamp_u16(config.size.width),
            clamp_u16(config.size.height),
            0,
            WindowClass::INPUT_OUTPUT,
            root_visual,
            &CreateWindowAux::new()
                .background_pixel(black_pixel)
                .event_mask(event_mask),
        )
        .context("Failed to create window")
        .function("xcb_create_window")?;

        let title = config.title.as_bytes();
        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title,
        )
        .context("Failed to set window title")
        .function("xcb_change_property")?;
        conn.change_property8(
            PropMode::REPLACE,
            window,
            atoms._NET_WM_NAME,
            atoms.UTF8_STRING,
            title,
        )
        .context("Failed to set window title")
        .function("xcb_change_property")?;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.WM_PROTOCOLS,
            AtomEnum::ATOM,
            &[atoms.WM_DELETE_WINDOW],
        )
        .context("Failed to register for close requests")
        .function("xcb_change_property")?;

        // Window managers ignore the position of `CreateWindow` unless the
        // program asks for it through the size hints.
        let mut hints = WmSizeHints::new();
        hints.position = Some((
            WmSizeHintsSpecification::ProgramSpecified,
            config.position.x,
            config.position.y,
        ));
        hints
            .set_normal_hints(&conn, window)
            .context("Failed to set size hints")
            .function("xcb_change_property")?;

        conn.map_window(window)
            .context("Failed to map window")
            .function("xcb_map_window")?;
        conn.flush()
            .context("Failed to flush X connection")
            .function("xcb_flush")?;

        let display = XcbDisplayHandle::new(
            NonNull::new(conn.get_raw_xcb_connection()),
            screen_num as i32,
        );
        let window_handle = NonZeroU32::new(window)
            .map(XcbWindowHandle::new)
            .ok_or_else(|| Error::Native(NativeError::new("X server allocated window id 0")))?;

        let native = Self {
            conn,
            window,
            root,
            close: CloseProtocol {
                wm_protocols: atoms.WM_PROTOCOLS,
                wm_delete_window: atoms.WM_DELETE_WINDOW,
            },
            keysyms,
            lookahead: None,
            defunct: false,
        };
        let target = SurfaceTarget {
            display: RawDisplayHandle::Xcb(display),
            window: RawWindowHandle::Xcb(window_handle),
        };
        Ok((native, target))
    }

    fn pump(&mut self, sink: &mut dyn FnMut(BackendEvent)) {
        while !self.defunct {
            let mut lost = None;
            let event = {
                let conn = &self.conn;
                event::next_folded(&mut self.lookahead, &mut || poll(conn, &mut lost))
            };

            // Whatever was read before the connection broke is reported
            // first.
            if let Some(event) = &event {
                self.handle(event, sink);
            }
            if let Some(e) = lost {
                error!(error = %e);
                self.defunct = true;
                sink(BackendEvent::CloseRequested);
            }
            if event.is_none() {
                break;
            }
        }
    }

    fn handle(&mut self, event: &Event, sink: &mut dyn FnMut(BackendEvent)) {
        match event::convert(event, self.window, self.close, &self.keysyms, sink) {
            Followup::None => (),
            Followup::QueryPosition => match self.screen_position() {
                Ok((x, y)) => sink(BackendEvent::Moved { x, y }),
                Err(e) => error!(error = %e),
            },
            Followup::RefreshKeyboard => match load_keysyms(&self.conn) {
                Ok(keysyms) => {
                    debug!("Keyboard mapping reloaded");
                    self.keysyms = keysyms;
                }
                Err(e) => error!(error = %e),
            },
            Followup::Destroyed => {
                debug!(window = self.window, "X11 window destroyed externally");
                self.defunct = true;
            }
        }
    }

    /// The position of the window's origin in root coordinates.
    fn screen_position(&self) -> Result<(i32, i32)> {
        let reply = self
            .conn
            .translate_coordinates(self.window, self.root, 0, 0)
            .context("Failed to request window position")
            .function("xcb_translate_coordinates")?
            .reply()
            .context("Failed to read window position")
            .function("xcb_translate_coordinates_reply")?;

        Ok((i32::from(reply.dst_x), i32::from(reply.dst_y)))
    }

    fn close(self) {
        if self.defunct {
            return;
        }

        let result = self
            .conn
            .destroy_window(self.window)
            .and_then(|_| self.conn.flush())
            .context("Failed to destroy window")
            .function("xcb_destroy_window");
        if let Err(e) = result {
            error!(error = %e);
        }
    }
}

impl Backend for X11Backend {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn create_native(&mut self, config: &NativeConfig) -> Result<SurfaceTarget> {
        debug!(wnd_title = %config.title, "Creating X11 window");
        let (native, target) = Native::open(config)?;
        self.native = Some(native);
        Ok(target)
    }

    fn pump_events(&mut self, sink: &mut dyn FnMut(BackendEvent)) {
        if let Some(native) = self.native.as_mut() {
            native.pump(sink);
        }
    }

    fn destroy_native(&mut self) {
        if let Some(native) = self.native.take() {
            debug!(window = native.window, "Destroying X11 window");
            native.close();
        }
    }

    fn translate_key(&self, native: u32) -> KeyCode {
        let keycode = u8::try_from(native).unwrap_or_default();
        self.native
            .as_ref()
            .map(|native| native.keysyms.translate(keycode))
            .unwrap_or(KeyCode::Unsupported)
    }
}

impl Drop for X11Backend {
    fn drop(&mut self) {
        self.destroy_native();
    }
}
