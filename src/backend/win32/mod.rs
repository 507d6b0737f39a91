//! The Win32 backend.
//!
//! Every window owns a [`Mailbox`] which the shared window procedure fills
//! with converted events. Window handles are mapped to mailboxes through a
//! per-thread registry, so the window procedure never dereferences pointers
//! stored in window user data. Pumping a window dispatches only that window's
//! messages. While a pump runs, its sink is attached to the mailbox and the
//! window procedure delivers converted events straight away, so events raised
//! inside modal loops (interactive sizing and moving) arrive as they happen.

mod class;
mod keystroke;
mod message;

use crate::{
    backend::{Backend, BackendEvent, NativeConfig},
    errors::{Context, Result},
    graphics::SurfaceTarget,
    input::{keyboard::KeyCode, translate},
};

use self::{
    class::WindowClass,
    message::{Disposition, WindowsProcessMessage, WM_DPICHANGED},
};

use ::raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, Win32WindowHandle, WindowsDisplayHandle,
};
use ::std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    mem,
    num::NonZeroIsize,
    rc::Rc,
    sync::{Arc, Once},
};
use ::tap::Pipe;
use ::tracing::{debug, error, trace};
use ::widestring::U16CString;
use ::windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM},
        Graphics::Gdi::UpdateWindow,
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            Input::KeyboardAndMouse::{TrackMouseEvent, TME_LEAVE, TRACKMOUSEEVENT},
            WindowsAndMessaging::{
                AdjustWindowRectEx, CreateWindowExW, DefWindowProcW, DestroyWindow,
                DispatchMessageW, IsWindow, PeekMessageW, SetProcessDPIAware, SetWindowPos,
                ShowWindow, TranslateMessage, MSG, PM_REMOVE, SWP_NOACTIVATE, SWP_NOZORDER,
                SW_SHOWNORMAL, WINDOW_EX_STYLE, WS_OVERLAPPEDWINDOW,
            },
        },
    },
};

const CLASS_NAME: &str = "SurferWindow";

static DPI_AWARENESS: Once = Once::new();

thread_local! {
    /// Mailboxes of the live windows created on this thread, by handle.
    static MAILBOXES: RefCell<HashMap<isize, Rc<Mailbox>>> = RefCell::new(HashMap::new());

    /// The mailbox of a window which is being created. Messages sent from
    /// within `CreateWindowExW` arrive before its handle is known; the first
    /// of them binds this mailbox to the new handle.
    static PENDING: RefCell<Option<Rc<Mailbox>>> = RefCell::new(None);
}

/// The sink of the pump currently running for a window.
type Sink = *mut dyn FnMut(BackendEvent);

/// Events converted by the window procedure, waiting for delivery.
#[derive(Debug, Default)]
struct Mailbox {
    events: RefCell<Vec<BackendEvent>>,
    cursor_inside: Cell<bool>,
    sink: Cell<Option<Sink>>,
    delivering: Cell<bool>,
}

/// Detaches the sink from its mailbox when the pump returns.
struct Attached<'m> {
    mailbox: &'m Mailbox,
}

impl Drop for Attached<'_> {
    fn drop(&mut self) {
        self.mailbox.sink.set(None);
    }
}

impl Mailbox {
    fn receive(&self, msg: WindowsProcessMessage) -> Disposition {
        let mut cursor_inside = self.cursor_inside.get();
        let disposition = {
            let mut events = self.events.borrow_mut();
            message::convert(msg, &mut cursor_inside, &mut |e| events.push(e))
        };
        self.cursor_inside.set(cursor_inside);
        disposition
    }

    /// Makes `sink` the receiver of this mailbox's events until the returned
    /// guard is dropped.
    fn attach<'m>(&'m self, sink: &mut dyn FnMut(BackendEvent)) -> Attached<'m> {
        let sink: *mut (dyn FnMut(BackendEvent) + '_) = sink;
        // SAFETY: Only the lifetime bound is erased. The guard clears the
        // pointer before the borrow of `sink` ends.
        let sink: Sink = unsafe { mem::transmute(sink) };
        self.sink.set(Some(sink));
        Attached { mailbox: self }
    }

    /// Hands every waiting event to the attached sink. Events stay queued
    /// while no sink is attached, or while the sink is already running
    /// further up the stack; the outer delivery picks them up.
    fn deliver(&self) {
        let Some(sink) = self.sink.get() else {
            return;
        };
        if self.delivering.replace(true) {
            return;
        }

        loop {
            let events = mem::take(&mut *self.events.borrow_mut());
            if events.is_empty() {
                break;
            }
            for event in events {
                // SAFETY: The pointer is attached for the duration of the
                // pump which owns the sink, and `delivering` rules out a
                // second live reference.
                unsafe { (*sink)(event) };
            }
        }

        self.delivering.set(false);
    }
}

/// Removes every registry entry pointing at `mailbox`.
fn unregister(mailbox: &Rc<Mailbox>) {
    MAILBOXES.with(|mailboxes| {
        mailboxes
            .borrow_mut()
            .retain(|_, registered| !Rc::ptr_eq(registered, mailbox))
    });
}

/// A native Win32 window.
#[derive(Default)]
pub struct Win32Backend {
    /// Keeps the window class registered while the window exists.
    class: Option<Arc<WindowClass>>,
    hwnd: Option<HWND>,
    mailbox: Option<Rc<Mailbox>>,
}

impl Win32Backend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The window procedure shared by all surfer windows.
    extern "system" fn wnd_proc(
        hwnd: HWND,
        umsg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        let mailbox = MAILBOXES.with(|mailboxes| {
            let mut mailboxes = mailboxes.borrow_mut();
            if !mailboxes.contains_key(&hwnd.0) {
                if let Some(pending) = PENDING.with(|p| p.borrow_mut().take()) {
                    mailboxes.insert(hwnd.0, pending);
                }
            }
            mailboxes.get(&hwnd.0).cloned()
        });

        let Some(mailbox) = mailbox else {
            return unsafe { DefWindowProcW(hwnd, umsg, wparam, lparam) };
        };

        let msg = WindowsProcessMessage {
            umsg,
            wparam: wparam.0,
            lparam: lparam.0,
        };
        trace!(?msg, "Window message");

        if umsg == WM_DPICHANGED {
            // SAFETY: For WM_DPICHANGED the LPARAM points to a RECT which is
            // valid for the duration of the message.
            let suggested = unsafe { *(lparam.0 as *const RECT) };
            reposition(hwnd, suggested);
            return LRESULT(0);
        }

        let disposition = mailbox.receive(msg);
        mailbox.deliver();

        match disposition {
            Disposition::Handled => LRESULT(0),
            Disposition::TrackLeave => {
                track_mouse_leave(hwnd);
                unsafe { DefWindowProcW(hwnd, umsg, wparam, lparam) }
            }
            Disposition::Default => unsafe { DefWindowProcW(hwnd, umsg, wparam, lparam) },
        }
    }
}

/// Moves and resizes a window to the rectangle suggested for its new DPI.
fn reposition(hwnd: HWND, rect: RECT) {
    let result = unsafe {
        SetWindowPos(
            hwnd,
            HWND::default(),
            rect.left,
            rect.top,
            rect.right - rect.left,
            rect.bottom - rect.top,
            SWP_NOZORDER | SWP_NOACTIVATE,
        )
    }
    .ok()
    .context("Failed to apply DPI change")
    .function("SetWindowPos");

    if let Err(e) = result {
        error!(error = %e);
    }
}

/// Requests a `WM_MOUSELEAVE` once the cursor leaves the client area.
fn track_mouse_leave(hwnd: HWND) {
    let mut tme = TRACKMOUSEEVENT {
        cbSize: mem::size_of::<TRACKMOUSEEVENT>() as u32,
        dwFlags: TME_LEAVE,
        hwndTrack: hwnd,
        dwHoverTime: 0,
    };
    let result = unsafe { TrackMouseEvent(&mut tme) }
        .ok()
        .context("Failed to track mouse leave")
        .function("TrackMouseEvent");

    if let Err(e) = result {
        error!(error = %e);
    }
}

impl Backend for Win32Backend {
    fn name(&self) -> &'static str {
        "win32"
    }

    fn create_native(&mut self, config: &NativeConfig) -> Result<SurfaceTarget> {
        debug!(wnd_title = %config.title, "Creating Win32 window");

        DPI_AWARENESS.call_once(|| {
            if !unsafe { SetProcessDPIAware() }.as_bool() {
                debug!("Process DPI awareness could not be set");
            }
        });

        let class = WindowClass::get_or_create(CLASS_NAME, Self::wnd_proc)?;
        let module = unsafe { GetModuleHandleW(None) }
            .context("Failed to construct new window")
            .function("GetModuleHandleW")?;
        let title = U16CString::from_str_truncate(&config.title);

        // The requested size is the client area; grow it by the frame.
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: config.size.width as i32,
            bottom: config.size.height as i32,
        };
        unsafe {
            AdjustWindowRectEx(
                &mut rect,
                WS_OVERLAPPEDWINDOW,
                false,
                WINDOW_EX_STYLE::default(),
            )
        }
        .ok()
        .context("Failed to calculate window size")
        .function("AdjustWindowRectEx")?;

        let mailbox = Rc::new(Mailbox::default());
        PENDING.with(|p| *p.borrow_mut() = Some(mailbox.clone()));
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                PCWSTR::from_raw(class.class_name().as_ptr()),
                PCWSTR::from_raw(title.as_ptr()),
                WS_OVERLAPPEDWINDOW,
                config.position.x,
                config.position.y,
                rect.right - rect.left,
                rect.bottom - rect.top,
                None,
                None,
                module,
                None,
            )
        };
        PENDING.with(|p| p.borrow_mut().take());
        let created = hwnd
            .0
            .pipe(NonZeroIsize::new)
            .context("Failed to create window")
            .function("CreateWindowExW");
        if created.is_err() {
            // Messages sent before creation failed may have bound the
            // mailbox to the dead handle.
            unregister(&mailbox);
        }
        let raw_hwnd = created?;

        unsafe {
            ShowWindow(hwnd, SW_SHOWNORMAL);
            UpdateWindow(hwnd);
        }

        self.class = Some(class);
        self.hwnd = Some(hwnd);
        self.mailbox = Some(mailbox);

        let mut window = Win32WindowHandle::new(raw_hwnd);
        window.hinstance = NonZeroIsize::new(module.0);
        Ok(SurfaceTarget {
            display: RawDisplayHandle::Windows(WindowsDisplayHandle::new()),
            window: RawWindowHandle::Win32(window),
        })
    }

    fn pump_events(&mut self, sink: &mut dyn FnMut(BackendEvent)) {
        let (Some(hwnd), Some(mailbox)) = (self.hwnd, self.mailbox.clone()) else {
            return;
        };

        let _attached = mailbox.attach(sink);

        // Events sent during creation or outside the pump come first.
        mailbox.deliver();

        let mut msg = MSG::default();
        while unsafe { PeekMessageW(&mut msg, hwnd, 0, 0, PM_REMOVE) }.as_bool() {
            unsafe {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
            mailbox.deliver();
        }
    }

    fn destroy_native(&mut self) {
        let Some(hwnd) = self.hwnd.take() else {
            return;
        };
        debug!(hwnd = hwnd.0, "Destroying Win32 window");

        // Unregister first: destruction messages are ours, not requests.
        if let Some(mailbox) = self.mailbox.take() {
            unregister(&mailbox);
        }

        if unsafe { IsWindow(hwnd) }.as_bool() {
            let result = unsafe { DestroyWindow(hwnd) }
                .ok()
                .context("Failed to destroy window")
                .function("DestroyWindow");
            if let Err(e) = result {
                error!(error = %e);
            }
        }

        self.class = None;
    }

    fn translate_key(&self, native: u32) -> KeyCode {
        translate::win32::translate_key(native)
    }
}

impl Drop for Win32Backend {
    fn drop(&mut self) {
        self.destroy_native();
    }
}
