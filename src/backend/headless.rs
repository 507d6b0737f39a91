//! A backend without a display.
//!
//! The headless backend opens no native window. Its "native" events are
//! scripted through a [`HeadlessHandle`] and go through the same translation
//! and normalization rules as the X11 backend's events. It is used to run
//! windows in tests and on machines without a display server, and can be told
//! to fail window creation.

use crate::{
    backend::{Backend, BackendEvent, NativeConfig},
    errors::{Error, NativeError, Result},
    graphics::SurfaceTarget,
    input::{keyboard::KeyCode, translate},
};

use ::raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, WebDisplayHandle, WebWindowHandle,
};
use ::std::{
    cell::RefCell,
    collections::VecDeque,
    rc::Rc,
    sync::atomic::{AtomicU32, Ordering},
};
use ::tracing::{debug, trace};

static NEXT_WINDOW_ID: AtomicU32 = AtomicU32::new(1);

/// A scripted native event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadlessEvent {
    /// A key changed state. `native` is a [`KeyCode`] value; anything outside
    /// the vocabulary translates to [`KeyCode::Unsupported`].
    Key { native: u32, pressed: bool },
    /// A pointer button changed state, numbered like X11 core-protocol
    /// buttons (1 left, 2 middle, 3 right, 4-7 wheel, 8-9 side buttons).
    Button { button: u8, pressed: bool },
    /// The pointer moved to window coordinates `(x, y)`.
    Motion { x: i32, y: i32 },
    /// The window manager reports the window's geometry.
    Configure {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    Minimize,
    Restore,
    FocusIn,
    FocusOut,
    Enter,
    Leave,
    /// The window manager asks the window to close.
    CloseRequest,
    /// The native window was destroyed from outside.
    Destroyed,
}

/// An append-only log of lifecycle steps, shareable between a backend and
/// whatever else (such as a graphics instance) should record into the same
/// timeline.
#[derive(Clone, Debug, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    /// A snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

#[derive(Debug, Default)]
struct Shared {
    queue: VecDeque<HeadlessEvent>,
    fail_create: bool,
    /// `true` while a native window exists.
    alive: bool,
}

/// Scripts native events for, and observes, a [`HeadlessBackend`].
#[derive(Clone, Debug)]
pub struct HeadlessHandle {
    shared: Rc<RefCell<Shared>>,
    journal: Journal,
}

impl HeadlessHandle {
    /// Queues a native event. It is reported on the next pump.
    pub fn push(&self, event: HeadlessEvent) {
        self.shared.borrow_mut().queue.push_back(event);
    }

    /// Queues several native events in order.
    pub fn push_all(&self, events: impl IntoIterator<Item = HeadlessEvent>) {
        self.shared.borrow_mut().queue.extend(events);
    }

    /// Number of native events not yet pumped.
    pub fn pending(&self) -> usize {
        self.shared.borrow().queue.len()
    }

    /// Makes subsequent native window creation fail.
    pub fn fail_create(&self, fail: bool) {
        self.shared.borrow_mut().fail_create = fail;
    }

    /// `true` while the backend holds an open native window.
    pub fn is_native_open(&self) -> bool {
        self.shared.borrow().alive
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

/// See the [module documentation](self).
#[derive(Debug)]
pub struct HeadlessBackend {
    shared: Rc<RefCell<Shared>>,
    journal: Journal,
    /// Set between `create_native` and `destroy_native`.
    window_id: Option<u32>,
}

impl HeadlessBackend {
    /// Creates a backend and the handle which scripts it.
    pub fn new() -> (Self, HeadlessHandle) {
        Self::with_journal(Journal::new())
    }

    /// Like [`HeadlessBackend::new`], recording lifecycle steps into an
    /// existing journal.
    pub fn with_journal(journal: Journal) -> (Self, HeadlessHandle) {
        let shared = Rc::new(RefCell::new(Shared::default()));
        let handle = HeadlessHandle {
            shared: shared.clone(),
            journal: journal.clone(),
        };
        (
            Self {
                shared,
                journal,
                window_id: None,
            },
            handle,
        )
    }

    fn report(&self, event: HeadlessEvent, sink: &mut dyn FnMut(BackendEvent)) {
        trace!(?event, "Headless event");
        match event {
            HeadlessEvent::Key { native, pressed } => {
                let code = self.translate_key(native);
                sink(if pressed {
                    BackendEvent::KeyPress(code)
                } else {
                    BackendEvent::KeyRelease(code)
                });
            }
            HeadlessEvent::Button { button, pressed } => {
                let code = translate::x11::translate_button(button);
                sink(if pressed {
                    BackendEvent::KeyPress(code)
                } else {
                    BackendEvent::KeyRelease(code)
                });
            }
            HeadlessEvent::Motion { x, y } => sink(BackendEvent::CursorMoved {
                x: x.max(0) as u32,
                y: y.max(0) as u32,
            }),
            HeadlessEvent::Configure {
                x,
                y,
                width,
                height,
            } => {
                sink(BackendEvent::Moved { x, y });
                sink(BackendEvent::Resized { width, height });
            }
            HeadlessEvent::Minimize => sink(BackendEvent::Minimized(true)),
            HeadlessEvent::Restore => sink(BackendEvent::Minimized(false)),
            HeadlessEvent::FocusIn => sink(BackendEvent::Focus(true)),
            HeadlessEvent::FocusOut => sink(BackendEvent::Focus(false)),
            HeadlessEvent::Enter => sink(BackendEvent::CursorEntered(true)),
            HeadlessEvent::Leave => sink(BackendEvent::CursorEntered(false)),
            HeadlessEvent::CloseRequest => sink(BackendEvent::CloseRequested),
            HeadlessEvent::Destroyed => {
                if ::std::mem::take(&mut self.shared.borrow_mut().alive) {
                    self.journal.record("native destroyed externally");
                }
                sink(BackendEvent::CloseRequested);
            }
        }
    }
}

impl Backend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_native(&mut self, config: &NativeConfig) -> Result<SurfaceTarget> {
        if self.shared.borrow().fail_create {
            return Err(Error::Native(NativeError::new(
                "headless window creation disabled",
            )));
        }

        let id = NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed);
        debug!(wnd_title = %config.title, id, "Creating headless window");

        self.shared.borrow_mut().alive = true;
        self.window_id = Some(id);
        self.journal.record("native created");

        Ok(SurfaceTarget {
            display: RawDisplayHandle::Web(WebDisplayHandle::new()),
            window: RawWindowHandle::Web(WebWindowHandle::new(id)),
        })
    }

    fn pump_events(&mut self, sink: &mut dyn FnMut(BackendEvent)) {
        if self.window_id.is_none() {
            return;
        }

        // The borrow must be released before reporting, sinks may script
        // further events.
        loop {
            let Some(event) = self.shared.borrow_mut().queue.pop_front() else {
                break;
            };
            self.report(event, sink);
        }
    }

    fn destroy_native(&mut self) {
        let Some(id) = self.window_id.take() else {
            return;
        };

        debug!(id, "Destroying headless window");
        let mut shared = self.shared.borrow_mut();
        shared.queue.clear();
        if ::std::mem::take(&mut shared.alive) {
            self.journal.record("native destroyed");
        }
    }

    fn translate_key(&self, native: u32) -> KeyCode {
        u8::try_from(native)
            .ok()
            .and_then(KeyCode::from_repr)
            .unwrap_or(KeyCode::Unsupported)
    }
}
