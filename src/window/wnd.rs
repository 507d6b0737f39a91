//! Top-level Window object which ties a native window to its Vulkan surface.

use crate::{
    backend::{Backend, NativeConfig},
    errors::{Error, Result},
    graphics::{GraphicsInstance, SurfaceTarget},
    input::keyboard::KeyCode,
    window::{dispatch::EventDispatcher, state::WindowState, Lifecycle},
};

use ::ash::vk;
use ::geoms::d2::{Point2D, Size2D};
use ::std::marker::PhantomData;
use ::tracing::{debug, error};

/// A native window with a Vulkan surface.
///
/// The window owns its native handle, its surface and the backend driving it.
/// The graphics instance the surface was created from is borrowed and must
/// outlive the window. A [`Window`] is `!Sync + !Send`: it must be pumped and
/// torn down on the thread which created it.
///
/// Events are delivered by [`pump_events`](Window::pump_events), which drains
/// whatever the platform has queued and invokes the registered callbacks
/// synchronously.
///
/// # Example
///
/// ```no_run
/// use ::surfer::{graphics::VulkanInstance, window::Builder, KeyCode};
/// # fn demo(entry: &ash::Entry, instance: &ash::Instance) -> surfer::Result<()> {
/// let graphics = VulkanInstance::new(entry, instance);
/// let mut window = Builder::new().with_title("Hello, Vulkan!").build(&graphics)?;
///
/// window.on_resize(|width, height| println!("resized to {width}x{height}"));
/// window.on_key_press(|key| {
///     if key == KeyCode::Escape {
///         println!("escape pressed");
///     }
/// });
///
/// while !window.should_close() {
///     window.pump_events();
///     // render into window.surface()
/// }
///
/// window.destroy();
/// # Ok(())
/// # }
/// ```
pub struct Window<'g> {
    /// Force !Send & !Sync, as native windows can only be used by the thread
    /// on which they were created.
    phantom: PhantomData<*mut ()>,
    /// The instance the surface was created from, and must be destroyed with.
    graphics: &'g dyn GraphicsInstance,
    /// The native windowing system driving this window.
    backend: Box<dyn Backend>,
    /// Native handles of the open window. `None` once torn down.
    target: Option<SurfaceTarget>,
    /// `None` once torn down.
    surface: Option<vk::SurfaceKHR>,
    title: String,
    dispatcher: EventDispatcher,
}

impl<'g> Window<'g> {
    /// Validates the configuration, then creates the native window followed
    /// by its surface.
    ///
    /// The backend is only constructed once the configuration is known to be
    /// valid. If surface creation fails the native window is destroyed again
    /// before the error is returned.
    pub(crate) fn open(
        graphics: &'g dyn GraphicsInstance,
        config: NativeConfig,
        backend: impl FnOnce() -> Result<Box<dyn Backend>>,
    ) -> Result<Self> {
        if graphics.is_null() {
            return Err(Error::NullInstance);
        }
        if config.size.width == 0 || config.size.height == 0 {
            return Err(Error::ZeroDimension {
                width: config.size.width,
                height: config.size.height,
            });
        }

        let mut backend = backend()?;
        debug!(wnd_title = %config.title, backend = backend.name(), "Creating window");

        let target = backend.create_native(&config)?;
        let surface = match graphics.create_surface(target) {
            Ok(surface) => surface,
            Err(e) => {
                error!(wnd_title = %config.title, error = %e, "Failed to create surface");
                backend.destroy_native();
                return Err(Error::Surface(e));
            }
        };

        Ok(Self {
            phantom: PhantomData,
            graphics,
            backend,
            target: Some(target),
            surface: Some(surface),
            dispatcher: EventDispatcher::new(WindowState::new(&config)),
            title: config.title,
        })
    }

    /// Drains every native event pending right now, updating the window's
    /// state and invoking callbacks. Never blocks.
    ///
    /// Does nothing once the window has been destroyed.
    pub fn pump_events(&mut self) {
        if self.lifecycle() == Lifecycle::Destroyed {
            return;
        }

        let Self {
            backend,
            dispatcher,
            ..
        } = self;
        backend.pump_events(&mut |event| dispatcher.dispatch(event));
    }

    /// Tears the window down: the surface is destroyed first, then the native
    /// window, then every callback is dropped.
    ///
    /// Calling this again has no effect. Dropping a window tears it down too.
    pub fn destroy(&mut self) {
        if !self.dispatcher.state.destroy() {
            return;
        }

        debug!(wnd_title = %self.title, backend = self.backend.name(), "Destroying window");
        if let Some(surface) = self.surface.take() {
            self.graphics.destroy_surface(surface);
        }
        self.target = None;
        self.backend.destroy_native();
        self.dispatcher.callbacks.clear();
    }

    /// Returns whether the window has been asked to close, either by the
    /// window manager or because its native window was destroyed.
    ///
    /// The window keeps working until [`destroy`](Window::destroy) is called.
    pub fn should_close(&self) -> bool {
        self.dispatcher.state.should_close()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.dispatcher.state.lifecycle()
    }

    /// The Vulkan surface of the window, `None` once destroyed.
    pub fn surface(&self) -> Option<vk::SurfaceKHR> {
        self.surface
    }

    /// The raw native handles of the window, `None` once destroyed.
    pub fn surface_target(&self) -> Option<SurfaceTarget> {
        self.target
    }

    /// Last known cursor position within the client area. `(0, 0)` until the
    /// cursor first moves over the window.
    pub fn cursor_position(&self) -> Point2D<u32> {
        let (x, y) = self.dispatcher.state.cursor();
        Point2D { x, y }
    }

    /// Size of the client area, as last reported by the windowing system.
    pub fn size(&self) -> Size2D<u32> {
        let (width, height) = self.dispatcher.state.size();
        Size2D { width, height }
    }

    /// Position of the window on screen, as last reported by the windowing
    /// system.
    pub fn position(&self) -> Point2D<i32> {
        let (x, y) = self.dispatcher.state.position();
        Point2D { x, y }
    }

    pub fn is_focused(&self) -> bool {
        self.dispatcher.state.is_focused()
    }

    pub fn is_mouse_inside(&self) -> bool {
        self.dispatcher.state.is_mouse_inside()
    }

    pub fn is_minimized(&self) -> bool {
        self.dispatcher.state.is_minimized()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Name of the backend driving the window.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Called when a key or mouse button is pressed, or the wheel scrolls.
    /// Replaces any previous key press callback.
    pub fn on_key_press(&mut self, callback: impl FnMut(KeyCode) + 'static) {
        self.dispatcher.callbacks.set_key_press(callback);
    }

    /// Called when a key or mouse button is released, and after every wheel
    /// press. Replaces any previous key release callback.
    pub fn on_key_release(&mut self, callback: impl FnMut(KeyCode) + 'static) {
        self.dispatcher.callbacks.set_key_release(callback);
    }

    /// Called with the new cursor position when the cursor moves within the
    /// client area.
    pub fn on_mouse_motion(&mut self, callback: impl FnMut(u32, u32) + 'static) {
        self.dispatcher.callbacks.set_mouse_motion(callback);
    }

    /// Called with the new client size when the window is resized. Not
    /// called while the window is minimized.
    pub fn on_resize(&mut self, callback: impl FnMut(u32, u32) + 'static) {
        self.dispatcher.callbacks.set_resize(callback);
    }

    /// Called with the new position when the window moves.
    pub fn on_move(&mut self, callback: impl FnMut(i32, i32) + 'static) {
        self.dispatcher.callbacks.set_moved(callback);
    }

    /// Called once, when the window is first asked to close.
    /// [`should_close`](Window::should_close) already returns `true` by then.
    pub fn on_close(&mut self, callback: impl FnMut() + 'static) {
        self.dispatcher.callbacks.set_close(callback);
    }

    /// Called with `true` when the cursor enters the client area and `false`
    /// when it leaves.
    pub fn on_mouse_enter_exit(&mut self, callback: impl FnMut(bool) + 'static) {
        self.dispatcher.callbacks.set_mouse_enter_exit(callback);
    }

    /// Called with `true` when the window gains keyboard focus and `false`
    /// when it loses it.
    pub fn on_focus(&mut self, callback: impl FnMut(bool) + 'static) {
        self.dispatcher.callbacks.set_focus(callback);
    }
}

impl Drop for Window<'_> {
    fn drop(&mut self) {
        debug!(wnd_title = %self.title, "Dropping window");
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        backend::headless::{HeadlessBackend, HeadlessEvent, HeadlessHandle, Journal},
        errors::Precondition,
        window::Builder,
    };

    use ::ash::vk::Handle;
    use ::pretty_assertions::assert_eq;
    use ::std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    /// A graphics instance which hands out fake surfaces and records into a
    /// journal shared with the backend.
    struct RecordingGraphics {
        journal: Journal,
        null: bool,
        fail: Option<vk::Result>,
        next: Cell<u64>,
    }

    impl RecordingGraphics {
        fn new(journal: Journal) -> Self {
            Self {
                journal,
                null: false,
                fail: None,
                next: Cell::new(1),
            }
        }
    }

    impl GraphicsInstance for RecordingGraphics {
        fn is_null(&self) -> bool {
            self.null
        }

        fn create_surface(
            &self,
            _target: SurfaceTarget,
        ) -> ::std::result::Result<vk::SurfaceKHR, vk::Result> {
            if let Some(e) = self.fail {
                return Err(e);
            }
            let raw = self.next.replace(self.next.get() + 1);
            self.journal.record("surface created");
            Ok(vk::SurfaceKHR::from_raw(raw))
        }

        fn destroy_surface(&self, _surface: vk::SurfaceKHR) {
            self.journal.record("surface destroyed");
        }
    }

    fn headless(journal: &Journal) -> (Box<dyn Backend>, HeadlessHandle) {
        let (backend, handle) = HeadlessBackend::with_journal(journal.clone());
        (Box::new(backend), handle)
    }

    fn builder() -> Builder {
        Builder::new()
            .with_title("surfer")
            .with_size(Size2D {
                width: 800,
                height: 600,
            })
            .with_position(Point2D { x: 100, y: 100 })
    }

    /// Resize, duplicate resize, close and teardown, observed through
    /// callbacks, accessors and the lifecycle journal.
    #[test]
    fn test_end_to_end() {
        let journal = Journal::new();
        let graphics = RecordingGraphics::new(journal.clone());
        let (backend, handle) = headless(&journal);

        let mut window = builder().build_with_backend(&graphics, backend).unwrap();
        assert_eq!(window.backend_name(), "headless");
        assert!(window.surface().is_some());
        assert_eq!(
            (window.size().width, window.size().height),
            (800, 600)
        );

        let resizes = Rc::new(RefCell::new(Vec::new()));
        let closes = Rc::new(Cell::new(0));
        let r = resizes.clone();
        window.on_resize(move |w, h| r.borrow_mut().push((w, h)));
        let c = closes.clone();
        window.on_close(move || c.set(c.get() + 1));

        handle.push(HeadlessEvent::Configure {
            x: 100,
            y: 100,
            width: 640,
            height: 480,
        });
        window.pump_events();
        assert_eq!(*resizes.borrow(), vec![(640, 480)]);
        assert!(!window.should_close());

        handle.push(HeadlessEvent::Configure {
            x: 100,
            y: 100,
            width: 640,
            height: 480,
        });
        window.pump_events();
        assert_eq!(resizes.borrow().len(), 1);

        handle.push_all([HeadlessEvent::CloseRequest, HeadlessEvent::CloseRequest]);
        window.pump_events();
        assert!(window.should_close());
        assert_eq!(window.lifecycle(), Lifecycle::Closing);
        assert_eq!(closes.get(), 1);

        window.destroy();
        assert_eq!(window.lifecycle(), Lifecycle::Destroyed);
        assert!(window.surface().is_none());
        assert!(!handle.is_native_open());

        window.destroy();
        drop(window);
        assert_eq!(
            journal.entries(),
            vec![
                "native created",
                "surface created",
                "surface destroyed",
                "native destroyed",
            ]
        );
    }

    /// Zero dimensions and null instances fail for any title and position,
    /// before a native window is opened.
    #[test]
    fn test_invalid_configuration() {
        let journal = Journal::new();
        let mut null_graphics = RecordingGraphics::new(journal.clone());
        null_graphics.null = true;
        let graphics = RecordingGraphics::new(journal.clone());

        for (title, x, y) in [("", 0, 0), ("a", -100, 50), ("surfer", i32::MAX, i32::MIN)] {
            let base = Builder::new()
                .with_title(title)
                .with_position(Point2D { x, y });

            for (width, height) in [(0, 600), (800, 0), (0, 0)] {
                let (backend, _) = headless(&journal);
                let err = base
                    .clone()
                    .with_size(Size2D { width, height })
                    .build_with_backend(&graphics, backend)
                    .err()
                    .unwrap();
                assert_eq!(err.precondition(), Precondition::NonZeroSize);
            }

            let (backend, _) = headless(&journal);
            let err = base
                .build_with_backend(&null_graphics, backend)
                .err()
                .unwrap();
            assert!(matches!(err, Error::NullInstance));
        }

        assert!(journal.entries().is_empty());
    }

    /// A failing surface leaves no native window behind.
    #[test]
    fn test_surface_failure_closes_native_window() {
        let journal = Journal::new();
        let mut graphics = RecordingGraphics::new(journal.clone());
        graphics.fail = Some(vk::Result::ERROR_NATIVE_WINDOW_IN_USE_KHR);
        let (backend, handle) = headless(&journal);

        let err = builder()
            .build_with_backend(&graphics, backend)
            .err()
            .unwrap();

        assert!(matches!(
            err,
            Error::Surface(vk::Result::ERROR_NATIVE_WINDOW_IN_USE_KHR)
        ));
        assert!(!handle.is_native_open());
        assert_eq!(
            journal.entries(),
            vec!["native created", "native destroyed"]
        );
    }

    #[test]
    fn test_native_failure() {
        let journal = Journal::new();
        let graphics = RecordingGraphics::new(journal.clone());
        let (backend, handle) = headless(&journal);
        handle.fail_create(true);

        let err = builder()
            .build_with_backend(&graphics, backend)
            .err()
            .unwrap();

        assert_eq!(err.precondition(), Precondition::NativeWindow);
        assert!(journal.entries().is_empty());
    }

    /// Dropping an open window tears it down in order.
    #[test]
    fn test_drop_tears_down() {
        let journal = Journal::new();
        let graphics = RecordingGraphics::new(journal.clone());
        let (backend, handle) = headless(&journal);

        let window = builder().build_with_backend(&graphics, backend).unwrap();
        drop(window);

        assert!(!handle.is_native_open());
        assert_eq!(
            journal.entries(),
            vec![
                "native created",
                "surface created",
                "surface destroyed",
                "native destroyed",
            ]
        );
    }

    /// A native window destroyed from outside closes the window, which still
    /// needs tearing down; the surface is released regardless.
    #[test]
    fn test_external_destroy() {
        let journal = Journal::new();
        let graphics = RecordingGraphics::new(journal.clone());
        let (backend, handle) = headless(&journal);
        let mut window = builder().build_with_backend(&graphics, backend).unwrap();

        handle.push(HeadlessEvent::Destroyed);
        window.pump_events();
        assert!(window.should_close());
        assert_eq!(window.lifecycle(), Lifecycle::Closing);

        window.destroy();
        assert_eq!(
            journal.entries(),
            vec![
                "native created",
                "surface created",
                "native destroyed externally",
                "surface destroyed",
            ]
        );
    }

    /// Accessors follow the events, and callbacks are dropped on teardown.
    #[test]
    fn test_accessors_and_teardown() {
        let journal = Journal::new();
        let graphics = RecordingGraphics::new(journal.clone());
        let (backend, handle) = headless(&journal);
        let mut window = builder().build_with_backend(&graphics, backend).unwrap();

        let keys = Rc::new(RefCell::new(Vec::new()));
        let k = keys.clone();
        window.on_key_press(move |key| k.borrow_mut().push(key));

        assert_eq!(window.title(), "surfer");
        assert_eq!(
            (window.cursor_position().x, window.cursor_position().y),
            (0, 0)
        );

        handle.push_all([
            HeadlessEvent::FocusIn,
            HeadlessEvent::Enter,
            HeadlessEvent::Motion { x: 12, y: 34 },
            HeadlessEvent::Configure {
                x: -5,
                y: 7,
                width: 800,
                height: 600,
            },
            HeadlessEvent::Button {
                button: 1,
                pressed: true,
            },
        ]);
        window.pump_events();

        assert!(window.is_focused());
        assert!(window.is_mouse_inside());
        assert_eq!(
            (window.cursor_position().x, window.cursor_position().y),
            (12, 34)
        );
        assert_eq!((window.position().x, window.position().y), (-5, 7));
        assert_eq!(*keys.borrow(), vec![KeyCode::MouseLeft]);

        // Callbacks hold the last reference to their captures; teardown must
        // release them.
        assert_eq!(Rc::strong_count(&keys), 2);
        window.destroy();
        assert_eq!(Rc::strong_count(&keys), 1);

        handle.push(HeadlessEvent::FocusOut);
        window.pump_events();
        assert!(window.is_focused());
    }
}
