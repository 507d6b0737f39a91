//! Builder object which constructs [`Window`]s
//!
//! [`Window`]: crate::window::Window

use crate::{
    backend::{self, Backend, NativeConfig},
    errors::Result,
    graphics::GraphicsInstance,
    window::Window,
};

use ::geoms::d2::{Point2D, Size2D};

/// A builder pattern object which simplifies the process of creating a
/// [`Window`].
///
/// The same builder can be re-used to create multiple windows with the same
/// configuration, as a type of prototype.
///
/// ```no_run
/// use ::geoms::d2::Size2D;
/// use ::surfer::{graphics::VulkanInstance, window::Builder};
/// # fn demo(entry: &ash::Entry, instance: &ash::Instance) {
/// let graphics = VulkanInstance::new(entry, instance);
///
/// let window = Builder::new()
///     .with_title("Hello, Vulkan!")
///     .with_size(Size2D {
///         width: 1280,
///         height: 720,
///     })
///     .build(&graphics)
///     .expect("Window creation failed");
/// # }
/// ```
///
/// [`Window`]: crate::window::Window
#[derive(Clone, Debug)]
pub struct Builder {
    title: Option<String>,
    size: Size2D<u32>,
    position: Point2D<i32>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Construct a new builder. Default values will be used for all properties
    /// until explicitly set.
    pub fn new() -> Self {
        Self {
            title: None,
            size: Size2D {
                width: 800,
                height: 600,
            },
            position: Point2D { x: 100, y: 100 },
        }
    }

    /// Set the window title, as it appears in the title bar and task bar.
    ///
    /// Defaults to the empty string if not set.
    pub fn with_title(self, title: impl AsRef<str>) -> Self {
        Self {
            title: title.as_ref().to_owned().into(),
            ..self
        }
    }

    /// Set the size of the window's client area, in pixels. Both dimensions
    /// must be non-zero for [`build`](Builder::build) to succeed.
    ///
    /// Defaults to 800 x 600 if not set.
    pub fn with_size(self, size: Size2D<u32>) -> Self {
        Self { size, ..self }
    }

    /// Set the position the window should initially appear at, in screen
    /// coordinates. Window managers are free to ignore it.
    ///
    /// Defaults to (100, 100) if not set.
    pub fn with_position(self, position: Point2D<i32>) -> Self {
        Self { position, ..self }
    }

    /// Gets the currently set window title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Gets the currently set window size.
    pub fn size(&self) -> Size2D<u32> {
        self.size
    }

    /// Gets the currently set window position.
    pub fn position(&self) -> Point2D<i32> {
        self.position
    }

    /// Build a new [`Window`] with the properties of the builder, driven by
    /// the native backend of the current platform.
    ///
    /// The window creates its surface from `graphics`, which must outlive it.
    ///
    /// [`Window`]: crate::window::Window
    pub fn build<'g>(&self, graphics: &'g dyn GraphicsInstance) -> Result<Window<'g>> {
        Window::open(graphics, self.native_config(), backend::platform_default)
    }

    /// Like [`build`](Builder::build), but driven by the given backend.
    pub fn build_with_backend<'g>(
        &self,
        graphics: &'g dyn GraphicsInstance,
        backend: Box<dyn Backend>,
    ) -> Result<Window<'g>> {
        Window::open(graphics, self.native_config(), move || Ok(backend))
    }

    fn native_config(&self) -> NativeConfig {
        NativeConfig {
            title: self.title().unwrap_or("").to_owned(),
            size: self.size,
            position: self.position,
        }
    }
}
