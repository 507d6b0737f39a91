//! The seam between a window and the graphics API which renders into it.
//!
//! A window never creates graphics-API objects other than its surface. The
//! caller provides the instance, keeps it alive for as long as the window
//! exists, and hands it to the window as a [`GraphicsInstance`].

use crate::errors::{Error, Result};

use ::ash::{khr, vk};
use ::raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use ::std::ffi::c_char;
use ::tracing::debug;

/// The raw native handles a surface is created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceTarget {
    pub display: RawDisplayHandle,
    pub window: RawWindowHandle,
}

/// A graphics-API instance capable of creating and destroying surfaces for
/// native windows.
///
/// Implemented by [`VulkanInstance`]. The trait exists so window creation and
/// teardown order can be exercised without a GPU.
pub trait GraphicsInstance {
    /// `true` if the underlying instance handle is null.
    fn is_null(&self) -> bool;

    /// Creates a surface for the given native window.
    ///
    /// The window is guaranteed to stay alive until [`destroy_surface`] has
    /// been called for the returned handle.
    ///
    /// [`destroy_surface`]: GraphicsInstance::destroy_surface
    fn create_surface(&self, target: SurfaceTarget) -> ::std::result::Result<vk::SurfaceKHR, vk::Result>;

    /// Destroys a surface previously returned by [`create_surface`].
    ///
    /// [`create_surface`]: GraphicsInstance::create_surface
    fn destroy_surface(&self, surface: vk::SurfaceKHR);
}

/// A [`GraphicsInstance`] backed by an `ash` Vulkan instance.
///
/// The instance must have been created with the extensions listed by
/// [`required_extensions`].
pub struct VulkanInstance<'a> {
    entry: &'a ash::Entry,
    instance: &'a ash::Instance,
    surface_loader: khr::surface::Instance,
}

impl<'a> VulkanInstance<'a> {
    pub fn new(entry: &'a ash::Entry, instance: &'a ash::Instance) -> Self {
        Self {
            entry,
            instance,
            surface_loader: khr::surface::Instance::new(entry, instance),
        }
    }

    /// The surface extension loader, useful for querying surface
    /// capabilities, formats and present modes.
    pub fn surface_loader(&self) -> &khr::surface::Instance {
        &self.surface_loader
    }
}

impl GraphicsInstance for VulkanInstance<'_> {
    fn is_null(&self) -> bool {
        self.instance.handle() == vk::Instance::null()
    }

    fn create_surface(&self, target: SurfaceTarget) -> ::std::result::Result<vk::SurfaceKHR, vk::Result> {
        // SAFETY: The entry and instance are valid references provided by the
        // caller. The display and window handles come from a live native
        // window which outlives the surface.
        let surface = unsafe {
            ash_window::create_surface(self.entry, self.instance, target.display, target.window, None)
        }?;
        debug!(?surface, "Vulkan surface created");
        Ok(surface)
    }

    fn destroy_surface(&self, surface: vk::SurfaceKHR) {
        // SAFETY: The surface was created from this instance and is destroyed
        // exactly once, before its native window.
        unsafe { self.surface_loader.destroy_surface(surface, None) };
        debug!(?surface, "Vulkan surface destroyed");
    }
}

/// The Vulkan instance extensions required to create surfaces for windows of
/// the platform's default backend.
///
/// The returned pointers reference static, null-terminated strings owned by
/// `ash-window`.
pub fn required_extensions() -> Result<&'static [*const c_char]> {
    let display = crate::backend::platform_display_kind()?;
    ash_window::enumerate_required_extensions(display).map_err(Error::Surface)
}
