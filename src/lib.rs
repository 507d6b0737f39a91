//! Minimal native windows bound to Vulkan surfaces.
//!
//! `surfer` opens a native window (Win32 or X11), creates a Vulkan surface
//! for it, and translates the platform's input and window-manager events into
//! a single platform-independent vocabulary which is delivered through
//! registered callbacks.
//!
//! ```no_run
//! use ::surfer::{graphics::VulkanInstance, window::Builder};
//! # fn demo(entry: &ash::Entry, instance: &ash::Instance) -> surfer::errors::Result<()> {
//! let graphics = VulkanInstance::new(entry, instance);
//! let mut window = Builder::new()
//!     .with_title("Hello, Vulkan!")
//!     .build(&graphics)?;
//!
//! window.on_key_press(|key| println!("pressed {key}"));
//! while !window.should_close() {
//!     window.pump_events();
//! }
//! window.destroy();
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod errors;
pub mod graphics;
pub mod input;
pub mod window;

pub use errors::{Error, Result};
pub use input::keyboard::KeyCode;
