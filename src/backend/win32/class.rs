//! Management of Win32 Windows classes.

use crate::errors::{Context, Result};

use ::lazy_static::lazy_static;
use ::parking_lot::Mutex;
use ::std::{
    collections::{hash_map::Entry, HashMap},
    num::NonZeroU16,
    sync::{Arc, Weak},
};
use ::tap::prelude::*;
use ::tracing::{debug, error};
use ::widestring::U16CString;
use ::windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{
            LoadCursorW, RegisterClassExW, UnregisterClassW, CS_HREDRAW, CS_OWNDC, CS_VREDRAW,
            IDC_ARROW, WNDCLASSEXW,
        },
    },
};

/// Typedef for the Win32 windows procedure function - the primary entry point
/// for the Windows message pump.
pub(super) type WndProc = extern "system" fn(HWND, u32, WPARAM, LPARAM) -> LRESULT;

lazy_static! {
    static ref WINDOW_REGISTRATIONS: Mutex<HashMap<U16CString, Weak<WindowClass>>> =
        Default::default();
}

/// A RAII object which manages Windows class registrations.
///
/// A windows class will be registered with the system the first time one is
/// requested. Subsequent requests for the same class name return a reference
/// to the already registered class. When no more live references to a
/// registered class exist, it is deregistered with the system.
pub(super) struct WindowClass {
    class_name: U16CString,
}

impl WindowClass {
    /// Gets a handle to an existing window class registration, or registers
    /// the window class for the first time.
    pub(super) fn get_or_create(class_name: &str, wnd_proc: WndProc) -> Result<Arc<Self>> {
        let mut registry = WINDOW_REGISTRATIONS.lock();
        let class_name = U16CString::from_str_truncate(class_name);

        match registry.entry(class_name) {
            Entry::Vacant(entry) => {
                let class = Self::register(entry.key().clone(), wnd_proc)?;
                entry.insert(Arc::downgrade(&class));
                Ok(class)
            }
            Entry::Occupied(mut entry) => {
                if let Some(strong_ref) = entry.get().upgrade() {
                    Ok(strong_ref)
                } else {
                    let class = Self::register(entry.key().clone(), wnd_proc)?;
                    entry.insert(Arc::downgrade(&class));
                    Ok(class)
                }
            }
        }
    }

    pub(super) fn class_name(&self) -> &U16CString {
        &self.class_name
    }

    fn register(class_name: U16CString, wnd_proc: WndProc) -> Result<Arc<Self>> {
        debug!(
            wnd_class = class_name.to_string_lossy(),
            "Register window class"
        );

        let module = unsafe { GetModuleHandleW(None) }
            .context("Failed to get module handle to register window class")
            .function("GetModuleHandleW")?;
        let cursor = unsafe { LoadCursorW(HINSTANCE::default(), IDC_ARROW) }
            .context("Failed to load cursor to register window class")
            .function("LoadCursorW")?;

        // CS_OWNDC: Vulkan presentation engines keep per-window device
        // contexts.
        let wnd_class = WNDCLASSEXW {
            cbSize: ::std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW | CS_OWNDC,
            lpfnWndProc: Some(wnd_proc),
            hInstance: module,
            lpszClassName: PCWSTR::from_raw(class_name.as_ptr()),
            hCursor: cursor,
            ..Default::default()
        };
        let _atom = unsafe { RegisterClassExW(&wnd_class) }
            .pipe(NonZeroU16::new)
            .context("Failed to register window class")
            .function("RegisterClassExW")?;

        Ok(Arc::new(Self { class_name }))
    }

    fn unregister(&self) -> Result<()> {
        debug!(wnd_class = ?self.class_name().to_string_lossy(), "Unregister window class");
        let module = unsafe { GetModuleHandleW(None) }
            .context("Failed to get current module handle")
            .function("GetModuleHandleW")?;
        unsafe { UnregisterClassW(PCWSTR::from_raw(self.class_name().as_ptr()), module) }
            .ok()
            .context("Failed to unregister window class")
            .function("UnregisterClassW")?;
        Ok(())
    }
}

impl Drop for WindowClass {
    fn drop(&mut self) {
        if let Err(e) = self.unregister() {
            error!(error = %e);
        }
    }
}
