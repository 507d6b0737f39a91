//! Crate-specific error and result types, plus common conversions.

use ::ash::vk;
use ::std::{
    error::Error as StdError,
    fmt::{self, Display},
};
use ::thiserror::Error;

/// Result type returned by fallible window operations.
pub type Result<T> = ::std::result::Result<T, Error>;

/// Reasons a window can fail to be created.
///
/// Construction is the only fallible part of a window's life. Pumping events
/// and tearing the window down never fail; problems there are logged.
#[derive(Debug, Error)]
pub enum Error {
    /// The graphics instance handed to the builder is a null handle.
    #[error("graphics instance is a null handle")]
    NullInstance,

    /// Either requested dimension was zero.
    #[error("window dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    /// No native backend is available for the target platform.
    #[error("no native windowing backend is available on this platform")]
    Unsupported,

    /// The native window or display connection could not be created.
    #[error(transparent)]
    Native(#[from] NativeError),

    /// The rendering surface could not be created for the native window.
    #[error("failed to create Vulkan surface: {0}")]
    Surface(#[source] vk::Result),
}

/// The construction precondition which an [`Error`] reports as violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precondition {
    ValidInstance,
    NonZeroSize,
    SupportedPlatform,
    NativeWindow,
    Surface,
}

impl Error {
    /// Names the precondition which failed.
    pub fn precondition(&self) -> Precondition {
        match self {
            Self::NullInstance => Precondition::ValidInstance,
            Self::ZeroDimension { .. } => Precondition::NonZeroSize,
            Self::Unsupported => Precondition::SupportedPlatform,
            Self::Native(_) => Precondition::NativeWindow,
            Self::Surface(_) => Precondition::Surface,
        }
    }
}

/// Error raised by a native windowing API. The error attempts to pro-actively
/// capture as much context as possible: the underlying platform error, the
/// native function which failed and what was being attempted at the time.
#[derive(Debug)]
pub struct NativeError {
    /// The underlying platform error.
    underlying_error: Box<dyn StdError + 'static>,

    /// The name of the native API function which failed.
    function: Option<&'static str>,

    /// An optional context information which describes what was happening
    /// at the time error.
    context: Option<String>,
}

impl NativeError {
    pub fn new(underlying_error: impl Into<Box<dyn StdError + 'static>>) -> Self {
        Self {
            underlying_error: underlying_error.into(),
            function: None,
            context: None,
        }
    }

    /// The name of the native API function which failed, if known.
    pub fn function(&self) -> Option<&'static str> {
        self.function
    }

    /// Context describing the failed operation, if any.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            underlying_error,
            function,
            context,
        } = &self;

        if let Some(context) = context {
            write!(f, "{context}\nCaused by:\n    {underlying_error}")?;
        } else {
            write!(f, "{underlying_error}")?;
        }

        if let Some(function) = function {
            write!(f, " ({function})")?;
        }

        Ok(())
    }
}

impl StdError for NativeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.underlying_error.as_ref())
    }
}

/// A crate-private trait which allows context information to be attached to
/// fallible native calls.
///
/// This is useful to attach high level context information and track which
/// particular native API function failed, something that might not be
/// obvious when relying on the inner platform error alone.
pub(crate) trait Context<T> {
    /// Attach the name of the function which failed to the error as additional
    /// context.
    fn function(self, function: &'static str) -> Result<T>
    where
        Self: Sized;

    /// Attach a context message to a fallible type and return crate error.
    fn context(self, ctx: impl AsRef<str>) -> Result<T>
    where
        Self: Sized;
}

impl<T> Context<T> for Result<T> {
    fn function(mut self, f: &'static str) -> Result<T> {
        if let Err(Error::Native(err)) = &mut self {
            err.function = Some(f);
        }
        self
    }

    fn context(mut self, ctx: impl AsRef<str>) -> Result<T> {
        if let Err(Error::Native(err)) = &mut self {
            err.context = Some(ctx.as_ref().to_owned());
        }
        self
    }
}

/// Implements [`Context`] for a foreign error type by wrapping it in a
/// [`NativeError`].
macro_rules! native_context {
    ($($error:ty),* $(,)?) => {
        $(
            impl<T> Context<T> for ::std::result::Result<T, $error> {
                fn function(self, function: &'static str) -> Result<T> {
                    self.map_err(|source| {
                        Error::Native(NativeError {
                            underlying_error: Box::new(source),
                            context: None,
                            function: Some(function),
                        })
                    })
                }

                fn context(self, ctx: impl AsRef<str>) -> Result<T> {
                    self.map_err(|source| {
                        Error::Native(NativeError {
                            underlying_error: Box::new(source),
                            context: Some(ctx.as_ref().to_owned()),
                            function: None,
                        })
                    })
                }
            }
        )*
    };
}

#[cfg(windows)]
native_context!(::windows::core::Error);

#[cfg(all(
    unix,
    not(any(target_os = "macos", target_os = "ios", target_os = "android"))
))]
native_context!(
    ::x11rb::errors::ConnectError,
    ::x11rb::errors::ConnectionError,
    ::x11rb::errors::ReplyError,
    ::x11rb::errors::ReplyOrIdError,
);

/// Failed Win32 calls which signal failure through a null or zero return
/// value report the thread's last error.
#[cfg(windows)]
impl<T> Context<T> for Option<T> {
    fn function(self, function: &'static str) -> Result<T> {
        self.ok_or_else(|| {
            Error::Native(NativeError {
                underlying_error: Box::new(::windows::core::Error::from_win32()),
                function: Some(function),
                context: None,
            })
        })
    }

    fn context(self, ctx: impl AsRef<str>) -> Result<T> {
        self.ok_or_else(|| {
            Error::Native(NativeError {
                underlying_error: Box::new(::windows::core::Error::from_win32()),
                context: Some(ctx.as_ref().to_owned()),
                function: None,
            })
        })
    }
}
