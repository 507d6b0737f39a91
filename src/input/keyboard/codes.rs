//! The unified key and button vocabulary.

use ::strum::{Display, EnumCount, EnumIter, FromRepr, IntoStaticStr};

/// A platform-independent input code.
///
/// Every backend resolves its native key codes, virtual keys and mouse button
/// identifiers into this closed set. The same physical key produces the same
/// [`KeyCode`] on every platform. Whenever a native code has no mapping (or
/// the platform cannot tell two physical inputs apart) the backend reports
/// [`KeyCode::Unsupported`].
///
/// Letters, digits, numpad digits and function keys are laid out as
/// contiguous blocks. The translators rely on this ordering to resolve native
/// ranges by offset, so new variants must never be inserted inside a block.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    IntoStaticStr,
    EnumIter,
    EnumCount,
    FromRepr,
)]
#[repr(u8)]
pub enum KeyCode {
    // Letters
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Digits on the main block
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,

    // Numpad
    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    NumpadEnter,
    NumpadMultiply,
    NumpadSubtract,
    NumpadAdd,
    NumpadDecimal,
    NumpadDivide,
    NumpadEqual,

    // Function keys, including the extended F13-F24 block
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,

    // Modifiers and locks
    LeftShift,
    RightShift,
    LeftControl,
    RightControl,
    LeftAlt,
    RightAlt,
    LeftSuper,
    RightSuper,
    CapsLock,
    NumLock,
    ScrollLock,

    // Arrows
    Up,
    Down,
    Right,
    Left,

    // Navigation
    Home,
    End,
    PageUp,
    PageDown,

    // Editing
    Backspace,
    Delete,
    Insert,

    // Special
    Enter,
    Space,
    Tab,
    Escape,
    PrintScreen,
    Pause,

    // Punctuation and symbols (US layout positions)
    Minus,
    Equal,
    BracketLeft,
    BracketRight,
    Semicolon,
    Quote,
    Comma,
    Period,
    Slash,
    Backslash,
    Grave,

    // Media
    MediaPlayPause,
    MediaStop,
    MediaNext,
    MediaPrevious,
    VolumeUp,
    VolumeDown,
    Mute,

    // System
    Power,
    Sleep,
    WakeUp,

    // Locale and application
    ContextMenu,
    Lang1,
    Lang2,

    // Mouse buttons
    MouseLeft,
    MouseRight,
    MouseMiddle,
    MouseButton4,
    MouseButton5,

    // Mouse wheel
    WheelUp,
    WheelDown,
    WheelLeft,
    WheelRight,

    /// Reported for every native code without a mapping.
    Unsupported,
}

impl KeyCode {
    /// The numeric value of the code within the vocabulary.
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Returns the code `offset` places after `self`, or `None` if that would
    /// run past the end of the vocabulary.
    pub fn offset(self, offset: u32) -> Option<Self> {
        u8::try_from(offset)
            .ok()
            .and_then(|offset| self.value().checked_add(offset))
            .and_then(Self::from_repr)
    }

    /// `true` for codes produced by mouse buttons or the mouse wheel.
    pub const fn is_mouse(self) -> bool {
        matches!(
            self,
            Self::MouseLeft
                | Self::MouseRight
                | Self::MouseMiddle
                | Self::MouseButton4
                | Self::MouseButton5
                | Self::WheelUp
                | Self::WheelDown
                | Self::WheelLeft
                | Self::WheelRight
        )
    }

    /// `true` for every code except [`KeyCode::Unsupported`].
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}
