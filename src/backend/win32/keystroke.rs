//! Decoding of the keystroke flags carried in the `LPARAM` of Win32 keyboard
//! messages.

use ::deku::prelude::*;

/// Struct representation of the Win32 keystroke message flags.
///
/// Message flag bitfield definition:
/// <https://learn.microsoft.com/en-us/windows/win32/inputdev/about-keyboard-input#keystroke-message-flags>
#[derive(Clone, Copy, Debug, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub(crate) struct KeystrokeFlags {
    /// Bit 31. The transition state. The value is 1 if the key is being
    /// released, or it is 0 if the key is being pressed.
    #[deku(bits = "1")]
    pub(crate) is_key_release: bool,

    /// Bit 30. The previous key state. The value is 1 if the key is down
    /// before the message is sent, or it is 0 if the key is up. Set on every
    /// auto-repeated key down.
    #[deku(bits = "1")]
    pub(crate) was_previous_state_down: bool,

    /// Bit 29. The context code. 1 if the ALT key is held down while the key
    /// is pressed.
    #[deku(bits = "1")]
    pub(crate) is_alt_pressed: bool,

    /// Bit 24. Indicates whether the key is an extended key, such as the
    /// right-hand ALT and CTRL keys that appear on an enhanced 101- or
    /// 102-key keyboard.
    #[deku(pad_bits_before = "4", bits = "1")]
    pub(crate) is_extended_key: bool,

    /// Bits 16-23. The scan code. The value depends on the OEM.
    pub(crate) scan_code: u8,

    /// Bits 0-15. The repeat count for the current message.
    #[deku(bits = "16")]
    pub(crate) repeat_count: u16,
}

impl KeystrokeFlags {
    /// Decodes the flags from the low 32 bits of a keyboard message `LPARAM`.
    pub(crate) fn from_lparam(lparam: isize) -> Result<Self, DekuError> {
        Self::from_bytes((&(lparam as u32).to_be_bytes(), 0)).map(|(_, flags)| flags)
    }
}
