//! X11 keysym and pointer-button translation.
//!
//! The X server reports physical keycodes. These are first resolved into
//! keysyms through the server's keyboard mapping ([`KeysymTable`]) and the
//! keysym is then translated into a [`KeyCode`] by [`translate_keysym`].
//!
//! Keysym values: `X11/keysymdef.h` and `X11/XF86keysym.h`.

use crate::input::{
    keyboard::KeyCode,
    translate::{self, KeyRange},
};

use ::lazy_static::lazy_static;
use ::maplit::hashmap;
use ::std::collections::HashMap;

/// `NoSymbol`.
pub const NO_SYMBOL: u32 = 0;

/// `XK_KP_Space` to `XK_KP_Equal`.
const KEYPAD_KEYSYMS: ::std::ops::RangeInclusive<u32> = 0xFF80..=0xFFBD;

const RANGES: &[KeyRange] = &[
    // XK_a - XK_z
    KeyRange::new(0x61, 0x7A, KeyCode::A),
    // XK_A - XK_Z
    KeyRange::new(0x41, 0x5A, KeyCode::A),
    // XK_0 - XK_9
    KeyRange::new(0x30, 0x39, KeyCode::Num0),
    // XK_KP_0 - XK_KP_9
    KeyRange::new(0xFFB0, 0xFFB9, KeyCode::Numpad0),
    // XK_F1 - XK_F24
    KeyRange::new(0xFFBE, 0xFFD5, KeyCode::F1),
];

lazy_static! {
    static ref NAMED_KEYSYMS: HashMap<u32, KeyCode> = hashmap! {
        0xFF08 => KeyCode::Backspace,        // XK_BackSpace
        0xFF09 => KeyCode::Tab,              // XK_Tab
        0xFE20 => KeyCode::Tab,              // XK_ISO_Left_Tab
        0xFF0D => KeyCode::Enter,            // XK_Return
        0xFF13 => KeyCode::Pause,            // XK_Pause
        0xFF14 => KeyCode::ScrollLock,       // XK_Scroll_Lock
        0xFF1B => KeyCode::Escape,           // XK_Escape
        0xFFFF => KeyCode::Delete,           // XK_Delete
        0xFF50 => KeyCode::Home,             // XK_Home
        0xFF51 => KeyCode::Left,             // XK_Left
        0xFF52 => KeyCode::Up,               // XK_Up
        0xFF53 => KeyCode::Right,            // XK_Right
        0xFF54 => KeyCode::Down,             // XK_Down
        0xFF55 => KeyCode::PageUp,           // XK_Prior
        0xFF56 => KeyCode::PageDown,         // XK_Next
        0xFF57 => KeyCode::End,              // XK_End
        0xFF61 => KeyCode::PrintScreen,      // XK_Print
        0xFF63 => KeyCode::Insert,           // XK_Insert
        0xFF67 => KeyCode::ContextMenu,      // XK_Menu
        0xFF7F => KeyCode::NumLock,          // XK_Num_Lock
        0xFF31 => KeyCode::Lang1,            // XK_Hangul
        0xFF34 => KeyCode::Lang2,            // XK_Hangul_Hanja
        0xFF8D => KeyCode::NumpadEnter,      // XK_KP_Enter
        0xFF95 => KeyCode::Numpad7,          // XK_KP_Home
        0xFF96 => KeyCode::Numpad4,          // XK_KP_Left
        0xFF97 => KeyCode::Numpad8,          // XK_KP_Up
        0xFF98 => KeyCode::Numpad6,          // XK_KP_Right
        0xFF99 => KeyCode::Numpad2,          // XK_KP_Down
        0xFF9A => KeyCode::Numpad9,          // XK_KP_Prior
        0xFF9B => KeyCode::Numpad3,          // XK_KP_Next
        0xFF9C => KeyCode::Numpad1,          // XK_KP_End
        0xFF9D => KeyCode::Numpad5,          // XK_KP_Begin
        0xFF9E => KeyCode::Numpad0,          // XK_KP_Insert
        0xFF9F => KeyCode::NumpadDecimal,    // XK_KP_Delete
        0xFFAA => KeyCode::NumpadMultiply,   // XK_KP_Multiply
        0xFFAB => KeyCode::NumpadAdd,        // XK_KP_Add
        0xFFAC => KeyCode::NumpadDecimal,    // XK_KP_Separator
        0xFFAD => KeyCode::NumpadSubtract,   // XK_KP_Subtract
        0xFFAE => KeyCode::NumpadDecimal,    // XK_KP_Decimal
        0xFFAF => KeyCode::NumpadDivide,     // XK_KP_Divide
        0xFFBD => KeyCode::NumpadEqual,      // XK_KP_Equal
        0xFFE1 => KeyCode::LeftShift,        // XK_Shift_L
        0xFFE2 => KeyCode::RightShift,       // XK_Shift_R
        0xFFE3 => KeyCode::LeftControl,      // XK_Control_L
        0xFFE4 => KeyCode::RightControl,     // XK_Control_R
        0xFFE5 => KeyCode::CapsLock,         // XK_Caps_Lock
        0xFFE9 => KeyCode::LeftAlt,          // XK_Alt_L
        0xFFEA => KeyCode::RightAlt,         // XK_Alt_R
        0xFE03 => KeyCode::RightAlt,         // XK_ISO_Level3_Shift (AltGr)
        0xFFEB => KeyCode::LeftSuper,        // XK_Super_L
        0xFFEC => KeyCode::RightSuper,       // XK_Super_R
        0x0020 => KeyCode::Space,            // XK_space
        0x0027 => KeyCode::Quote,            // XK_apostrophe
        0x002C => KeyCode::Comma,            // XK_comma
        0x002D => KeyCode::Minus,            // XK_minus
        0x002E => KeyCode::Period,           // XK_period
        0x002F => KeyCode::Slash,            // XK_slash
        0x003B => KeyCode::Semicolon,        // XK_semicolon
        0x003D => KeyCode::Equal,            // XK_equal
        0x005B => KeyCode::BracketLeft,      // XK_bracketleft
        0x005C => KeyCode::Backslash,        // XK_backslash
        0x005D => KeyCode::BracketRight,     // XK_bracketright
        0x0060 => KeyCode::Grave,            // XK_grave
        0x1008_FF11 => KeyCode::VolumeDown,     // XF86XK_AudioLowerVolume
        0x1008_FF12 => KeyCode::Mute,           // XF86XK_AudioMute
        0x1008_FF13 => KeyCode::VolumeUp,       // XF86XK_AudioRaiseVolume
        0x1008_FF14 => KeyCode::MediaPlayPause, // XF86XK_AudioPlay
        0x1008_FF15 => KeyCode::MediaStop,      // XF86XK_AudioStop
        0x1008_FF16 => KeyCode::MediaPrevious,  // XF86XK_AudioPrev
        0x1008_FF17 => KeyCode::MediaNext,      // XF86XK_AudioNext
        0x1008_FF2A => KeyCode::Power,          // XF86XK_PowerOff
        0x1008_FF2B => KeyCode::WakeUp,         // XF86XK_WakeUp
        0x1008_FF2F => KeyCode::Sleep,          // XF86XK_Sleep
    };
}

/// Translates a keysym into a [`KeyCode`].
pub fn translate_keysym(keysym: u32) -> KeyCode {
    translate::resolve(keysym, RANGES, &NAMED_KEYSYMS)
}

/// Translates a core-protocol pointer button number into a [`KeyCode`].
///
/// Buttons 4 to 7 are the scroll wheel. Buttons 8 and 9 are the side buttons
/// ("back" and "forward"). Anything higher becomes
/// [`KeyCode::Unsupported`].
pub fn translate_button(button: u8) -> KeyCode {
    match button {
        1 => KeyCode::MouseLeft,
        2 => KeyCode::MouseMiddle,
        3 => KeyCode::MouseRight,
        4 => KeyCode::WheelUp,
        5 => KeyCode::WheelDown,
        6 => KeyCode::WheelLeft,
        7 => KeyCode::WheelRight,
        8 => KeyCode::MouseButton4,
        9 => KeyCode::MouseButton5,
        _ => KeyCode::Unsupported,
    }
}

/// A copy of the server's keycode to keysym mapping, as returned by a
/// `GetKeyboardMapping` request covering the full keycode range.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeysymTable {
    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<u32>,
}

impl KeysymTable {
    pub fn new(min_keycode: u8, keysyms_per_keycode: u8, keysyms: Vec<u32>) -> Self {
        Self {
            min_keycode,
            keysyms_per_keycode,
            keysyms,
        }
    }

    /// Resolves a keycode to the keysym of its first group.
    ///
    /// Keypad keys are resolved through their second (NumLock) level, so the
    /// numpad always reports digits regardless of the NumLock state. All
    /// other keys use the unshifted level.
    pub fn keysym(&self, keycode: u8) -> u32 {
        let per_keycode = usize::from(self.keysyms_per_keycode);
        let Some(index) = keycode.checked_sub(self.min_keycode) else {
            return NO_SYMBOL;
        };
        let start = usize::from(index) * per_keycode;
        let Some(levels) = self.keysyms.get(start..start + per_keycode) else {
            return NO_SYMBOL;
        };

        match levels {
            [_, numlock, ..] if KEYPAD_KEYSYMS.contains(numlock) => *numlock,
            [unshifted, ..] => *unshifted,
            [] => NO_SYMBOL,
        }
    }

    /// Resolves and translates a keycode in one step.
    pub fn translate(&self, keycode: u8) -> KeyCode {
        translate_keysym(self.keysym(keycode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ::pretty_assertions::assert_eq;

    /// A tiny mapping in the shape the server returns, starting at keycode 8
    /// with two levels per keycode.
    fn sample_table() -> KeysymTable {
        KeysymTable::new(
            8,
            2,
            vec![
                0x0061, 0x0041, // 8: a A
                0xFF9C, 0xFFB1, // 9: KP_End KP_1
                0xFFE2, NO_SYMBOL, // 10: Shift_R
                0x0031, 0x0021, // 11: 1 exclam
                NO_SYMBOL, NO_SYMBOL, // 12: unmapped
            ],
        )
    }

    /// Lowercase and uppercase keysyms resolve to the same letters, in order.
    #[test]
    fn test_letters_preserve_order() {
        for k in 0..26 {
            let expected = KeyCode::A.offset(k).unwrap();
            assert_eq!(translate_keysym(0x61 + k), expected);
            assert_eq!(translate_keysym(0x41 + k), expected);
        }
    }

    #[test]
    fn test_digit_ranges_preserve_order() {
        for k in 0..10 {
            assert_eq!(
                translate_keysym(0x30 + k),
                KeyCode::Num0.offset(k).unwrap()
            );
            assert_eq!(
                translate_keysym(0xFFB0 + k),
                KeyCode::Numpad0.offset(k).unwrap()
            );
        }
        for k in 0..24 {
            assert_eq!(translate_keysym(0xFFBE + k), KeyCode::F1.offset(k).unwrap());
        }
    }

    #[test]
    fn test_named_keysyms() {
        assert_eq!(translate_keysym(0xFF1B), KeyCode::Escape);
        assert_eq!(translate_keysym(0xFF0D), KeyCode::Enter);
        assert_eq!(translate_keysym(0xFF8D), KeyCode::NumpadEnter);
        assert_eq!(translate_keysym(0xFFE4), KeyCode::RightControl);
        assert_eq!(translate_keysym(0x0060), KeyCode::Grave);
        assert_eq!(translate_keysym(0x1008_FF13), KeyCode::VolumeUp);
    }

    #[test]
    fn test_unmapped_keysyms() {
        for keysym in [NO_SYMBOL, 0x0021, 0x00E9, 0xFFD6, 0x1008_FF00, u32::MAX] {
            assert_eq!(
                translate_keysym(keysym),
                KeyCode::Unsupported,
                "keysym {keysym:#x}"
            );
        }
    }

    #[test]
    fn test_buttons() {
        assert_eq!(translate_button(1), KeyCode::MouseLeft);
        assert_eq!(translate_button(2), KeyCode::MouseMiddle);
        assert_eq!(translate_button(3), KeyCode::MouseRight);
        assert_eq!(translate_button(4), KeyCode::WheelUp);
        assert_eq!(translate_button(7), KeyCode::WheelRight);
        assert_eq!(translate_button(9), KeyCode::MouseButton5);
        assert_eq!(translate_button(0), KeyCode::Unsupported);
        assert_eq!(translate_button(10), KeyCode::Unsupported);
    }

    #[test]
    fn test_keysym_table_lookup() {
        let table = sample_table();
        assert_eq!(table.keysym(8), 0x0061);
        assert_eq!(table.translate(8), KeyCode::A);
        assert_eq!(table.translate(10), KeyCode::RightShift);
        assert_eq!(table.translate(11), KeyCode::Num1);
    }

    /// Numpad keys report their digit even though the unshifted level is a
    /// navigation keysym.
    #[test]
    fn test_keysym_table_prefers_keypad_level() {
        let table = sample_table();
        assert_eq!(table.keysym(9), 0xFFB1);
        assert_eq!(table.translate(9), KeyCode::Numpad1);
    }

    #[test]
    fn test_keysym_table_out_of_range() {
        let table = sample_table();
        assert_eq!(table.keysym(7), NO_SYMBOL);
        assert_eq!(table.keysym(13), NO_SYMBOL);
        assert_eq!(table.translate(12), KeyCode::Unsupported);
        assert_eq!(KeysymTable::default().translate(42), KeyCode::Unsupported);
    }
}
