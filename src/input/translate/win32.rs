//! Win32 virtual-key and mouse-button translation.
//!
//! A Win32 key is identified by its virtual-key code plus two bits of the
//! keystroke flags: the OEM scan code and the extended-key flag. The
//! extended flag separates the right-hand modifiers and numpad Enter from
//! their main-block twins, and the dedicated navigation cluster from the
//! numpad (which reports navigation virtual keys while NumLock is off).
//!
//! [`pack_key`] folds the three parts into a single `u32` using the same bit
//! positions as the message `LPARAM`, so a backend can build the native code
//! with `(lparam & 0x01FF_0000) | vk`.
//!
//! Virtual-key reference:
//! <https://learn.microsoft.com/en-us/windows/win32/inputdev/virtual-key-codes>

use crate::input::{
    keyboard::KeyCode,
    translate::{self, KeyRange},
};

use ::lazy_static::lazy_static;
use ::maplit::hashmap;
use ::std::collections::HashMap;

const SCAN_CODE_SHIFT: u32 = 16;
const EXTENDED_BIT: u32 = 1 << 24;

/// Scan code reported by the right-hand shift key. Both shift keys share
/// `VK_SHIFT` and neither is an extended key.
const SCAN_CODE_RIGHT_SHIFT: u8 = 0x36;

const VK_RETURN: u16 = 0x0D;
const VK_SHIFT: u16 = 0x10;
const VK_CONTROL: u16 = 0x11;
const VK_MENU: u16 = 0x12;

const WM_LBUTTONDOWN: u32 = 0x0201;
const WM_LBUTTONUP: u32 = 0x0202;
const WM_RBUTTONDOWN: u32 = 0x0204;
const WM_RBUTTONUP: u32 = 0x0205;
const WM_MBUTTONDOWN: u32 = 0x0207;
const WM_MBUTTONUP: u32 = 0x0208;
const WM_MOUSEWHEEL: u32 = 0x020A;
const WM_XBUTTONDOWN: u32 = 0x020B;
const WM_XBUTTONUP: u32 = 0x020C;
const WM_MOUSEHWHEEL: u32 = 0x020E;

const XBUTTON1: u16 = 0x0001;
const XBUTTON2: u16 = 0x0002;

const RANGES: &[KeyRange] = &[
    // 'A' - 'Z'
    KeyRange::new(0x41, 0x5A, KeyCode::A),
    // '0' - '9'
    KeyRange::new(0x30, 0x39, KeyCode::Num0),
    // VK_NUMPAD0 - VK_NUMPAD9
    KeyRange::new(0x60, 0x69, KeyCode::Numpad0),
    // VK_F1 - VK_F24
    KeyRange::new(0x70, 0x87, KeyCode::F1),
];

lazy_static! {
    static ref NAMED_KEYS: HashMap<u16, KeyCode> = hashmap! {
        0x08 => KeyCode::Backspace,      // VK_BACK
        0x09 => KeyCode::Tab,            // VK_TAB
        0x0D => KeyCode::Enter,          // VK_RETURN
        0x10 => KeyCode::LeftShift,      // VK_SHIFT
        0x11 => KeyCode::LeftControl,    // VK_CONTROL
        0x12 => KeyCode::LeftAlt,        // VK_MENU
        0x13 => KeyCode::Pause,          // VK_PAUSE
        0x14 => KeyCode::CapsLock,       // VK_CAPITAL
        0x15 => KeyCode::Lang1,          // VK_KANA / VK_HANGUL
        0x19 => KeyCode::Lang2,          // VK_HANJA / VK_KANJI
        0x1B => KeyCode::Escape,         // VK_ESCAPE
        0x20 => KeyCode::Space,          // VK_SPACE
        0x21 => KeyCode::PageUp,         // VK_PRIOR
        0x22 => KeyCode::PageDown,       // VK_NEXT
        0x23 => KeyCode::End,            // VK_END
        0x24 => KeyCode::Home,           // VK_HOME
        0x25 => KeyCode::Left,           // VK_LEFT
        0x26 => KeyCode::Up,             // VK_UP
        0x27 => KeyCode::Right,          // VK_RIGHT
        0x28 => KeyCode::Down,           // VK_DOWN
        0x2C => KeyCode::PrintScreen,    // VK_SNAPSHOT
        0x2D => KeyCode::Insert,         // VK_INSERT
        0x2E => KeyCode::Delete,         // VK_DELETE
        0x5B => KeyCode::LeftSuper,      // VK_LWIN
        0x5C => KeyCode::RightSuper,     // VK_RWIN
        0x5D => KeyCode::ContextMenu,    // VK_APPS
        0x5F => KeyCode::Sleep,          // VK_SLEEP
        0x6A => KeyCode::NumpadMultiply, // VK_MULTIPLY
        0x6B => KeyCode::NumpadAdd,      // VK_ADD
        0x6D => KeyCode::NumpadSubtract, // VK_SUBTRACT
        0x6E => KeyCode::NumpadDecimal,  // VK_DECIMAL
        0x6F => KeyCode::NumpadDivide,   // VK_DIVIDE
        0x90 => KeyCode::NumLock,        // VK_NUMLOCK
        0x91 => KeyCode::ScrollLock,     // VK_SCROLL
        0x92 => KeyCode::NumpadEqual,    // VK_OEM_NEC_EQUAL
        0xA0 => KeyCode::LeftShift,      // VK_LSHIFT
        0xA1 => KeyCode::RightShift,     // VK_RSHIFT
        0xA2 => KeyCode::LeftControl,    // VK_LCONTROL
        0xA3 => KeyCode::RightControl,   // VK_RCONTROL
        0xA4 => KeyCode::LeftAlt,        // VK_LMENU
        0xA5 => KeyCode::RightAlt,       // VK_RMENU
        0xAD => KeyCode::Mute,           // VK_VOLUME_MUTE
        0xAE => KeyCode::VolumeDown,     // VK_VOLUME_DOWN
        0xAF => KeyCode::VolumeUp,       // VK_VOLUME_UP
        0xB0 => KeyCode::MediaNext,      // VK_MEDIA_NEXT_TRACK
        0xB1 => KeyCode::MediaPrevious,  // VK_MEDIA_PREV_TRACK
        0xB2 => KeyCode::MediaStop,      // VK_MEDIA_STOP
        0xB3 => KeyCode::MediaPlayPause, // VK_MEDIA_PLAY_PAUSE
        0xBA => KeyCode::Semicolon,      // VK_OEM_1
        0xBB => KeyCode::Equal,          // VK_OEM_PLUS
        0xBC => KeyCode::Comma,          // VK_OEM_COMMA
        0xBD => KeyCode::Minus,          // VK_OEM_MINUS
        0xBE => KeyCode::Period,         // VK_OEM_PERIOD
        0xBF => KeyCode::Slash,          // VK_OEM_2
        0xC0 => KeyCode::Grave,          // VK_OEM_3
        0xDB => KeyCode::BracketLeft,    // VK_OEM_4
        0xDC => KeyCode::Backslash,      // VK_OEM_5
        0xDD => KeyCode::BracketRight,   // VK_OEM_6
        0xDE => KeyCode::Quote,          // VK_OEM_7
    };
}

/// Packs a virtual key, scan code and extended flag into a native key code
/// for [`translate_key`].
pub const fn pack_key(vk: u16, scan_code: u8, is_extended: bool) -> u32 {
    let extended = if is_extended { EXTENDED_BIT } else { 0 };
    (vk as u32) | ((scan_code as u32) << SCAN_CODE_SHIFT) | extended
}

/// Translates a packed Win32 key (see [`pack_key`]) into a [`KeyCode`].
pub fn translate_key(native: u32) -> KeyCode {
    let vk = (native & 0xFFFF) as u16;
    let scan_code = ((native >> SCAN_CODE_SHIFT) & 0xFF) as u8;
    let is_extended = native & EXTENDED_BIT != 0;

    match (vk, is_extended) {
        (VK_SHIFT, _) if scan_code == SCAN_CODE_RIGHT_SHIFT => return KeyCode::RightShift,
        (VK_CONTROL, true) => return KeyCode::RightControl,
        (VK_MENU, true) => return KeyCode::RightAlt,
        (VK_RETURN, true) => return KeyCode::NumpadEnter,
        (_, false) => {
            if let Some(code) = numpad_navigation(vk) {
                return code;
            }
        }
        _ => (),
    }

    translate::resolve(vk, RANGES, &NAMED_KEYS)
}

/// With NumLock off the numpad reports navigation virtual keys, but without
/// the extended flag carried by the dedicated navigation cluster.
const fn numpad_navigation(vk: u16) -> Option<KeyCode> {
    Some(match vk {
        0x2D => KeyCode::Numpad0,       // VK_INSERT
        0x23 => KeyCode::Numpad1,       // VK_END
        0x28 => KeyCode::Numpad2,       // VK_DOWN
        0x22 => KeyCode::Numpad3,       // VK_NEXT
        0x25 => KeyCode::Numpad4,       // VK_LEFT
        0x0C => KeyCode::Numpad5,       // VK_CLEAR
        0x27 => KeyCode::Numpad6,       // VK_RIGHT
        0x24 => KeyCode::Numpad7,       // VK_HOME
        0x26 => KeyCode::Numpad8,       // VK_UP
        0x21 => KeyCode::Numpad9,       // VK_PRIOR
        0x2E => KeyCode::NumpadDecimal, // VK_DELETE
        _ => return None,
    })
}

/// Translates a mouse button message into a [`KeyCode`].
///
/// `wparam` is only consulted for `WM_XBUTTON*` messages, where its high word
/// names the extra button. Messages which are not button messages, and extra
/// buttons beyond the second, become [`KeyCode::Unsupported`].
pub fn translate_button(umsg: u32, wparam: usize) -> KeyCode {
    match umsg {
        WM_LBUTTONDOWN | WM_LBUTTONUP => KeyCode::MouseLeft,
        WM_RBUTTONDOWN | WM_RBUTTONUP => KeyCode::MouseRight,
        WM_MBUTTONDOWN | WM_MBUTTONUP => KeyCode::MouseMiddle,
        WM_XBUTTONDOWN | WM_XBUTTONUP => match ((wparam >> 16) & 0xFFFF) as u16 {
            XBUTTON1 => KeyCode::MouseButton4,
            XBUTTON2 => KeyCode::MouseButton5,
            _ => KeyCode::Unsupported,
        },
        _ => KeyCode::Unsupported,
    }
}

/// Translates a wheel message into the wheel direction it scrolled.
///
/// `wparam` carries the signed wheel delta in its high word. Positive deltas
/// scroll away from the user (up) or to the right.
pub fn translate_wheel(umsg: u32, wparam: usize) -> KeyCode {
    let delta = ((wparam >> 16) & 0xFFFF) as u16 as i16;
    match umsg {
        WM_MOUSEWHEEL if delta > 0 => KeyCode::WheelUp,
        WM_MOUSEWHEEL if delta < 0 => KeyCode::WheelDown,
        WM_MOUSEHWHEEL if delta > 0 => KeyCode::WheelRight,
        WM_MOUSEHWHEEL if delta < 0 => KeyCode::WheelLeft,
        _ => KeyCode::Unsupported,
    }
}
