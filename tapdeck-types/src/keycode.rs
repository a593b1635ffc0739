//! HID keyboard-page usage ids and the lookup tables behind the layout DSL.
//!
//! Three lookups are exposed:
//! - [`resolve_special`]: symbolic key name (`"ESC"`, `"KP7"`, ...) to usage id
//! - [`resolve_modifier`]: two-letter modifier name (`"LC"`, `"RS"`, ...) to
//!   modifier bits
//! - [`char_to_keycode`]: printable ASCII character to (base usage id,
//!   shift-required)
//!
//! Names are case-sensitive; the character map folds letter case and derives
//! the shift requirement separately. All three return `None` for unknown
//! input — the callers decide whether that is a warning or a parse failure.

use crate::modifier::{self, HidModifiers};

// Keyboard/keypad page (0x07), USB HID Usage Tables 1.12 §10.
pub const KC_NO: u8 = 0x00;
pub const KC_A: u8 = 0x04;
pub const KC_ENTER: u8 = 0x28;
pub const KC_ESCAPE: u8 = 0x29;
pub const KC_BACKSPACE: u8 = 0x2A;
pub const KC_TAB: u8 = 0x2B;
pub const KC_SPACE: u8 = 0x2C;
pub const KC_MINUS: u8 = 0x2D;
pub const KC_EQUAL: u8 = 0x2E;
pub const KC_LEFT_BRACKET: u8 = 0x2F;
pub const KC_RIGHT_BRACKET: u8 = 0x30;
pub const KC_BACKSLASH: u8 = 0x31;
pub const KC_SEMICOLON: u8 = 0x33;
pub const KC_QUOTE: u8 = 0x34;
pub const KC_GRAVE: u8 = 0x35;
pub const KC_COMMA: u8 = 0x36;
pub const KC_DOT: u8 = 0x37;
pub const KC_SLASH: u8 = 0x38;
pub const KC_CAPS_LOCK: u8 = 0x39;
pub const KC_F1: u8 = 0x3A;
pub const KC_PRINT_SCREEN: u8 = 0x46;
pub const KC_SCROLL_LOCK: u8 = 0x47;
pub const KC_PAUSE: u8 = 0x48;
pub const KC_INSERT: u8 = 0x49;
pub const KC_HOME: u8 = 0x4A;
pub const KC_PAGE_UP: u8 = 0x4B;
pub const KC_DELETE_FORWARD: u8 = 0x4C;
pub const KC_END: u8 = 0x4D;
pub const KC_PAGE_DOWN: u8 = 0x4E;
pub const KC_RIGHT_ARROW: u8 = 0x4F;
pub const KC_LEFT_ARROW: u8 = 0x50;
pub const KC_DOWN_ARROW: u8 = 0x51;
pub const KC_UP_ARROW: u8 = 0x52;
pub const KC_NUM_LOCK: u8 = 0x53;
pub const KC_KP_DIVIDE: u8 = 0x54;
pub const KC_KP_MULTIPLY: u8 = 0x55;
pub const KC_KP_SUBTRACT: u8 = 0x56;
pub const KC_KP_ADD: u8 = 0x57;
pub const KC_KP_1: u8 = 0x59;
pub const KC_KP_0: u8 = 0x62;
pub const KC_KP_DOT: u8 = 0x63;
pub const KC_MUTE: u8 = 0x7F;
pub const KC_VOLUME_UP: u8 = 0x80;
pub const KC_VOLUME_DOWN: u8 = 0x81;
pub const KC_LEFT_CTRL: u8 = 0xE0;
pub const KC_LEFT_SHIFT: u8 = 0xE1;
pub const KC_LEFT_ALT: u8 = 0xE2;
pub const KC_LEFT_GUI: u8 = 0xE3;
pub const KC_RIGHT_CTRL: u8 = 0xE4;
pub const KC_RIGHT_SHIFT: u8 = 0xE5;
pub const KC_RIGHT_ALT: u8 = 0xE6;
pub const KC_RIGHT_GUI: u8 = 0xE7;

/// Resolve a two-letter modifier name to its report bits.
///
/// `LM`/`RM` ("meta") are accepted as aliases for the GUI keys.
pub fn resolve_modifier(name: &str) -> Option<HidModifiers> {
    let mask = match name {
        "LC" => modifier::LEFT_CTRL,
        "LS" => modifier::LEFT_SHIFT,
        "LA" => modifier::LEFT_ALT,
        "LG" | "LM" => modifier::LEFT_GUI,
        "RC" => modifier::RIGHT_CTRL,
        "RS" => modifier::RIGHT_SHIFT,
        "RA" => modifier::RIGHT_ALT,
        "RG" | "RM" => modifier::RIGHT_GUI,
        _ => return None,
    };
    Some(mask)
}

/// Resolve a symbolic special-key name to its usage id.
pub fn resolve_special(name: &str) -> Option<u8> {
    let code = match name {
        "ESC" => KC_ESCAPE,
        "F1" => KC_F1,
        "F2" => KC_F1 + 1,
        "F3" => KC_F1 + 2,
        "F4" => KC_F1 + 3,
        "F5" => KC_F1 + 4,
        "F6" => KC_F1 + 5,
        "F7" => KC_F1 + 6,
        "F8" => KC_F1 + 7,
        "F9" => KC_F1 + 8,
        "F10" => KC_F1 + 9,
        "F11" => KC_F1 + 10,
        "F12" => KC_F1 + 11,
        "PRTSC" => KC_PRINT_SCREEN,
        "SCROLL" => KC_SCROLL_LOCK,
        "PAUSE" => KC_PAUSE,
        "INS" => KC_INSERT,
        "HOME" => KC_HOME,
        "PGUP" => KC_PAGE_UP,
        "DEL" => KC_DELETE_FORWARD,
        "END" => KC_END,
        "PGDN" => KC_PAGE_DOWN,
        "RIGHT" => KC_RIGHT_ARROW,
        "LEFT" => KC_LEFT_ARROW,
        "DOWN" => KC_DOWN_ARROW,
        "UP" => KC_UP_ARROW,
        "NUMLK" => KC_NUM_LOCK,
        "KP/" => KC_KP_DIVIDE,
        "KP*" => KC_KP_MULTIPLY,
        "KP-" => KC_KP_SUBTRACT,
        "KP+" => KC_KP_ADD,
        // Hosts treat keypad enter and the main enter identically for our
        // purposes, so KPENT shares the plain enter usage.
        "KPENT" => KC_ENTER,
        "KP1" => KC_KP_1,
        "KP2" => KC_KP_1 + 1,
        "KP3" => KC_KP_1 + 2,
        "KP4" => KC_KP_1 + 3,
        "KP5" => KC_KP_1 + 4,
        "KP6" => KC_KP_1 + 5,
        "KP7" => KC_KP_1 + 6,
        "KP8" => KC_KP_1 + 7,
        "KP9" => KC_KP_1 + 8,
        "KP0" => KC_KP_0,
        "KP." => KC_KP_DOT,
        "MUTE" => KC_MUTE,
        "VOLUP" => KC_VOLUME_UP,
        "VOLDN" => KC_VOLUME_DOWN,
        "ENTER" => KC_ENTER,
        "TAB" => KC_TAB,
        "SPACE" => KC_SPACE,
        "BKSP" => KC_BACKSPACE,
        "CAPS" => KC_CAPS_LOCK,
        // The modifier keys as plain keys, for hosts that want the keycode
        // rather than the report modifier bit.
        "LCTRL" => KC_LEFT_CTRL,
        "LSHIFT" => KC_LEFT_SHIFT,
        "LALT" => KC_LEFT_ALT,
        "LGUI" => KC_LEFT_GUI,
        "RCTRL" => KC_RIGHT_CTRL,
        "RSHIFT" => KC_RIGHT_SHIFT,
        "RALT" => KC_RIGHT_ALT,
        "RGUI" => KC_RIGHT_GUI,
        _ => return None,
    };
    Some(code)
}

/// Map a printable ASCII character of a US layout to its base usage id and
/// whether shift must be held to produce it.
///
/// Upper- and lowercase letters share the base keycode; shift is derived
/// from case. Returns `None` for anything the US layout cannot type.
pub fn char_to_keycode(c: char) -> Option<(u8, bool)> {
    if c.is_ascii_lowercase() {
        return Some((KC_A + (c as u8 - b'a'), false));
    }
    if c.is_ascii_uppercase() {
        return Some((KC_A + (c as u8 - b'A'), true));
    }
    if ('1'..='9').contains(&c) {
        return Some((0x1E + (c as u8 - b'1'), false));
    }
    if c == '0' {
        return Some((0x27, false));
    }

    let mapping = match c {
        ' ' => (KC_SPACE, false),
        '!' => (0x1E, true),
        '@' => (0x1F, true),
        '#' => (0x20, true),
        '$' => (0x21, true),
        '%' => (0x22, true),
        '^' => (0x23, true),
        '&' => (0x24, true),
        '*' => (0x25, true),
        '(' => (0x26, true),
        ')' => (0x27, true),
        '-' => (KC_MINUS, false),
        '_' => (KC_MINUS, true),
        '=' => (KC_EQUAL, false),
        '+' => (KC_EQUAL, true),
        '[' => (KC_LEFT_BRACKET, false),
        '{' => (KC_LEFT_BRACKET, true),
        ']' => (KC_RIGHT_BRACKET, false),
        '}' => (KC_RIGHT_BRACKET, true),
        '\\' => (KC_BACKSLASH, false),
        '|' => (KC_BACKSLASH, true),
        ';' => (KC_SEMICOLON, false),
        ':' => (KC_SEMICOLON, true),
        '\'' => (KC_QUOTE, false),
        '"' => (KC_QUOTE, true),
        '`' => (KC_GRAVE, false),
        '~' => (KC_GRAVE, true),
        ',' => (KC_COMMA, false),
        '<' => (KC_COMMA, true),
        '.' => (KC_DOT, false),
        '>' => (KC_DOT, true),
        '/' => (KC_SLASH, false),
        '?' => (KC_SLASH, true),
        _ => return None,
    };
    Some(mapping)
}
