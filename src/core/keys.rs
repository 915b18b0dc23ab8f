use serde_json::Value;
use std::fmt;

/// Backend-agnostic key identifier.
///
/// The identifier string (`"f6"`, `"a"`, `"page_up"`) is the stable form that
/// goes into the config file; input backends translate their own key types to
/// and from this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Lowercase ASCII letter or digit.
    Char(char),
    /// F1 to F12.
    Function(u8),
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
    CapsLock,
}

const NAMED_KEYS: &[(KeyCode, &str, &str)] = &[
    (KeyCode::Space, "space", "Space"),
    (KeyCode::Enter, "enter", "Enter"),
    (KeyCode::Tab, "tab", "Tab"),
    (KeyCode::Escape, "escape", "Escape"),
    (KeyCode::Backspace, "backspace", "Backspace"),
    (KeyCode::Delete, "delete", "Delete"),
    (KeyCode::Insert, "insert", "Insert"),
    (KeyCode::Home, "home", "Home"),
    (KeyCode::End, "end", "End"),
    (KeyCode::PageUp, "page_up", "Page Up"),
    (KeyCode::PageDown, "page_down", "Page Down"),
    (KeyCode::Up, "up", "Up Arrow"),
    (KeyCode::Down, "down", "Down Arrow"),
    (KeyCode::Left, "left", "Left Arrow"),
    (KeyCode::Right, "right", "Right Arrow"),
    (KeyCode::LeftShift, "left_shift", "Left Shift"),
    (KeyCode::RightShift, "right_shift", "Right Shift"),
    (KeyCode::LeftCtrl, "left_ctrl", "Left Ctrl"),
    (KeyCode::RightCtrl, "right_ctrl", "Right Ctrl"),
    (KeyCode::LeftAlt, "left_alt", "Left Alt"),
    (KeyCode::RightAlt, "right_alt", "Right Alt"),
    (KeyCode::CapsLock, "caps_lock", "Caps Lock"),
];

// Names written by older config files.
const ALIASES: &[(&str, KeyCode)] = &[
    ("return", KeyCode::Enter),
    ("esc", KeyCode::Escape),
    ("pageup", KeyCode::PageUp),
    ("pagedown", KeyCode::PageDown),
    ("shift", KeyCode::LeftShift),
    ("shift_l", KeyCode::LeftShift),
    ("shift_r", KeyCode::RightShift),
    ("ctrl", KeyCode::LeftCtrl),
    ("ctrl_l", KeyCode::LeftCtrl),
    ("ctrl_r", KeyCode::RightCtrl),
    ("alt", KeyCode::LeftAlt),
    ("alt_l", KeyCode::LeftAlt),
    ("alt_r", KeyCode::RightAlt),
    ("alt_gr", KeyCode::RightAlt),
    ("capslock", KeyCode::CapsLock),
];

/// Linux input event codes (`linux/input-event-codes.h`). Shared by the evdev
/// backend and by configs that stored the target key as a bare integer.
pub const SCANCODES: &[(u16, KeyCode)] = &[
    (1, KeyCode::Escape),
    (2, KeyCode::Char('1')),
    (3, KeyCode::Char('2')),
    (4, KeyCode::Char('3')),
    (5, KeyCode::Char('4')),
    (6, KeyCode::Char('5')),
    (7, KeyCode::Char('6')),
    (8, KeyCode::Char('7')),
    (9, KeyCode::Char('8')),
    (10, KeyCode::Char('9')),
    (11, KeyCode::Char('0')),
    (14, KeyCode::Backspace),
    (15, KeyCode::Tab),
    (16, KeyCode::Char('q')),
    (17, KeyCode::Char('w')),
    (18, KeyCode::Char('e')),
    (19, KeyCode::Char('r')),
    (20, KeyCode::Char('t')),
    (21, KeyCode::Char('y')),
    (22, KeyCode::Char('u')),
    (23, KeyCode::Char('i')),
    (24, KeyCode::Char('o')),
    (25, KeyCode::Char('p')),
    (28, KeyCode::Enter),
    (29, KeyCode::LeftCtrl),
    (30, KeyCode::Char('a')),
    (31, KeyCode::Char('s')),
    (32, KeyCode::Char('d')),
    (33, KeyCode::Char('f')),
    (34, KeyCode::Char('g')),
    (35, KeyCode::Char('h')),
    (36, KeyCode::Char('j')),
    (37, KeyCode::Char('k')),
    (38, KeyCode::Char('l')),
    (42, KeyCode::LeftShift),
    (44, KeyCode::Char('z')),
    (45, KeyCode::Char('x')),
    (46, KeyCode::Char('c')),
    (47, KeyCode::Char('v')),
    (48, KeyCode::Char('b')),
    (49, KeyCode::Char('n')),
    (50, KeyCode::Char('m')),
    (54, KeyCode::RightShift),
    (56, KeyCode::LeftAlt),
    (57, KeyCode::Space),
    (58, KeyCode::CapsLock),
    (59, KeyCode::Function(1)),
    (60, KeyCode::Function(2)),
    (61, KeyCode::Function(3)),
    (62, KeyCode::Function(4)),
    (63, KeyCode::Function(5)),
    (64, KeyCode::Function(6)),
    (65, KeyCode::Function(7)),
    (66, KeyCode::Function(8)),
    (67, KeyCode::Function(9)),
    (68, KeyCode::Function(10)),
    (87, KeyCode::Function(11)),
    (88, KeyCode::Function(12)),
    (97, KeyCode::RightCtrl),
    (100, KeyCode::RightAlt),
    (102, KeyCode::Home),
    (103, KeyCode::Up),
    (104, KeyCode::PageUp),
    (105, KeyCode::Left),
    (106, KeyCode::Right),
    (107, KeyCode::End),
    (108, KeyCode::Down),
    (109, KeyCode::PageDown),
    (110, KeyCode::Insert),
    (111, KeyCode::Delete),
];

impl KeyCode {
    pub fn char(c: char) -> Option<Self> {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            Some(Self::Char(c))
        } else {
            None
        }
    }

    pub fn function(n: u8) -> Option<Self> {
        (1..=12).contains(&n).then_some(Self::Function(n))
    }

    pub fn identifier(&self) -> String {
        match self {
            Self::Char(c) => c.to_string(),
            Self::Function(n) => format!("f{}", n),
            named => Self::named_entry(named)
                .map(|(_, id, _)| id.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::Char(c) => c.to_ascii_uppercase().to_string(),
            Self::Function(n) => format!("F{}", n),
            named => Self::named_entry(named)
                .map(|(_, _, display)| display.to_string())
                .unwrap_or_default(),
        }
    }

    fn named_entry(key: &KeyCode) -> Option<&'static (KeyCode, &'static str, &'static str)> {
        NAMED_KEYS.iter().find(|(k, _, _)| k == key)
    }

    pub fn from_scancode(code: u16) -> Option<Self> {
        SCANCODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, key)| *key)
    }

    pub fn scancode(&self) -> Option<u16> {
        SCANCODES
            .iter()
            .find(|(_, key)| key == self)
            .map(|(c, _)| *c)
    }

    /// Accepts the identifier string, a Linux key code in `0..=255`, or the
    /// legacy object form `{"type": "special", "name": "f6"}` /
    /// `{"type": "char", "char": "a"}`.
    pub fn from_config_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n
                .as_u64()
                .filter(|code| *code <= 255)
                .and_then(|code| Self::from_scancode(code as u16)),
            Value::Object(map) => match map.get("type").and_then(Value::as_str) {
                Some("special") | None => map.get("name")?.as_str()?.parse().ok(),
                Some("char") => {
                    let s = map.get("char")?.as_str()?;
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Self::char(c),
                        _ => None,
                    }
                }
                Some(_) => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for KeyCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        let mut chars = normalized.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Self::char(c).ok_or(());
        }

        if let Some(n) = normalized.strip_prefix('f')
            && let Ok(n) = n.parse::<u8>()
        {
            return Self::function(n).ok_or(());
        }

        if let Some((key, _, _)) = NAMED_KEYS.iter().find(|(_, id, _)| *id == normalized) {
            return Ok(*key);
        }

        ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, key)| *key)
            .ok_or(())
    }
}
