use crate::core::KeyCode;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "Left"),
            Self::Right => write!(f, "Right"),
            Self::Middle => write!(f, "Middle"),
        }
    }
}

impl MouseButton {
    pub const fn next(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Middle,
            Self::Middle => Self::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    MouseClick,
    KeyPress,
}

/// One of the three automation channels. The set is closed, so an invalid
/// channel id cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Clicker1,
    Clicker2,
    KeyPresser,
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clicker1 => write!(f, "Clicker 1"),
            Self::Clicker2 => write!(f, "Clicker 2"),
            Self::KeyPresser => write!(f, "Key Presser"),
        }
    }
}

impl ChannelId {
    pub const COUNT: usize = 3;

    pub const fn all() -> &'static [Self] {
        &[Self::Clicker1, Self::Clicker2, Self::KeyPresser]
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Clicker1 => 0,
            Self::Clicker2 => 1,
            Self::KeyPresser => 2,
        }
    }

    pub const fn kind(self) -> ChannelKind {
        match self {
            Self::Clicker1 | Self::Clicker2 => ChannelKind::MouseClick,
            Self::KeyPresser => ChannelKind::KeyPress,
        }
    }

    /// The mouse channel that must be stopped when this one starts.
    pub const fn rival(self) -> Option<Self> {
        match self {
            Self::Clicker1 => Some(Self::Clicker2),
            Self::Clicker2 => Some(Self::Clicker1),
            Self::KeyPresser => None,
        }
    }

    pub const fn thread_name(self) -> &'static str {
        match self {
            Self::Clicker1 => "DacClicker1",
            Self::Clicker2 => "DacClicker2",
            Self::KeyPresser => "DacKeyPresser",
        }
    }
}

/// What a hotkey is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingTarget {
    Channel(ChannelId),
    EmergencyStop,
}

impl fmt::Display for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(id) => write!(f, "{}", id),
            Self::EmergencyStop => write!(f, "Emergency Stop"),
        }
    }
}

impl BindingTarget {
    /// Resolution order when several bindings share a key.
    pub const fn all() -> &'static [Self] {
        &[
            Self::EmergencyStop,
            Self::Channel(ChannelId::Clicker1),
            Self::Channel(ChannelId::Clicker2),
            Self::Channel(ChannelId::KeyPresser),
        ]
    }
}

/// Destination of the next captured key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureTarget {
    Hotkey(BindingTarget),
    PressTarget,
}

impl fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hotkey(target) => write!(f, "{} hotkey", target),
            Self::PressTarget => write!(f, "Key Presser target key"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget {
    Mouse(MouseButton),
    Key(KeyCode),
}

impl fmt::Display for ChannelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mouse(button) => write!(f, "{} Mouse", button),
            Self::Key(key) => write!(f, "{}", key.display_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Idle,
    Running,
    Error(String),
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl ChannelStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Rdev,
    Evdev,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rdev => write!(f, "rdev"),
            Self::Evdev => write!(f, "evdev"),
        }
    }
}
