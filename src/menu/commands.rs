use crate::core::{BindingTarget, ChannelId, KeyCode};
use crossterm::event::{KeyCode as TermKey, KeyEvent, KeyModifiers};

/// Top-level control panel commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Toggle(ChannelId),
    EditInterval,
    RebindHotkey,
    CaptureTargetKey,
    CycleButton,
    ToggleAutoUpdate,
    EmergencyStop,
    Quit,
}

impl PanelCommand {
    pub const ALL: [Self; 10] = [
        Self::Toggle(ChannelId::Clicker1),
        Self::Toggle(ChannelId::Clicker2),
        Self::Toggle(ChannelId::KeyPresser),
        Self::EditInterval,
        Self::RebindHotkey,
        Self::CaptureTargetKey,
        Self::CycleButton,
        Self::ToggleAutoUpdate,
        Self::EmergencyStop,
        Self::Quit,
    ];

    pub fn from_key(event: &KeyEvent) -> Option<Self> {
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                TermKey::Char('c') | TermKey::Char('q') => Some(Self::Quit),
                _ => None,
            };
        }

        match event.code {
            TermKey::Char(c) => Self::from_char(c.to_ascii_lowercase()),
            TermKey::Esc => Some(Self::Quit),
            _ => None,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Toggle(ChannelId::Clicker1)),
            '2' => Some(Self::Toggle(ChannelId::Clicker2)),
            '3' => Some(Self::Toggle(ChannelId::KeyPresser)),
            'i' => Some(Self::EditInterval),
            'h' => Some(Self::RebindHotkey),
            't' => Some(Self::CaptureTargetKey),
            'b' => Some(Self::CycleButton),
            'u' => Some(Self::ToggleAutoUpdate),
            'x' => Some(Self::EmergencyStop),
            'q' => Some(Self::Quit),
            _ => None,
        }
    }

    pub fn key_hint(&self) -> &'static str {
        match self {
            Self::Toggle(ChannelId::Clicker1) => "1",
            Self::Toggle(ChannelId::Clicker2) => "2",
            Self::Toggle(ChannelId::KeyPresser) => "3",
            Self::EditInterval => "I",
            Self::RebindHotkey => "H",
            Self::CaptureTargetKey => "T",
            Self::CycleButton => "B",
            Self::ToggleAutoUpdate => "U",
            Self::EmergencyStop => "X",
            Self::Quit => "Q",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Toggle(ChannelId::Clicker1) => "Toggle Clicker 1",
            Self::Toggle(ChannelId::Clicker2) => "Toggle Clicker 2",
            Self::Toggle(ChannelId::KeyPresser) => "Toggle Key Presser",
            Self::EditInterval => "Set interval",
            Self::RebindHotkey => "Rebind hotkey",
            Self::CaptureTargetKey => "Set key to press",
            Self::CycleButton => "Change clicker button",
            Self::ToggleAutoUpdate => "Toggle update check flag",
            Self::EmergencyStop => "Emergency stop",
            Self::Quit => "Quit",
        }
    }
}

/// `1`..`3` picks a channel in the sub-prompts.
pub fn channel_from_key(event: &KeyEvent) -> Option<ChannelId> {
    match event.code {
        TermKey::Char('1') => Some(ChannelId::Clicker1),
        TermKey::Char('2') => Some(ChannelId::Clicker2),
        TermKey::Char('3') => Some(ChannelId::KeyPresser),
        _ => None,
    }
}

/// `1`..`3` picks a channel hotkey, `4` the emergency stop.
pub fn binding_from_key(event: &KeyEvent) -> Option<BindingTarget> {
    match event.code {
        TermKey::Char('4') => Some(BindingTarget::EmergencyStop),
        _ => channel_from_key(event).map(BindingTarget::Channel),
    }
}

/// Terminal key to `KeyCode`, for capturing keys while no global
/// listener is running.
pub fn term_to_key(code: TermKey) -> Option<KeyCode> {
    match code {
        TermKey::Char(' ') => Some(KeyCode::Space),
        TermKey::Char(c) => KeyCode::char(c.to_ascii_lowercase()),
        TermKey::F(n) => KeyCode::function(n),
        TermKey::Enter => Some(KeyCode::Enter),
        TermKey::Tab => Some(KeyCode::Tab),
        TermKey::Esc => Some(KeyCode::Escape),
        TermKey::Backspace => Some(KeyCode::Backspace),
        TermKey::Delete => Some(KeyCode::Delete),
        TermKey::Insert => Some(KeyCode::Insert),
        TermKey::Home => Some(KeyCode::Home),
        TermKey::End => Some(KeyCode::End),
        TermKey::PageUp => Some(KeyCode::PageUp),
        TermKey::PageDown => Some(KeyCode::PageDown),
        TermKey::Up => Some(KeyCode::Up),
        TermKey::Down => Some(KeyCode::Down),
        TermKey::Left => Some(KeyCode::Left),
        TermKey::Right => Some(KeyCode::Right),
        TermKey::CapsLock => Some(KeyCode::CapsLock),
        _ => None,
    }
}
