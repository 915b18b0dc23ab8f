pub mod app;
pub mod clicker;
pub mod config;
pub mod core;
pub mod input;
pub mod menu;
pub mod thread;

pub use core::{
    BackendKind, BindingTarget, CaptureTarget, ChannelId, ChannelKind, ChannelStatus,
    ChannelTarget, DacError, DacResult, KeyCode, MouseButton,
};

pub use config::{Settings, SettingsManager};

pub use clicker::{ChannelSnapshot, Scheduler, ToggleController};

pub use input::{HotkeyDispatcher, InputBackend, KeyEventSink, RdevBackend};

pub use thread::{Clock, SystemClock, ThreadManager};

pub use menu::ControlPanel;

pub use app::{DacApp, UiEvent};
