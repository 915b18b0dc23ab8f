pub mod backend;
#[cfg(target_os = "linux")]
pub mod evdev_backend;
pub mod hotkey;
pub mod rdev_backend;

#[cfg(test)]
pub use backend::MockBackend;
pub use backend::{InputBackend, KeyEventSink, create_backend, select_backend};
#[cfg(target_os = "linux")]
pub use evdev_backend::EvdevBackend;
pub use hotkey::{Dispatch, HOTKEY_COOLDOWN, HotkeyDispatcher};
pub use rdev_backend::RdevBackend;
