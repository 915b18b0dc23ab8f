pub mod constants;
pub mod settings;
pub mod store;
pub mod validate;

pub use settings::{ClickerSettings, KeyBinding, KeyPresserSettings, Settings, SettingsManager};
pub use store::ConfigMap;
pub use validate::{clamp_interval, parse_interval_input, validate_interval};
