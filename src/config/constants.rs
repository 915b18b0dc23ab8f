pub mod defaults {
    use crate::core::{BackendKind, KeyCode, MouseButton};

    pub const MIN_INTERVAL: f64 = 0.01;
    pub const MAX_INTERVAL: f64 = 60.0;

    pub const CLICKER1_INTERVAL: f64 = 0.1;
    pub const CLICKER2_INTERVAL: f64 = 0.5;
    pub const KEYPRESSER_INTERVAL: f64 = 0.1;

    pub const CLICKER1_HOTKEY: KeyCode = KeyCode::Function(6);
    pub const CLICKER2_HOTKEY: KeyCode = KeyCode::Function(7);
    pub const KEYPRESSER_HOTKEY: KeyCode = KeyCode::Function(8);
    pub const EMERGENCY_STOP_HOTKEY: KeyCode = KeyCode::Function(9);
    pub const KEYPRESSER_TARGET_KEY: KeyCode = KeyCode::Space;

    pub const CLICKER_BUTTON: MouseButton = MouseButton::Left;

    pub const AUTO_CHECK_UPDATES: bool = true;
    pub const INPUT_BACKEND: BackendKind = BackendKind::Rdev;

    pub const DAC_DIR: &str = "dac-clicker";
    pub const CONFIG_FILE: &str = "config.json";
    pub const LOG_FILE: &str = "dac-clicker.log";
}

pub mod keys {
    pub const CLICKER1_INTERVAL: &str = "clicker1_interval";
    pub const CLICKER1_HOTKEY: &str = "clicker1_hotkey";
    pub const CLICKER1_HOTKEY_DISPLAY: &str = "clicker1_hotkey_display";
    pub const CLICKER1_BUTTON: &str = "clicker1_button";

    pub const CLICKER2_INTERVAL: &str = "clicker2_interval";
    pub const CLICKER2_HOTKEY: &str = "clicker2_hotkey";
    pub const CLICKER2_HOTKEY_DISPLAY: &str = "clicker2_hotkey_display";
    pub const CLICKER2_BUTTON: &str = "clicker2_button";

    pub const KEYPRESSER_INTERVAL: &str = "keypresser_interval";
    pub const KEYPRESSER_HOTKEY: &str = "keypresser_hotkey";
    pub const KEYPRESSER_HOTKEY_DISPLAY: &str = "keypresser_hotkey_display";
    pub const KEYPRESSER_TARGET_KEY: &str = "keypresser_target_key";
    pub const KEYPRESSER_TARGET_KEY_DISPLAY: &str = "keypresser_target_key_display";

    pub const EMERGENCY_STOP_HOTKEY: &str = "emergency_stop_hotkey";
    pub const EMERGENCY_STOP_HOTKEY_DISPLAY: &str = "emergency_stop_hotkey_display";

    pub const AUTO_CHECK_UPDATES: &str = "auto_check_updates";
    pub const INPUT_BACKEND: &str = "input_backend";
}

#[cfg(test)]
mod tests {
    use super::defaults::*;

    #[test]
    fn interval_bounds_are_sensible() {
        assert!(MIN_INTERVAL > 0.0);
        assert!(MIN_INTERVAL < 1.0);
        assert!(MAX_INTERVAL > MIN_INTERVAL);
        assert!(MAX_INTERVAL <= 3600.0);
    }

    #[test]
    fn default_intervals_within_bounds() {
        for interval in [CLICKER1_INTERVAL, CLICKER2_INTERVAL, KEYPRESSER_INTERVAL] {
            assert!((MIN_INTERVAL..=MAX_INTERVAL).contains(&interval));
        }
    }
}
