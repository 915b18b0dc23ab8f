use crate::config::ConfigMap;
use crate::config::constants::{defaults, keys};
use crate::core::{
    BackendKind, BindingTarget, ChannelId, ChannelTarget, DacError, DacResult, KeyCode, MouseButton,
};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A key plus the name shown to the user for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub display: String,
}

impl KeyBinding {
    pub fn new(key: KeyCode) -> Self {
        Self {
            key,
            display: key.display_name(),
        }
    }

    fn load(map: &ConfigMap, key_field: &str, display_field: &str, default: KeyCode) -> Self {
        let loaded = map
            .get_raw(key_field)
            .and_then(KeyCode::from_config_value);

        match loaded {
            Some(key) => Self {
                key,
                display: map.get_string(display_field, &key.display_name()),
            },
            None => {
                if map.contains(key_field) {
                    tracing::warn!("Invalid {} in config, using {}", key_field, default);
                }
                Self::new(default)
            }
        }
    }

    fn store(&self, map: &mut ConfigMap, key_field: &str, display_field: &str) {
        map.set(key_field, self.key.identifier());
        map.set(display_field, self.display.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickerSettings {
    pub interval: f64,
    pub hotkey: KeyBinding,
    pub button: MouseButton,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyPresserSettings {
    pub interval: f64,
    pub hotkey: KeyBinding,
    pub target_key: KeyBinding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub clicker1: ClickerSettings,
    pub clicker2: ClickerSettings,
    pub key_presser: KeyPresserSettings,
    pub emergency_stop: KeyBinding,
    pub auto_check_updates: bool,
    pub input_backend: BackendKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clicker1: ClickerSettings {
                interval: defaults::CLICKER1_INTERVAL,
                hotkey: KeyBinding::new(defaults::CLICKER1_HOTKEY),
                button: defaults::CLICKER_BUTTON,
            },
            clicker2: ClickerSettings {
                interval: defaults::CLICKER2_INTERVAL,
                hotkey: KeyBinding::new(defaults::CLICKER2_HOTKEY),
                button: defaults::CLICKER_BUTTON,
            },
            key_presser: KeyPresserSettings {
                interval: defaults::KEYPRESSER_INTERVAL,
                hotkey: KeyBinding::new(defaults::KEYPRESSER_HOTKEY),
                target_key: KeyBinding::new(defaults::KEYPRESSER_TARGET_KEY),
            },
            emergency_stop: KeyBinding::new(defaults::EMERGENCY_STOP_HOTKEY),
            auto_check_updates: defaults::AUTO_CHECK_UPDATES,
            input_backend: defaults::INPUT_BACKEND,
        }
    }
}

impl Settings {
    pub fn from_map(map: &ConfigMap) -> Self {
        Self {
            clicker1: ClickerSettings {
                interval: map.get_interval(keys::CLICKER1_INTERVAL, defaults::CLICKER1_INTERVAL),
                hotkey: KeyBinding::load(
                    map,
                    keys::CLICKER1_HOTKEY,
                    keys::CLICKER1_HOTKEY_DISPLAY,
                    defaults::CLICKER1_HOTKEY,
                ),
                button: map.get_enum(keys::CLICKER1_BUTTON, defaults::CLICKER_BUTTON),
            },
            clicker2: ClickerSettings {
                interval: map.get_interval(keys::CLICKER2_INTERVAL, defaults::CLICKER2_INTERVAL),
                hotkey: KeyBinding::load(
                    map,
                    keys::CLICKER2_HOTKEY,
                    keys::CLICKER2_HOTKEY_DISPLAY,
                    defaults::CLICKER2_HOTKEY,
                ),
                button: map.get_enum(keys::CLICKER2_BUTTON, defaults::CLICKER_BUTTON),
            },
            key_presser: KeyPresserSettings {
                interval: map
                    .get_interval(keys::KEYPRESSER_INTERVAL, defaults::KEYPRESSER_INTERVAL),
                hotkey: KeyBinding::load(
                    map,
                    keys::KEYPRESSER_HOTKEY,
                    keys::KEYPRESSER_HOTKEY_DISPLAY,
                    defaults::KEYPRESSER_HOTKEY,
                ),
                target_key: KeyBinding::load(
                    map,
                    keys::KEYPRESSER_TARGET_KEY,
                    keys::KEYPRESSER_TARGET_KEY_DISPLAY,
                    defaults::KEYPRESSER_TARGET_KEY,
                ),
            },
            emergency_stop: KeyBinding::load(
                map,
                keys::EMERGENCY_STOP_HOTKEY,
                keys::EMERGENCY_STOP_HOTKEY_DISPLAY,
                defaults::EMERGENCY_STOP_HOTKEY,
            ),
            auto_check_updates: map
                .get_bool(keys::AUTO_CHECK_UPDATES, defaults::AUTO_CHECK_UPDATES),
            input_backend: map.get_enum(keys::INPUT_BACKEND, defaults::INPUT_BACKEND),
        }
    }

    pub fn to_map(&self) -> ConfigMap {
        let mut map = ConfigMap::new();

        map.set(keys::CLICKER1_INTERVAL, self.clicker1.interval);
        self.clicker1
            .hotkey
            .store(&mut map, keys::CLICKER1_HOTKEY, keys::CLICKER1_HOTKEY_DISPLAY);
        map.set_serialized(keys::CLICKER1_BUTTON, &self.clicker1.button);

        map.set(keys::CLICKER2_INTERVAL, self.clicker2.interval);
        self.clicker2
            .hotkey
            .store(&mut map, keys::CLICKER2_HOTKEY, keys::CLICKER2_HOTKEY_DISPLAY);
        map.set_serialized(keys::CLICKER2_BUTTON, &self.clicker2.button);

        map.set(keys::KEYPRESSER_INTERVAL, self.key_presser.interval);
        self.key_presser.hotkey.store(
            &mut map,
            keys::KEYPRESSER_HOTKEY,
            keys::KEYPRESSER_HOTKEY_DISPLAY,
        );
        self.key_presser.target_key.store(
            &mut map,
            keys::KEYPRESSER_TARGET_KEY,
            keys::KEYPRESSER_TARGET_KEY_DISPLAY,
        );

        self.emergency_stop.store(
            &mut map,
            keys::EMERGENCY_STOP_HOTKEY,
            keys::EMERGENCY_STOP_HOTKEY_DISPLAY,
        );

        map.set(keys::AUTO_CHECK_UPDATES, self.auto_check_updates);
        map.set_serialized(keys::INPUT_BACKEND, &self.input_backend);
        map
    }

    pub fn interval(&self, channel: ChannelId) -> f64 {
        match channel {
            ChannelId::Clicker1 => self.clicker1.interval,
            ChannelId::Clicker2 => self.clicker2.interval,
            ChannelId::KeyPresser => self.key_presser.interval,
        }
    }

    pub fn set_interval(&mut self, channel: ChannelId, seconds: f64) {
        match channel {
            ChannelId::Clicker1 => self.clicker1.interval = seconds,
            ChannelId::Clicker2 => self.clicker2.interval = seconds,
            ChannelId::KeyPresser => self.key_presser.interval = seconds,
        }
    }

    pub fn target(&self, channel: ChannelId) -> ChannelTarget {
        match channel {
            ChannelId::Clicker1 => ChannelTarget::Mouse(self.clicker1.button),
            ChannelId::Clicker2 => ChannelTarget::Mouse(self.clicker2.button),
            ChannelId::KeyPresser => ChannelTarget::Key(self.key_presser.target_key.key),
        }
    }

    pub fn hotkey(&self, target: BindingTarget) -> &KeyBinding {
        match target {
            BindingTarget::Channel(ChannelId::Clicker1) => &self.clicker1.hotkey,
            BindingTarget::Channel(ChannelId::Clicker2) => &self.clicker2.hotkey,
            BindingTarget::Channel(ChannelId::KeyPresser) => &self.key_presser.hotkey,
            BindingTarget::EmergencyStop => &self.emergency_stop,
        }
    }

    pub fn hotkey_mut(&mut self, target: BindingTarget) -> &mut KeyBinding {
        match target {
            BindingTarget::Channel(ChannelId::Clicker1) => &mut self.clicker1.hotkey,
            BindingTarget::Channel(ChannelId::Clicker2) => &mut self.clicker2.hotkey,
            BindingTarget::Channel(ChannelId::KeyPresser) => &mut self.key_presser.hotkey,
            BindingTarget::EmergencyStop => &mut self.emergency_stop,
        }
    }
}

pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    pub fn new() -> DacResult<Self> {
        Self::new_with_path(Self::settings_dir()?.join(defaults::CONFIG_FILE))
    }

    pub fn new_with_path(path: PathBuf) -> DacResult<Self> {
        Ok(Self {
            settings_path: path,
        })
    }

    /// Per-user directory holding the config file and the log.
    pub fn settings_dir() -> DacResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            DacError::Config("Cannot determine the user config directory".to_string())
        })?;

        Ok(config_dir.join(defaults::DAC_DIR))
    }

    pub fn load(&self) -> DacResult<Settings> {
        if !self.settings_path.exists() {
            tracing::info!(
                "No config at {}, using defaults",
                self.settings_path.display()
            );
            return Ok(Settings::default());
        }

        let bytes = std::fs::read(&self.settings_path)?;

        // Invalid UTF-8 surfaces as a serde error, so it takes the backup path too.
        let parsed = serde_json::from_slice(&bytes)
            .map_err(|e| e.to_string())
            .and_then(|value| {
                ConfigMap::from_value(value)
                    .ok_or_else(|| "top-level value is not an object".to_string())
            });

        match parsed {
            Ok(map) => Ok(Settings::from_map(&map)),
            Err(e) => {
                tracing::warn!("Settings file corrupted: {}. Using defaults.", e);
                self.backup_corrupted_file()?;
                Ok(Settings::default())
            }
        }
    }

    fn backup_corrupted_file(&self) -> DacResult<()> {
        let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");

        let backup_path = self
            .settings_path
            .with_extension(format!("json.corrupt.{}", timestamp));

        std::fs::rename(&self.settings_path, &backup_path).map_err(|e| {
            DacError::Config(format!("Failed to backup corrupted settings: {}", e))
        })?;

        tracing::info!("Corrupted settings moved to {}", backup_path.display());
        Ok(())
    }

    pub fn save(&self, settings: &Settings) -> DacResult<()> {
        if let Some(parent) = self.settings_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&settings.to_map().into_value())?;

        let temp_path = self.settings_path.with_extension("tmp");
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, &self.settings_path)?;
        tracing::debug!("Settings saved to {}", self.settings_path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }
}
