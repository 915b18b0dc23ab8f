use crate::config::validate::validate_interval;
use crate::core::KeyCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Flat key-value view over the config file.
///
/// Every getter takes the field's default and falls back to it when the key
/// is missing or its value does not validate, so one bad field never spoils
/// the rest of the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigMap {
    values: Map<String, Value>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(values) => Some(Self { values }),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_interval(&self, key: &str, default: f64) -> f64 {
        self.values
            .get(key)
            .map(|v| validate_interval(v, default))
            .unwrap_or(default)
    }

    pub fn get_key(&self, key: &str, default: KeyCode) -> KeyCode {
        match self.values.get(key) {
            None => default,
            Some(value) => KeyCode::from_config_value(value).unwrap_or_else(|| {
                tracing::warn!("Invalid key {} for {}, using {}", value, key, default);
                default
            }),
        }
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(default),
            _ => default,
        }
    }

    /// Reads a lowercase-tagged enum such as a mouse button or backend name.
    pub fn get_enum<T>(&self, key: &str, default: T) -> T
    where
        T: DeserializeOwned + Copy + std::fmt::Display,
    {
        let Some(value) = self.values.get(key) else {
            return default;
        };

        let normalized = match value {
            Value::String(s) => Value::String(s.trim().to_lowercase()),
            other => other.clone(),
        };

        serde_json::from_value(normalized).unwrap_or_else(|_| {
            tracing::warn!("Invalid value {} for {}, using {}", value, key, default);
            default
        })
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn set_serialized<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.set(key, value),
            Err(e) => tracing::warn!("Cannot serialize {}: {}", key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BackendKind, MouseButton};
    use serde_json::json;

    fn map(value: Value) -> ConfigMap {
        ConfigMap::from_value(value).unwrap()
    }

    #[test]
    fn missing_keys_use_defaults() {
        let cfg = ConfigMap::new();
        assert_eq!(cfg.get_interval("x", 0.3), 0.3);
        assert_eq!(cfg.get_key("x", KeyCode::Function(6)), KeyCode::Function(6));
        assert_eq!(cfg.get_string("x", "F6"), "F6");
        assert!(cfg.get_bool("x", true));
        assert_eq!(cfg.get_enum("x", MouseButton::Left), MouseButton::Left);
    }

    #[test]
    fn invalid_values_use_defaults() {
        let cfg = map(json!({
            "interval": "slow",
            "key": {"type": "special", "name": "nope"},
            "display": 12,
            "flag": "yes",
            "button": "thumb",
        }));
        assert_eq!(cfg.get_interval("interval", 0.5), 0.5);
        assert_eq!(cfg.get_key("key", KeyCode::Space), KeyCode::Space);
        assert_eq!(cfg.get_string("display", "Space"), "Space");
        assert!(!cfg.get_bool("flag", false));
        assert_eq!(cfg.get_enum("button", MouseButton::Right), MouseButton::Right);
    }

    #[test]
    fn set_then_get() {
        let mut cfg = ConfigMap::new();
        cfg.set("interval", 2.5);
        cfg.set("key", "f10");
        cfg.set("flag", false);
        assert_eq!(cfg.get_interval("interval", 0.1), 2.5);
        assert_eq!(cfg.get_key("key", KeyCode::Space), KeyCode::Function(10));
        assert!(!cfg.get_bool("flag", true));
        assert!(cfg.contains("flag"));
    }

    #[test]
    fn enums_go_through_serde() {
        let mut cfg = ConfigMap::new();
        cfg.set_serialized("button", &MouseButton::Middle);
        cfg.set_serialized("backend", &BackendKind::Evdev);
        assert_eq!(cfg.get_raw("button"), Some(&json!("middle")));
        assert_eq!(cfg.get_raw("backend"), Some(&json!("evdev")));
        assert_eq!(cfg.get_enum("button", MouseButton::Left), MouseButton::Middle);
        assert_eq!(cfg.get_enum("backend", BackendKind::Rdev), BackendKind::Evdev);

        let legacy = map(json!({"button": " Right ", "backend": 3}));
        assert_eq!(legacy.get_enum("button", MouseButton::Left), MouseButton::Right);
        assert_eq!(legacy.get_enum("backend", BackendKind::Rdev), BackendKind::Rdev);
    }

    #[test]
    fn non_object_root_is_rejected() {
        assert!(ConfigMap::from_value(json!([1, 2, 3])).is_none());
        assert!(ConfigMap::from_value(json!("config")).is_none());
    }
}
