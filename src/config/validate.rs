use crate::config::constants::defaults::{MAX_INTERVAL, MIN_INTERVAL};
use serde_json::Value;

/// Clamps a finite interval into `[MIN_INTERVAL, MAX_INTERVAL]`.
/// Non-finite input yields `default`.
pub fn clamp_interval(seconds: f64, default: f64) -> f64 {
    if !seconds.is_finite() {
        return default;
    }
    seconds.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

/// Interprets a config value as an interval in seconds.
///
/// Numbers and numeric strings are accepted; anything else returns `default`.
/// Out-of-range numbers are clamped to the nearest bound.
pub fn validate_interval(value: &Value, default: f64) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(seconds) => {
            let validated = clamp_interval(seconds, default);
            if validated != seconds {
                tracing::warn!(
                    "Interval {} outside [{}, {}], using {}",
                    seconds,
                    MIN_INTERVAL,
                    MAX_INTERVAL,
                    validated
                );
            }
            validated
        }
        None => {
            tracing::warn!("Invalid interval value {}, using default {}", value, default);
            default
        }
    }
}

/// Parses user-entered interval text. Returns `None` for anything that is not
/// a number inside the allowed range, so the caller can reject the edit.
pub fn parse_interval_input(input: &str) -> Option<f64> {
    let seconds = input.trim().parse::<f64>().ok()?;
    (seconds.is_finite() && (MIN_INTERVAL..=MAX_INTERVAL).contains(&seconds)).then_some(seconds)
}
