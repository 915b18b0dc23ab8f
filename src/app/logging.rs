use crate::config::SettingsManager;
use crate::config::constants::defaults;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "dac_clicker=info,warn";

/// Log to `<config dir>/dac-clicker/dac-clicker.log`, or stderr when the
/// file cannot be opened. The terminal itself belongs to the control panel.
///
/// Returns the log file path when file logging is active.
pub fn init_logging() -> Option<PathBuf> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    match open_log_file() {
        Some((path, file)) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
            Some(path)
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
            None
        }
    }
}

fn open_log_file() -> Option<(PathBuf, File)> {
    let dir = SettingsManager::settings_dir().ok()?;
    fs::create_dir_all(&dir).ok()?;

    let path = dir.join(defaults::LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;
    Some((path, file))
}
