use dac_clicker::app::init_logging;
use dac_clicker::{DacApp, DacError, DacResult, SettingsManager};

fn main() -> DacResult<()> {
    let log_path = init_logging();
    tracing::info!("dac-clicker {} starting", env!("CARGO_PKG_VERSION"));
    if let Some(path) = log_path {
        tracing::debug!("Logging to {}", path.display());
    }

    let settings_manager = SettingsManager::new()?;
    let mut app = DacApp::new(settings_manager)?;

    match app.run() {
        Ok(()) | Err(DacError::UserExit) => Ok(()),
        Err(e) => {
            tracing::error!("Fatal: {}", e);
            Err(e)
        }
    }
}
