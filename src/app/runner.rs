use crate::app::{UiEvent, UiReceiver, UiSender, ui_queue};
use crate::clicker::{Scheduler, ToggleController};
use crate::config::{Settings, SettingsManager};
use crate::core::{ChannelId, DacError, DacResult};
use crate::input::{HotkeyDispatcher, InputBackend, select_backend};
use crate::menu::ControlPanel;
use crate::thread::{Clock, SystemClock, ThreadManager};
use std::sync::Arc;

/// Wires the controller, schedulers, input backend and control panel.
pub struct DacApp {
    settings: Settings,
    settings_manager: SettingsManager,
    controller: Arc<ToggleController>,
    dispatcher: Arc<HotkeyDispatcher>,
    backend: Arc<dyn InputBackend>,
    clock: Arc<dyn Clock>,
    thread_manager: ThreadManager,
    ui: UiSender,
    events: Option<UiReceiver>,
    stopped: bool,
}

impl Drop for DacApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl DacApp {
    pub fn new(settings_manager: SettingsManager) -> DacResult<Self> {
        let settings = settings_manager.load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config ({}), using defaults", e);
            Settings::default()
        });

        let (ui, events) = ui_queue();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let controller = Arc::new(ToggleController::new(&settings));

        let (backend, fallback) = select_backend(settings.input_backend);
        if let Some(reason) = fallback {
            ui.post(UiEvent::Notice(format!(
                "{} backend unavailable ({}), using {}",
                settings.input_backend,
                reason,
                backend.kind()
            )));
        }

        let dispatcher = Arc::new(HotkeyDispatcher::new(
            &settings,
            Arc::clone(&controller),
            Arc::clone(&clock),
            ui.clone(),
        ));

        Ok(Self {
            thread_manager: ThreadManager::new(Arc::clone(&controller)),
            settings,
            settings_manager,
            controller,
            dispatcher,
            backend,
            clock,
            ui,
            events: Some(events),
            stopped: false,
        })
    }

    pub fn controller(&self) -> &Arc<ToggleController> {
        &self.controller
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn run(&mut self) -> DacResult<()> {
        let events = self
            .events
            .take()
            .ok_or_else(|| DacError::InvalidInput("Application already ran".to_string()))?;

        tracing::info!(
            "Starting with {} backend, config at {}",
            self.backend.kind(),
            self.settings_manager.path().display()
        );

        self.start_backend();
        self.start_workers()?;

        let result = ControlPanel::new(
            &mut self.settings,
            &self.settings_manager,
            Arc::clone(&self.controller),
            Arc::clone(&self.dispatcher),
            events,
            self.backend.kind(),
        )
        .run();

        self.shutdown();
        result
    }

    // Failures here leave manual toggles and config editing usable.
    fn start_backend(&self) {
        if let Err(e) = self.backend.prepare() {
            tracing::error!("Output device unavailable: {}", e);
            self.ui
                .post(UiEvent::Notice(format!("Output device unavailable: {}", e)));
        }

        if let Err(e) = self.backend.listen(self.dispatcher.clone()) {
            tracing::error!("Hotkey listener failed to start: {}", e);
            self.ui.post(UiEvent::BackendFailure(format!(
                "global hotkeys unavailable: {}",
                e
            )));
        }
    }

    fn start_workers(&mut self) -> DacResult<()> {
        for &channel in ChannelId::all() {
            let scheduler = Scheduler::new(
                channel,
                Arc::clone(&self.controller),
                Arc::clone(&self.backend),
                Arc::clone(&self.clock),
                self.ui.clone(),
            );
            self.thread_manager.spawn(scheduler)?;
        }
        Ok(())
    }

    /// Stops every channel, joins the workers and saves the config.
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        self.backend.shutdown();
        if let Err(e) = self.thread_manager.stop_all() {
            tracing::error!("{}", e);
        }
        if let Err(e) = self.settings_manager.save(&self.settings) {
            tracing::error!("Failed to save config on exit: {}", e);
        }

        tracing::info!("Stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> SettingsManager {
        SettingsManager::new_with_path(dir.path().join("config.json")).unwrap()
    }

    #[test]
    fn controller_starts_from_saved_settings() {
        let dir = TempDir::new().unwrap();
        let mut saved = Settings::default();
        saved.key_presser.interval = 2.5;
        manager(&dir).save(&saved).unwrap();

        let app = DacApp::new(manager(&dir)).unwrap();
        assert_eq!(app.controller().interval(ChannelId::KeyPresser), 2.5);
        assert_eq!(app.settings(), &saved);
    }

    #[test]
    fn workers_start_and_shutdown_saves() {
        let dir = TempDir::new().unwrap();
        let mut app = DacApp::new(manager(&dir)).unwrap();

        app.start_workers().unwrap();
        assert_eq!(app.thread_manager.running(), ChannelId::COUNT);

        app.shutdown();
        assert_eq!(app.thread_manager.running(), 0);
        assert!(app.controller().is_shutdown());
        assert!(dir.path().join("config.json").exists());

        app.shutdown();
    }
}
