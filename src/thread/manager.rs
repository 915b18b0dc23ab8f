use crate::clicker::{Scheduler, ToggleController};
use crate::core::{ChannelId, DacError, DacResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{Builder, JoinHandle};

/// Owns one long-lived scheduler thread per channel.
pub struct ThreadManager {
    controller: Arc<ToggleController>,
    handles: HashMap<ChannelId, JoinHandle<()>>,
}

impl ThreadManager {
    pub fn new(controller: Arc<ToggleController>) -> Self {
        Self {
            controller,
            handles: HashMap::new(),
        }
    }

    pub fn spawn(&mut self, scheduler: Scheduler) -> DacResult<()> {
        let channel = scheduler.channel();
        if self.handles.contains_key(&channel) {
            return Err(DacError::Thread(format!(
                "Scheduler for {} is already running",
                channel
            )));
        }

        let name = channel.thread_name();
        let handle = Builder::new()
            .name(name.to_string())
            .spawn(move || scheduler.run())
            .map_err(|e| DacError::Thread(format!("Failed to spawn thread {}: {}", name, e)))?;

        tracing::debug!("Spawned {}", name);
        self.handles.insert(channel, handle);
        Ok(())
    }

    pub fn running(&self) -> usize {
        self.handles.len()
    }

    /// Shuts the controller down and joins every scheduler.
    pub fn stop_all(&mut self) -> DacResult<()> {
        self.controller.shutdown();

        let mut failed = Vec::new();
        for (channel, handle) in self.handles.drain() {
            if handle.join().is_err() {
                failed.push(channel.to_string());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(DacError::Thread(format!(
                "Scheduler thread(s) panicked: {}",
                failed.join(", ")
            )))
        }
    }
}

impl Drop for ThreadManager {
    fn drop(&mut self) {
        if let Err(e) = self.stop_all() {
            tracing::error!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ui_queue;
    use crate::config::Settings;
    use crate::input::MockBackend;
    use crate::thread::SystemClock;
    use std::time::Duration;

    #[test]
    fn spawns_and_joins_all_channels() {
        let controller = Arc::new(ToggleController::new(&Settings::default()));
        let backend = Arc::new(MockBackend::new());
        let (ui, _rx) = ui_queue();
        let mut manager = ThreadManager::new(Arc::clone(&controller));

        for &channel in ChannelId::all() {
            let scheduler = Scheduler::new(
                channel,
                Arc::clone(&controller),
                backend.clone(),
                Arc::new(SystemClock),
                ui.clone(),
            );
            manager.spawn(scheduler).unwrap();
        }
        assert_eq!(manager.running(), 3);

        controller.start(ChannelId::KeyPresser);
        std::thread::sleep(Duration::from_millis(30));

        manager.stop_all().unwrap();
        assert_eq!(manager.running(), 0);
        assert!(controller.is_shutdown());
        assert!(!backend.actions().is_empty());
    }

    #[test]
    fn rejects_duplicate_channel() {
        let controller = Arc::new(ToggleController::new(&Settings::default()));
        let backend = Arc::new(MockBackend::new());
        let (ui, _rx) = ui_queue();
        let mut manager = ThreadManager::new(Arc::clone(&controller));

        let make = || {
            Scheduler::new(
                ChannelId::Clicker1,
                Arc::clone(&controller),
                backend.clone(),
                Arc::new(SystemClock),
                ui.clone(),
            )
        };
        manager.spawn(make()).unwrap();
        assert!(matches!(manager.spawn(make()), Err(DacError::Thread(_))));
    }
}
