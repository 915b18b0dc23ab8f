use crate::app::{UiEvent, UiSender};
use crate::clicker::ToggleController;
use crate::core::{ChannelId, ChannelStatus};
use crate::input::InputBackend;
use crate::thread::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Longest single sleep between activity checks. Bounds stop latency.
pub const POLL_TICK: Duration = Duration::from_millis(50);

const IDLE_WAIT: Duration = Duration::from_millis(250);

/// Repeats one channel's action while the controller keeps it active.
pub struct Scheduler {
    channel: ChannelId,
    controller: Arc<ToggleController>,
    backend: Arc<dyn InputBackend>,
    clock: Arc<dyn Clock>,
    ui: UiSender,
}

impl Scheduler {
    pub fn new(
        channel: ChannelId,
        controller: Arc<ToggleController>,
        backend: Arc<dyn InputBackend>,
        clock: Arc<dyn Clock>,
        ui: UiSender,
    ) -> Self {
        Self {
            channel,
            controller,
            backend,
            clock,
            ui,
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Worker loop. Returns once the controller shuts down.
    pub fn run(&self) {
        tracing::debug!("{} scheduler ready", self.channel);

        while !self.controller.is_shutdown() {
            if self.controller.wait_for_active(self.channel, IDLE_WAIT) {
                self.run_active();
            }
        }

        tracing::debug!("{} scheduler exited", self.channel);
    }

    /// Acts immediately, then once per interval until the channel goes
    /// inactive. Returns the number of actions performed.
    pub fn run_active(&self) -> usize {
        self.publish(ChannelStatus::Running);

        let mut performed = 0;
        let outcome = loop {
            let Some((interval, target)) = self.controller.next_cycle(self.channel) else {
                break Ok(());
            };

            if let Err(e) = self.backend.perform(target) {
                break Err(e);
            }
            performed += 1;

            self.sleep_while_active(interval);
        };

        match outcome {
            Ok(()) => self.publish(ChannelStatus::Idle),
            Err(e) => {
                let reason = e.to_string();
                tracing::error!("{} stopped after error: {}", self.channel, reason);
                self.controller.fail(self.channel, reason.clone());
                self.ui.post(UiEvent::StatusChanged {
                    channel: self.channel,
                    status: ChannelStatus::Error(reason),
                });
            }
        }

        tracing::debug!("{} ran {} action(s)", self.channel, performed);
        performed
    }

    fn sleep_while_active(&self, interval: Duration) {
        let deadline = self.clock.now() + interval;

        loop {
            let now = self.clock.now();
            if now >= deadline || !self.controller.is_active(self.channel) {
                return;
            }
            self.clock.sleep((deadline - now).min(POLL_TICK));
        }
    }

    fn publish(&self, status: ChannelStatus) {
        self.controller.set_status(self.channel, status.clone());
        self.ui.post(UiEvent::StatusChanged {
            channel: self.channel,
            status,
        });
    }
}
