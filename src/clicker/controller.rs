use crate::config::{Settings, clamp_interval};
use crate::core::{ChannelId, ChannelKind, ChannelStatus, ChannelTarget};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Point-in-time copy of one channel, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSnapshot {
    pub id: ChannelId,
    pub active: bool,
    pub interval: f64,
    pub target: ChannelTarget,
    pub status: ChannelStatus,
}

#[derive(Debug, Clone)]
struct ChannelState {
    active: bool,
    interval: f64,
    target: ChannelTarget,
    status: ChannelStatus,
}

#[derive(Debug)]
struct ControllerState {
    channels: [ChannelState; ChannelId::COUNT],
    shutdown: bool,
}

impl ControllerState {
    fn channel(&self, id: ChannelId) -> &ChannelState {
        &self.channels[id.index()]
    }

    fn channel_mut(&mut self, id: ChannelId) -> &mut ChannelState {
        &mut self.channels[id.index()]
    }
}

/// Owns the on/off state of every channel.
///
/// All channels share one lock, so the mouse-clicker exclusion rule and
/// emergency stop are atomic for every observer: no reader can see both
/// clickers active.
#[derive(Debug)]
pub struct ToggleController {
    state: Mutex<ControllerState>,
    wake: Condvar,
}

impl ToggleController {
    pub fn new(settings: &Settings) -> Self {
        let channel = |id: ChannelId| ChannelState {
            active: false,
            interval: settings.interval(id),
            target: settings.target(id),
            status: ChannelStatus::Idle,
        };

        Self {
            state: Mutex::new(ControllerState {
                channels: [
                    channel(ChannelId::Clicker1),
                    channel(ChannelId::Clicker2),
                    channel(ChannelId::KeyPresser),
                ],
                shutdown: false,
            }),
            wake: Condvar::new(),
        }
    }

    // A panic while holding the lock cannot leave the plain flags half-written.
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn activate(state: &mut ControllerState, id: ChannelId) {
        if let Some(rival) = id.rival() {
            state.channel_mut(rival).active = false;
        }
        state.channel_mut(id).active = true;
    }

    /// Flips `id` and returns its new state. Starting a mouse clicker stops
    /// the other one first.
    pub fn toggle(&self, id: ChannelId) -> bool {
        let mut state = self.lock();
        let now_active = !state.channel(id).active;

        if now_active {
            Self::activate(&mut state, id);
        } else {
            state.channel_mut(id).active = false;
        }
        drop(state);

        tracing::info!(
            "{} {}",
            id,
            if now_active { "started" } else { "stopped" }
        );
        self.wake.notify_all();
        now_active
    }

    /// Returns `false` if the channel was already active.
    pub fn start(&self, id: ChannelId) -> bool {
        let mut state = self.lock();
        if state.channel(id).active {
            return false;
        }
        Self::activate(&mut state, id);
        drop(state);

        self.wake.notify_all();
        true
    }

    /// Returns `false` if the channel was already inactive.
    pub fn stop(&self, id: ChannelId) -> bool {
        let mut state = self.lock();
        let was_active = std::mem::replace(&mut state.channel_mut(id).active, false);
        drop(state);

        if was_active {
            self.wake.notify_all();
        }
        was_active
    }

    /// Deactivates every channel. Returns how many were active.
    pub fn emergency_stop(&self) -> usize {
        let mut state = self.lock();
        let stopped = state
            .channels
            .iter_mut()
            .map(|ch| std::mem::replace(&mut ch.active, false))
            .filter(|&was_active| was_active)
            .count();
        drop(state);

        tracing::warn!("Emergency stop ({} channel(s) were active)", stopped);
        self.wake.notify_all();
        stopped
    }

    pub fn is_active(&self, id: ChannelId) -> bool {
        self.lock().channel(id).active
    }

    pub fn interval(&self, id: ChannelId) -> f64 {
        self.lock().channel(id).interval
    }

    /// Stores a clamped interval and returns the value actually stored.
    /// Takes effect on the channel's next cycle.
    pub fn set_interval(&self, id: ChannelId, seconds: f64) -> f64 {
        let mut state = self.lock();
        let channel = state.channel_mut(id);
        let validated = clamp_interval(seconds, channel.interval);
        channel.interval = validated;
        validated
    }

    pub fn target(&self, id: ChannelId) -> ChannelTarget {
        self.lock().channel(id).target
    }

    /// Panics if the target kind does not match the channel kind.
    pub fn set_target(&self, id: ChannelId, target: ChannelTarget) {
        let matches_kind = matches!(
            (id.kind(), target),
            (ChannelKind::MouseClick, ChannelTarget::Mouse(_))
                | (ChannelKind::KeyPress, ChannelTarget::Key(_))
        );
        assert!(matches_kind, "{} cannot act on {}", id, target);

        self.lock().channel_mut(id).target = target;
    }

    pub fn status(&self, id: ChannelId) -> ChannelStatus {
        self.lock().channel(id).status.clone()
    }

    pub fn set_status(&self, id: ChannelId, status: ChannelStatus) {
        self.lock().channel_mut(id).status = status;
    }

    /// Stops `id` and records why.
    pub fn fail(&self, id: ChannelId, reason: String) {
        let mut state = self.lock();
        let channel = state.channel_mut(id);
        channel.active = false;
        channel.status = ChannelStatus::Error(reason);
    }

    pub fn snapshot(&self) -> Vec<ChannelSnapshot> {
        let state = self.lock();
        ChannelId::all()
            .iter()
            .map(|&id| {
                let ch = state.channel(id);
                ChannelSnapshot {
                    id,
                    active: ch.active,
                    interval: ch.interval,
                    target: ch.target,
                    status: ch.status.clone(),
                }
            })
            .collect()
    }

    /// Interval and target for the next action, or `None` once the channel
    /// is inactive.
    pub fn next_cycle(&self, id: ChannelId) -> Option<(Duration, ChannelTarget)> {
        let state = self.lock();
        let ch = state.channel(id);
        if !ch.active || state.shutdown {
            return None;
        }
        Some((Duration::from_secs_f64(ch.interval), ch.target))
    }

    /// Blocks until `id` is active, the controller shuts down, or `timeout`
    /// passes. Returns whether the channel is active.
    pub fn wait_for_active(&self, id: ChannelId, timeout: Duration) -> bool {
        let guard = self.lock();
        if guard.channel(id).active {
            return !guard.shutdown;
        }

        let (guard, _) = self
            .wake
            .wait_timeout_while(guard, timeout, |s| !s.channel(id).active && !s.shutdown)
            .unwrap_or_else(PoisonError::into_inner);

        guard.channel(id).active && !guard.shutdown
    }

    /// Stops every channel and releases all waiting workers for good.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.shutdown = true;
        for ch in state.channels.iter_mut() {
            ch.active = false;
        }
        drop(state);

        self.wake.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KeyCode, MouseButton};
    use std::sync::Arc;
    use std::thread;

    fn controller() -> ToggleController {
        ToggleController::new(&Settings::default())
    }

    fn active_set(c: &ToggleController) -> Vec<ChannelId> {
        c.snapshot()
            .into_iter()
            .filter(|s| s.active)
            .map(|s| s.id)
            .collect()
    }

    #[test]
    fn starts_idle_with_settings_values() {
        let c = controller();
        assert!(active_set(&c).is_empty());
        assert_eq!(c.interval(ChannelId::Clicker2), 0.5);
        assert_eq!(
            c.target(ChannelId::KeyPresser),
            ChannelTarget::Key(KeyCode::Space)
        );
        assert_eq!(c.status(ChannelId::Clicker1), ChannelStatus::Idle);
    }

    #[test]
    fn toggle_flips_state() {
        let c = controller();
        assert!(c.toggle(ChannelId::Clicker1));
        assert!(c.is_active(ChannelId::Clicker1));
        assert!(!c.toggle(ChannelId::Clicker1));
        assert!(!c.is_active(ChannelId::Clicker1));
    }

    #[test]
    fn starting_one_clicker_stops_the_other() {
        let c = controller();
        c.toggle(ChannelId::Clicker2);
        assert_eq!(active_set(&c), vec![ChannelId::Clicker2]);

        c.toggle(ChannelId::Clicker1);
        assert_eq!(active_set(&c), vec![ChannelId::Clicker1]);

        c.start(ChannelId::Clicker2);
        assert_eq!(active_set(&c), vec![ChannelId::Clicker2]);
    }

    #[test]
    fn key_presser_is_independent() {
        let c = controller();
        c.toggle(ChannelId::Clicker1);
        c.toggle(ChannelId::KeyPresser);
        assert_eq!(
            active_set(&c),
            vec![ChannelId::Clicker1, ChannelId::KeyPresser]
        );

        c.toggle(ChannelId::KeyPresser);
        assert_eq!(active_set(&c), vec![ChannelId::Clicker1]);
    }

    #[test]
    fn emergency_stop_from_every_combination() {
        let combos: [&[ChannelId]; 6] = [
            &[],
            &[ChannelId::Clicker1],
            &[ChannelId::Clicker2],
            &[ChannelId::KeyPresser],
            &[ChannelId::Clicker1, ChannelId::KeyPresser],
            &[ChannelId::Clicker2, ChannelId::KeyPresser],
        ];

        for combo in combos {
            let c = controller();
            for &id in combo {
                c.start(id);
            }
            assert_eq!(c.emergency_stop(), combo.len());
            assert!(active_set(&c).is_empty());
            assert_eq!(c.emergency_stop(), 0);
        }
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let c = controller();
        assert!(c.start(ChannelId::KeyPresser));
        assert!(!c.start(ChannelId::KeyPresser));
        assert!(c.stop(ChannelId::KeyPresser));
        assert!(!c.stop(ChannelId::KeyPresser));
    }

    #[test]
    fn set_interval_clamps() {
        let c = controller();
        assert_eq!(c.set_interval(ChannelId::Clicker1, 0.25), 0.25);
        assert_eq!(c.set_interval(ChannelId::Clicker1, 0.0001), 0.01);
        assert_eq!(c.set_interval(ChannelId::Clicker1, 500.0), 60.0);
        assert_eq!(c.set_interval(ChannelId::Clicker1, f64::NAN), 60.0);
    }

    #[test]
    fn next_cycle_reflects_latest_interval() {
        let c = controller();
        assert_eq!(c.next_cycle(ChannelId::Clicker1), None);

        c.start(ChannelId::Clicker1);
        c.set_interval(ChannelId::Clicker1, 0.2);
        assert_eq!(
            c.next_cycle(ChannelId::Clicker1),
            Some((
                Duration::from_millis(200),
                ChannelTarget::Mouse(MouseButton::Left)
            ))
        );
    }

    #[test]
    fn fail_records_error_and_stops() {
        let c = controller();
        c.start(ChannelId::KeyPresser);
        c.fail(ChannelId::KeyPresser, "device gone".to_string());
        assert!(!c.is_active(ChannelId::KeyPresser));
        assert!(c.status(ChannelId::KeyPresser).is_error());
    }

    #[test]
    #[should_panic]
    fn mismatched_target_is_a_programming_error() {
        controller().set_target(ChannelId::Clicker1, ChannelTarget::Key(KeyCode::Space));
    }

    #[test]
    fn wait_for_active_wakes_on_start() {
        let c = Arc::new(controller());
        let waiter = Arc::clone(&c);
        let handle = thread::spawn(move || {
            waiter.wait_for_active(ChannelId::Clicker2, Duration::from_secs(5))
        });

        thread::sleep(Duration::from_millis(20));
        c.start(ChannelId::Clicker2);
        assert!(handle.join().unwrap());
    }

    #[test]
    fn wait_for_active_times_out() {
        let c = controller();
        assert!(!c.wait_for_active(ChannelId::Clicker1, Duration::from_millis(10)));
    }

    #[test]
    fn shutdown_releases_waiters() {
        let c = Arc::new(controller());
        let waiter = Arc::clone(&c);
        let handle = thread::spawn(move || {
            waiter.wait_for_active(ChannelId::KeyPresser, Duration::from_secs(5))
        });

        thread::sleep(Duration::from_millis(20));
        c.shutdown();
        assert!(!handle.join().unwrap());
        assert!(c.is_shutdown());
        assert_eq!(c.next_cycle(ChannelId::KeyPresser), None);
    }

    #[test]
    fn concurrent_toggles_never_show_both_clickers() {
        let c = Arc::new(controller());
        let mut handles = Vec::new();

        for id in [ChannelId::Clicker1, ChannelId::Clicker2] {
            let c = Arc::clone(&c);
            handles.push(thread::spawn(move || {
                for _ in 0..500 {
                    c.toggle(id);
                }
            }));
        }

        let observer = {
            let c = Arc::clone(&c);
            thread::spawn(move || {
                for _ in 0..2000 {
                    let snap = c.snapshot();
                    assert!(!(snap[0].active && snap[1].active));
                }
            })
        };

        for h in handles {
            h.join().unwrap();
        }
        observer.join().unwrap();
    }
}
