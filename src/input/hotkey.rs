use crate::app::{UiEvent, UiSender};
use crate::clicker::ToggleController;
use crate::config::Settings;
use crate::core::{BindingTarget, CaptureTarget, ChannelId, ChannelTarget, KeyCode};
use crate::input::KeyEventSink;
use crate::thread::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Minimum spacing between two accepted triggers of the same binding.
pub const HOTKEY_COOLDOWN: Duration = Duration::from_millis(200);

/// What a key-down turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Toggled { channel: ChannelId, active: bool },
    EmergencyStopped,
    /// Matched a binding still inside its cooldown.
    Suppressed(BindingTarget),
    Captured(CaptureTarget, KeyCode),
    CaptureCancelled,
    Unbound,
}

#[derive(Debug)]
struct DispatcherState {
    bindings: HashMap<BindingTarget, KeyCode>,
    last_trigger: HashMap<BindingTarget, Instant>,
    capture: Option<CaptureTarget>,
}

/// Maps global key-downs to controller actions.
pub struct HotkeyDispatcher {
    state: Mutex<DispatcherState>,
    controller: Arc<ToggleController>,
    clock: Arc<dyn Clock>,
    ui: UiSender,
}

impl HotkeyDispatcher {
    pub fn new(
        settings: &Settings,
        controller: Arc<ToggleController>,
        clock: Arc<dyn Clock>,
        ui: UiSender,
    ) -> Self {
        let bindings = BindingTarget::all()
            .iter()
            .map(|&target| (target, settings.hotkey(target).key))
            .collect();

        Self {
            state: Mutex::new(DispatcherState {
                bindings,
                last_trigger: HashMap::new(),
                capture: None,
            }),
            controller,
            clock,
            ui,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DispatcherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handles one key-down from the listener thread.
    pub fn handle_key(&self, key: KeyCode) -> Dispatch {
        let mut state = self.lock();

        if let Some(target) = state.capture.take() {
            drop(state);
            return self.finish_capture(target, key);
        }

        // Emergency stop first when one key is bound twice.
        let Some(target) = BindingTarget::all()
            .iter()
            .copied()
            .find(|t| state.bindings.get(t) == Some(&key))
        else {
            return Dispatch::Unbound;
        };

        let now = self.clock.now();
        if let Some(last) = state.last_trigger.get(&target)
            && now.duration_since(*last) < HOTKEY_COOLDOWN
        {
            tracing::debug!("{} suppressed by cooldown", target);
            return Dispatch::Suppressed(target);
        }
        state.last_trigger.insert(target, now);
        drop(state);

        match target {
            BindingTarget::EmergencyStop => {
                self.controller.emergency_stop();
                self.ui.post(UiEvent::EmergencyStopped);
                Dispatch::EmergencyStopped
            }
            BindingTarget::Channel(channel) => {
                let active = self.controller.toggle(channel);
                self.ui.post(UiEvent::Toggled { channel, active });
                Dispatch::Toggled { channel, active }
            }
        }
    }

    fn finish_capture(&self, target: CaptureTarget, key: KeyCode) -> Dispatch {
        if key == KeyCode::Escape {
            tracing::info!("Key capture for {} cancelled", target);
            self.ui.post(UiEvent::CaptureCancelled);
            return Dispatch::CaptureCancelled;
        }

        match target {
            CaptureTarget::Hotkey(binding) => self.set_binding(binding, key),
            CaptureTarget::PressTarget => self
                .controller
                .set_target(ChannelId::KeyPresser, ChannelTarget::Key(key)),
        }

        tracing::info!("{} set to {}", target, key.display_name());
        self.ui.post(UiEvent::Captured { target, key });
        Dispatch::Captured(target, key)
    }

    /// The next key-down, other than Escape, is assigned to `target`
    /// instead of being dispatched. Replaces any capture already pending.
    pub fn request_capture(&self, target: CaptureTarget) {
        self.lock().capture = Some(target);
    }

    /// Returns whether a capture was pending.
    pub fn cancel_capture(&self) -> bool {
        self.lock().capture.take().is_some()
    }

    pub fn pending_capture(&self) -> Option<CaptureTarget> {
        self.lock().capture
    }

    /// Current bindings in dispatch priority order.
    pub fn bindings(&self) -> Vec<(BindingTarget, KeyCode)> {
        let state = self.lock();
        BindingTarget::all()
            .iter()
            .filter_map(|t| state.bindings.get(t).map(|&key| (*t, key)))
            .collect()
    }

    pub fn binding(&self, target: BindingTarget) -> Option<KeyCode> {
        self.lock().bindings.get(&target).copied()
    }

    pub fn set_binding(&self, target: BindingTarget, key: KeyCode) {
        let mut state = self.lock();
        state.bindings.insert(target, key);
        state.last_trigger.remove(&target);
    }
}

impl KeyEventSink for HotkeyDispatcher {
    fn key_down(&self, key: KeyCode) {
        self.handle_key(key);
    }

    fn listener_failed(&self, reason: String) {
        tracing::error!("Hotkey listener failed: {}", reason);
        self.ui.post(UiEvent::BackendFailure(reason));
    }
}
