use crate::core::{BackendKind, ChannelTarget, DacError, DacResult, KeyCode, MouseButton};
use std::sync::Arc;

/// Receives global keyboard input from a backend's listener thread.
pub trait KeyEventSink: Send + Sync {
    /// A key went down. Auto-repeat is filtered out before this call.
    fn key_down(&self, key: KeyCode);

    /// The listener died and no further keys will arrive.
    fn listener_failed(&self, reason: String);
}

/// Platform input: global key listening plus synthetic clicks and presses.
pub trait InputBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Opens output devices up front so permission problems surface early.
    fn prepare(&self) -> DacResult<()> {
        Ok(())
    }

    /// Starts a background listener. Returns once it is running.
    fn listen(&self, sink: Arc<dyn KeyEventSink>) -> DacResult<()>;

    /// Press and release `button` at the current pointer position.
    fn click(&self, button: MouseButton) -> DacResult<()>;

    /// Press and release `key`.
    fn press_key(&self, key: KeyCode) -> DacResult<()>;

    fn shutdown(&self) {}

    fn perform(&self, target: ChannelTarget) -> DacResult<()> {
        match target {
            ChannelTarget::Mouse(button) => self.click(button),
            ChannelTarget::Key(key) => self.press_key(key),
        }
    }
}

pub fn create_backend(kind: BackendKind) -> DacResult<Arc<dyn InputBackend>> {
    match kind {
        BackendKind::Rdev => Ok(Arc::new(super::RdevBackend::new())),
        #[cfg(target_os = "linux")]
        BackendKind::Evdev => Ok(Arc::new(super::EvdevBackend::new())),
        #[cfg(not(target_os = "linux"))]
        BackendKind::Evdev => Err(DacError::Backend(
            "The evdev backend is only available on Linux".to_string(),
        )),
    }
}

/// Backend for the configured kind, falling back to rdev when it is
/// unavailable. The second value explains a fallback.
pub fn select_backend(kind: BackendKind) -> (Arc<dyn InputBackend>, Option<DacError>) {
    match create_backend(kind) {
        Ok(backend) => (backend, None),
        Err(e) => {
            tracing::warn!("{} backend unavailable ({}), using rdev", kind, e);
            (Arc::new(super::RdevBackend::new()), Some(e))
        }
    }
}

#[cfg(test)]
pub use mock::MockBackend;

#[cfg(test)]
mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Records every action instead of touching the OS.
    pub struct MockBackend {
        actions: Mutex<Vec<ChannelTarget>>,
        fail_after: Option<usize>,
        sink: Mutex<Option<Arc<dyn KeyEventSink>>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self {
                actions: Mutex::new(Vec::new()),
                fail_after: None,
                sink: Mutex::new(None),
            }
        }

        pub fn failing_after(successes: usize) -> Self {
            Self {
                fail_after: Some(successes),
                ..Self::new()
            }
        }

        pub fn actions(&self) -> Vec<ChannelTarget> {
            self.actions.lock().unwrap().clone()
        }

        /// Feeds a key to the listening sink, as the OS hook would.
        pub fn emit(&self, key: KeyCode) {
            if let Some(sink) = self.sink.lock().unwrap().as_ref() {
                sink.key_down(key);
            }
        }

        fn record(&self, target: ChannelTarget) -> DacResult<()> {
            let mut actions = self.actions.lock().unwrap();
            if self.fail_after.is_some_and(|n| actions.len() >= n) {
                return Err(DacError::Device("mock device unplugged".to_string()));
            }
            actions.push(target);
            Ok(())
        }
    }

    impl InputBackend for MockBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Rdev
        }

        fn listen(&self, sink: Arc<dyn KeyEventSink>) -> DacResult<()> {
            *self.sink.lock().unwrap() = Some(sink);
            Ok(())
        }

        fn click(&self, button: MouseButton) -> DacResult<()> {
            self.record(ChannelTarget::Mouse(button))
        }

        fn press_key(&self, key: KeyCode) -> DacResult<()> {
            self.record(ChannelTarget::Key(key))
        }
    }
}
