use crate::core::{CaptureTarget, ChannelId, ChannelStatus, KeyCode};
use std::sync::mpsc::{self, Receiver, Sender};

/// Work handed from background threads to the control panel thread.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    StatusChanged {
        channel: ChannelId,
        status: ChannelStatus,
    },
    Toggled {
        channel: ChannelId,
        active: bool,
    },
    EmergencyStopped,
    Captured {
        target: CaptureTarget,
        key: KeyCode,
    },
    CaptureCancelled,
    Notice(String),
    BackendFailure(String),
}

#[derive(Debug, Clone)]
pub struct UiSender {
    tx: Sender<UiEvent>,
}

impl UiSender {
    /// Events posted after the panel is gone are dropped.
    pub fn post(&self, event: UiEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::trace!("UI closed, dropping {:?}", e.0);
        }
    }
}

#[derive(Debug)]
pub struct UiReceiver {
    rx: Receiver<UiEvent>,
}

impl UiReceiver {
    /// Everything queued so far, in posting order. Never blocks.
    pub fn drain(&self) -> Vec<UiEvent> {
        self.rx.try_iter().collect()
    }
}

pub fn ui_queue() -> (UiSender, UiReceiver) {
    let (tx, rx) = mpsc::channel();
    (UiSender { tx }, UiReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn preserves_order_across_threads() {
        let (tx, rx) = ui_queue();
        let worker = {
            let tx = tx.clone();
            thread::spawn(move || {
                tx.post(UiEvent::Notice("first".into()));
                tx.post(UiEvent::EmergencyStopped);
            })
        };
        worker.join().unwrap();

        assert_eq!(
            rx.drain(),
            vec![UiEvent::Notice("first".into()), UiEvent::EmergencyStopped]
        );
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn post_after_close_is_ignored() {
        let (tx, rx) = ui_queue();
        drop(rx);
        tx.post(UiEvent::CaptureCancelled);
    }
}
