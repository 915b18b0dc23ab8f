use crate::core::{BackendKind, DacError, DacResult, KeyCode, MouseButton};
use crate::input::{InputBackend, KeyEventSink};
use rdev::{Button, Event, EventType, Key, listen, simulate};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Gap between the down and up halves of a synthetic event.
const PRESS_HOLD: Duration = Duration::from_millis(5);

/// A held key with no event for this long is treated as released. Covers
/// releases the hook never saw (focus or grab changes).
const STALE_HOLD: Duration = Duration::from_secs(1);

const KEY_TABLE: &[(Key, KeyCode)] = &[
    (Key::KeyA, KeyCode::Char('a')),
    (Key::KeyB, KeyCode::Char('b')),
    (Key::KeyC, KeyCode::Char('c')),
    (Key::KeyD, KeyCode::Char('d')),
    (Key::KeyE, KeyCode::Char('e')),
    (Key::KeyF, KeyCode::Char('f')),
    (Key::KeyG, KeyCode::Char('g')),
    (Key::KeyH, KeyCode::Char('h')),
    (Key::KeyI, KeyCode::Char('i')),
    (Key::KeyJ, KeyCode::Char('j')),
    (Key::KeyK, KeyCode::Char('k')),
    (Key::KeyL, KeyCode::Char('l')),
    (Key::KeyM, KeyCode::Char('m')),
    (Key::KeyN, KeyCode::Char('n')),
    (Key::KeyO, KeyCode::Char('o')),
    (Key::KeyP, KeyCode::Char('p')),
    (Key::KeyQ, KeyCode::Char('q')),
    (Key::KeyR, KeyCode::Char('r')),
    (Key::KeyS, KeyCode::Char('s')),
    (Key::KeyT, KeyCode::Char('t')),
    (Key::KeyU, KeyCode::Char('u')),
    (Key::KeyV, KeyCode::Char('v')),
    (Key::KeyW, KeyCode::Char('w')),
    (Key::KeyX, KeyCode::Char('x')),
    (Key::KeyY, KeyCode::Char('y')),
    (Key::KeyZ, KeyCode::Char('z')),
    (Key::Num0, KeyCode::Char('0')),
    (Key::Num1, KeyCode::Char('1')),
    (Key::Num2, KeyCode::Char('2')),
    (Key::Num3, KeyCode::Char('3')),
    (Key::Num4, KeyCode::Char('4')),
    (Key::Num5, KeyCode::Char('5')),
    (Key::Num6, KeyCode::Char('6')),
    (Key::Num7, KeyCode::Char('7')),
    (Key::Num8, KeyCode::Char('8')),
    (Key::Num9, KeyCode::Char('9')),
    (Key::F1, KeyCode::Function(1)),
    (Key::F2, KeyCode::Function(2)),
    (Key::F3, KeyCode::Function(3)),
    (Key::F4, KeyCode::Function(4)),
    (Key::F5, KeyCode::Function(5)),
    (Key::F6, KeyCode::Function(6)),
    (Key::F7, KeyCode::Function(7)),
    (Key::F8, KeyCode::Function(8)),
    (Key::F9, KeyCode::Function(9)),
    (Key::F10, KeyCode::Function(10)),
    (Key::F11, KeyCode::Function(11)),
    (Key::F12, KeyCode::Function(12)),
    (Key::Space, KeyCode::Space),
    (Key::Return, KeyCode::Enter),
    (Key::Tab, KeyCode::Tab),
    (Key::Escape, KeyCode::Escape),
    (Key::Backspace, KeyCode::Backspace),
    (Key::Delete, KeyCode::Delete),
    (Key::Insert, KeyCode::Insert),
    (Key::Home, KeyCode::Home),
    (Key::End, KeyCode::End),
    (Key::PageUp, KeyCode::PageUp),
    (Key::PageDown, KeyCode::PageDown),
    (Key::UpArrow, KeyCode::Up),
    (Key::DownArrow, KeyCode::Down),
    (Key::LeftArrow, KeyCode::Left),
    (Key::RightArrow, KeyCode::Right),
    (Key::ShiftLeft, KeyCode::LeftShift),
    (Key::ShiftRight, KeyCode::RightShift),
    (Key::ControlLeft, KeyCode::LeftCtrl),
    (Key::ControlRight, KeyCode::RightCtrl),
    (Key::Alt, KeyCode::LeftAlt),
    (Key::AltGr, KeyCode::RightAlt),
    (Key::CapsLock, KeyCode::CapsLock),
];

fn from_rdev(key: Key) -> Option<KeyCode> {
    KEY_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, code)| *code)
}

fn to_rdev(code: KeyCode) -> Option<Key> {
    KEY_TABLE
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(key, _)| *key)
}

fn to_rdev_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

/// Drops OS auto-repeat presses. rdev reports every repeat as a `KeyPress`.
#[derive(Debug, Default)]
struct RepeatFilter {
    held: HashMap<KeyCode, Instant>,
}

impl RepeatFilter {
    /// Returns true for a fresh press.
    fn press(&mut self, code: KeyCode, now: Instant) -> bool {
        match self.held.insert(code, now) {
            Some(last) => now.saturating_duration_since(last) >= STALE_HOLD,
            None => true,
        }
    }

    fn release(&mut self, code: KeyCode) {
        self.held.remove(&code);
    }
}

/// Cross-platform backend built on rdev's global hook and event simulation.
pub struct RdevBackend {
    running: Arc<AtomicBool>,
}

impl Default for RdevBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RdevBackend {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    fn send_pair(&self, down: EventType, up: EventType) -> DacResult<()> {
        simulate(&down)
            .map_err(|_| DacError::Device(format!("Failed to simulate {:?}", down)))?;
        thread::sleep(PRESS_HOLD);
        simulate(&up).map_err(|_| DacError::Device(format!("Failed to simulate {:?}", up)))
    }
}

impl InputBackend for RdevBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Rdev
    }

    fn listen(&self, sink: Arc<dyn KeyEventSink>) -> DacResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(DacError::Backend("rdev listener already running".to_string()));
        }

        let running = Arc::clone(&self.running);
        thread::Builder::new()
            .name("DacRdevListener".to_string())
            .spawn(move || {
                let callback_running = Arc::clone(&running);
                let callback_sink = Arc::clone(&sink);
                let mut repeats = RepeatFilter::default();

                let callback = move |event: Event| {
                    if !callback_running.load(Ordering::SeqCst) {
                        return;
                    }

                    match event.event_type {
                        EventType::KeyPress(key) => {
                            if let Some(code) = from_rdev(key)
                                && repeats.press(code, Instant::now())
                            {
                                callback_sink.key_down(code);
                            }
                        }
                        EventType::KeyRelease(key) => {
                            if let Some(code) = from_rdev(key) {
                                repeats.release(code);
                            }
                        }
                        _ => {}
                    }
                };

                // Blocks for the life of the process unless the hook fails.
                if let Err(e) = listen(callback) {
                    tracing::error!("rdev listen error: {:?}", e);
                    if running.load(Ordering::SeqCst) {
                        sink.listener_failed(format!(
                            "Global hotkey capture failed ({:?}); check input permissions",
                            e
                        ));
                    }
                }
            })
            .map_err(|e| DacError::Thread(format!("Failed to spawn rdev listener: {}", e)))?;

        tracing::info!("rdev listener started");
        Ok(())
    }

    fn click(&self, button: MouseButton) -> DacResult<()> {
        let button = to_rdev_button(button);
        self.send_pair(EventType::ButtonPress(button), EventType::ButtonRelease(button))
    }

    fn press_key(&self, key: KeyCode) -> DacResult<()> {
        let key = to_rdev(key)
            .ok_or_else(|| DacError::InvalidInput(format!("{} has no rdev key", key)))?;
        self.send_pair(EventType::KeyPress(key), EventType::KeyRelease(key))
    }

    // rdev's listen() cannot be interrupted; the hook just goes quiet.
    fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_code_has_an_rdev_key() {
        let mut codes: Vec<KeyCode> = ('a'..='z')
            .chain('0'..='9')
            .filter_map(KeyCode::char)
            .collect();
        codes.extend((1..=12).filter_map(KeyCode::function));
        codes.extend([KeyCode::Space, KeyCode::Enter, KeyCode::PageDown, KeyCode::RightAlt]);

        for code in codes {
            let key = to_rdev(code).unwrap();
            assert_eq!(from_rdev(key), Some(code));
        }
    }

    #[test]
    fn unmapped_rdev_keys_are_ignored() {
        assert_eq!(from_rdev(Key::PrintScreen), None);
        assert_eq!(from_rdev(Key::F6), Some(KeyCode::Function(6)));
    }

    #[test]
    fn table_has_no_duplicates() {
        for (i, (key, code)) in KEY_TABLE.iter().enumerate() {
            for (other_key, other_code) in &KEY_TABLE[i + 1..] {
                assert_ne!(key, other_key);
                assert_ne!(code, other_code);
            }
        }
    }

    #[test]
    fn repeats_are_dropped_until_release() {
        let mut filter = RepeatFilter::default();
        let t0 = Instant::now();
        let f6 = KeyCode::Function(6);

        assert!(filter.press(f6, t0));
        assert!(!filter.press(f6, t0 + Duration::from_millis(500)));
        assert!(!filter.press(f6, t0 + Duration::from_millis(530)));

        filter.release(f6);
        assert!(filter.press(f6, t0 + Duration::from_millis(600)));
    }

    #[test]
    fn lost_release_does_not_kill_the_key() {
        let mut filter = RepeatFilter::default();
        let t0 = Instant::now();
        let f7 = KeyCode::Function(7);

        assert!(filter.press(f7, t0));
        // release never arrives
        assert!(filter.press(f7, t0 + STALE_HOLD + Duration::from_millis(1)));
        assert!(!filter.press(f7, t0 + STALE_HOLD + Duration::from_millis(40)));
    }
}
