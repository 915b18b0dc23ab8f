use crate::core::keys::SCANCODES;
use crate::core::{BackendKind, DacError, DacResult, KeyCode, MouseButton};
use crate::input::{InputBackend, KeyEventSink};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, Device, EventType, InputEvent, InputEventKind, Key, RelativeAxisType};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const VIRTUAL_MOUSE_NAME: &str = "DAC-Virtual-Mouse";
const VIRTUAL_KEYBOARD_NAME: &str = "DAC-Virtual-Keyboard";

const POLL_INTERVAL: Duration = Duration::from_millis(5);

fn from_evdev(key: Key) -> Option<KeyCode> {
    KeyCode::from_scancode(key.code())
}

fn to_evdev(code: KeyCode) -> Option<Key> {
    code.scancode().map(Key::new)
}

fn to_evdev_button(button: MouseButton) -> Key {
    match button {
        MouseButton::Left => Key::BTN_LEFT,
        MouseButton::Right => Key::BTN_RIGHT,
        MouseButton::Middle => Key::BTN_MIDDLE,
    }
}

fn build_mouse() -> std::io::Result<VirtualDevice> {
    let mut buttons = AttributeSet::<Key>::new();
    buttons.insert(Key::BTN_LEFT);
    buttons.insert(Key::BTN_RIGHT);
    buttons.insert(Key::BTN_MIDDLE);

    let mut axes = AttributeSet::<RelativeAxisType>::new();
    axes.insert(RelativeAxisType::REL_X);
    axes.insert(RelativeAxisType::REL_Y);

    VirtualDeviceBuilder::new()?
        .name(VIRTUAL_MOUSE_NAME)
        .with_keys(&buttons)?
        .with_relative_axes(&axes)?
        .build()
}

fn build_keyboard() -> std::io::Result<VirtualDevice> {
    let mut keys = AttributeSet::<Key>::new();
    for (code, _) in SCANCODES {
        keys.insert(Key::new(*code));
    }

    VirtualDeviceBuilder::new()?
        .name(VIRTUAL_KEYBOARD_NAME)
        .with_keys(&keys)?
        .build()
}

fn tap(device: &mut VirtualDevice, key: Key) -> std::io::Result<()> {
    device.emit(&[InputEvent::new(EventType::KEY, key.code(), 1)])?;
    device.emit(&[InputEvent::new(EventType::KEY, key.code(), 0)])
}

/// Linux kernel-level backend: reads /dev/input keyboards and injects
/// through uinput. Needs membership in the `input` group.
pub struct EvdevBackend {
    mouse: Mutex<Option<VirtualDevice>>,
    keyboard: Mutex<Option<VirtualDevice>>,
    stop: Arc<AtomicBool>,
}

impl Default for EvdevBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EvdevBackend {
    /// Devices are created lazily, on `prepare` or the first action.
    pub fn new() -> Self {
        Self {
            mouse: Mutex::new(None),
            keyboard: Mutex::new(None),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    fn with_device(
        slot: &Mutex<Option<VirtualDevice>>,
        name: &str,
        build: fn() -> std::io::Result<VirtualDevice>,
        action: impl FnOnce(&mut VirtualDevice) -> std::io::Result<()>,
    ) -> DacResult<()> {
        let mut guard = slot.lock()?;
        if guard.is_none() {
            let device = build().map_err(|e| {
                DacError::Device(format!("Cannot create {} via /dev/uinput: {}", name, e))
            })?;
            tracing::info!("Created {}", name);
            *guard = Some(device);
        }

        let Some(device) = guard.as_mut() else {
            return Err(DacError::Device(format!("{} unavailable", name)));
        };

        if let Err(e) = action(device) {
            // Rebuild on next use.
            *guard = None;
            return Err(DacError::Device(format!("{} write failed: {}", name, e)));
        }
        Ok(())
    }
}

impl InputBackend for EvdevBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Evdev
    }

    fn prepare(&self) -> DacResult<()> {
        Self::with_device(&self.mouse, VIRTUAL_MOUSE_NAME, build_mouse, |_| Ok(()))?;
        Self::with_device(&self.keyboard, VIRTUAL_KEYBOARD_NAME, build_keyboard, |_| Ok(()))
    }

    fn listen(&self, sink: Arc<dyn KeyEventSink>) -> DacResult<()> {
        let paths = find_keyboard_devices()?;
        if paths.is_empty() {
            return Err(DacError::Device(
                "No keyboard devices found in /dev/input".to_string(),
            ));
        }

        let devices = open_non_blocking(&paths);
        if devices.is_empty() {
            return Err(DacError::Device(
                "No keyboard devices could be opened".to_string(),
            ));
        }

        let stop = Arc::clone(&self.stop);
        thread::Builder::new()
            .name("DacEvdevListener".to_string())
            .spawn(move || listener_loop(devices, sink, stop))
            .map_err(|e| DacError::Thread(format!("Failed to spawn evdev listener: {}", e)))?;

        tracing::info!("evdev listener started on {} device(s)", paths.len());
        Ok(())
    }

    fn click(&self, button: MouseButton) -> DacResult<()> {
        let key = to_evdev_button(button);
        Self::with_device(&self.mouse, VIRTUAL_MOUSE_NAME, build_mouse, |dev| {
            tap(dev, key)
        })
    }

    fn press_key(&self, key: KeyCode) -> DacResult<()> {
        let key = to_evdev(key)
            .ok_or_else(|| DacError::InvalidInput(format!("{} has no evdev key", key)))?;
        Self::with_device(&self.keyboard, VIRTUAL_KEYBOARD_NAME, build_keyboard, |dev| {
            tap(dev, key)
        })
    }

    fn shutdown(&self) {
        self.stop.store(true, Ordering::Release);
        for slot in [&self.mouse, &self.keyboard] {
            if let Ok(mut guard) = slot.lock() {
                guard.take();
            }
        }
    }
}

fn is_own_device(name: Option<&str>) -> bool {
    matches!(name, Some(VIRTUAL_MOUSE_NAME | VIRTUAL_KEYBOARD_NAME))
}

/// A denied node only matters when nothing else was readable.
fn scan_outcome(keyboards: Vec<PathBuf>, denied: Vec<PathBuf>) -> DacResult<Vec<PathBuf>> {
    match denied.first() {
        Some(path) if keyboards.is_empty() => Err(DacError::Device(format!(
            "Permission denied on {}; add your user to the 'input' group",
            path.display()
        ))),
        _ => {
            if !denied.is_empty() {
                tracing::warn!(
                    "Skipped {} unreadable input device(s): {:?}",
                    denied.len(),
                    denied
                );
            }
            Ok(keyboards)
        }
    }
}

fn find_keyboard_devices() -> DacResult<Vec<PathBuf>> {
    let mut keyboards = Vec::new();
    let mut denied = Vec::new();

    let input_dir = std::fs::read_dir("/dev/input")
        .map_err(|e| DacError::Device(format!("/dev/input: {}", e)))?;

    for entry in input_dir {
        let path = entry?.path();

        let is_event_device = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("event"));
        if !is_event_device {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                if is_own_device(device.name()) {
                    continue;
                }

                let is_keyboard = device.supported_keys().is_some_and(|keys| {
                    keys.contains(Key::KEY_A)
                        && keys.contains(Key::KEY_Z)
                        && keys.contains(Key::KEY_ENTER)
                });

                if is_keyboard {
                    tracing::debug!(
                        "Found keyboard: {:?} ({})",
                        path,
                        device.name().unwrap_or("unknown")
                    );
                    keyboards.push(path);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => denied.push(path),
            Err(e) => tracing::trace!("Skipping {:?}: {}", path, e),
        }
    }

    scan_outcome(keyboards, denied)
}

fn open_non_blocking(paths: &[PathBuf]) -> Vec<Device> {
    paths
        .iter()
        .filter_map(|path| match Device::open(path) {
            Ok(device) => {
                let fd = device.as_raw_fd();
                // SAFETY: fd is owned by `device` and stays open for its lifetime.
                unsafe {
                    let flags = libc::fcntl(fd, libc::F_GETFL);
                    if flags != -1 {
                        libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                    }
                }
                Some(device)
            }
            Err(e) => {
                tracing::warn!("Failed to open {:?}: {}", path, e);
                None
            }
        })
        .collect()
}

fn listener_loop(mut devices: Vec<Device>, sink: Arc<dyn KeyEventSink>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Acquire) {
        let mut lost = Vec::new();

        for (index, device) in devices.iter_mut().enumerate() {
            match device.fetch_events() {
                Ok(events) => {
                    for event in events {
                        // 1 = press, 0 = release, 2 = auto-repeat
                        if let InputEventKind::Key(key) = event.kind()
                            && event.value() == 1
                            && let Some(code) = from_evdev(key)
                        {
                            sink.key_down(code);
                        }
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    tracing::warn!("Keyboard device lost: {}", e);
                    lost.push(index);
                }
            }
        }

        for index in lost.into_iter().rev() {
            devices.remove(index);
        }
        if devices.is_empty() {
            sink.listener_failed("All keyboard devices disconnected".to_string());
            return;
        }

        thread::sleep(POLL_INTERVAL);
    }

    tracing::debug!("evdev listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scancodes_match_evdev_constants() {
        assert_eq!(to_evdev(KeyCode::Char('a')), Some(Key::KEY_A));
        assert_eq!(to_evdev(KeyCode::Space), Some(Key::KEY_SPACE));
        assert_eq!(to_evdev(KeyCode::Function(11)), Some(Key::KEY_F11));
        assert_eq!(to_evdev(KeyCode::RightAlt), Some(Key::KEY_RIGHTALT));
        assert_eq!(to_evdev(KeyCode::Delete), Some(Key::KEY_DELETE));
        assert_eq!(from_evdev(Key::KEY_F9), Some(KeyCode::Function(9)));
        assert_eq!(from_evdev(Key::KEY_PAGEDOWN), Some(KeyCode::PageDown));
        assert_eq!(from_evdev(Key::BTN_LEFT), None);
    }

    #[test]
    fn buttons_map_to_btn_codes() {
        assert_eq!(to_evdev_button(MouseButton::Left), Key::BTN_LEFT);
        assert_eq!(to_evdev_button(MouseButton::Middle), Key::BTN_MIDDLE);
    }

    #[test]
    fn own_virtual_devices_are_skipped() {
        assert!(is_own_device(Some(VIRTUAL_KEYBOARD_NAME)));
        assert!(is_own_device(Some(VIRTUAL_MOUSE_NAME)));
        assert!(!is_own_device(Some("AT Translated Set 2 keyboard")));
        assert!(!is_own_device(None));
    }

    #[test]
    fn denied_node_is_skipped_when_a_keyboard_was_found() {
        let found = vec![PathBuf::from("/dev/input/event3")];
        let denied = vec![PathBuf::from("/dev/input/event7")];
        assert_eq!(scan_outcome(found.clone(), denied).unwrap(), found);
    }

    #[test]
    fn denied_without_keyboards_reports_permission() {
        let denied = vec![PathBuf::from("/dev/input/event0")];
        let err = scan_outcome(Vec::new(), denied).unwrap_err();
        assert!(err.to_string().contains("event0"));
        assert!(scan_outcome(Vec::new(), Vec::new()).unwrap().is_empty());
    }
}
