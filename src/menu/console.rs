use crate::app::{UiEvent, UiReceiver};
use crate::clicker::{ChannelSnapshot, ToggleController};
use crate::config::constants::defaults;
use crate::config::{KeyBinding, Settings, SettingsManager, parse_interval_input};
use crate::core::{
    BackendKind, BindingTarget, CaptureTarget, ChannelId, ChannelKind, ChannelStatus,
    ChannelTarget, DacError, DacResult,
};
use crate::input::HotkeyDispatcher;
use crate::menu::{
    Align, DoubleMenu, PanelCommand, SingleMenu, binding_from_key, channel_from_key, term_to_key,
};
use crossterm::event::{self, Event, KeyCode as TermKey, KeyEvent, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, execute, queue};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

/// How often the panel drains the UI queue and redraws.
pub const PANEL_TICK: Duration = Duration::from_millis(100);

const PANEL_WIDTH: usize = 60;
const MAX_NOTICES: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PanelMode {
    Normal,
    PickInterval,
    EditInterval { channel: ChannelId, buffer: String },
    PickHotkey,
    PickButton,
    Capturing(CaptureTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

fn format_seconds(seconds: f64) -> String {
    let text = format!("{:.3}", seconds);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    format!("{}s", trimmed)
}

fn state_label(snapshot: &ChannelSnapshot) -> &'static str {
    match (&snapshot.status, snapshot.active) {
        (_, true) => "RUNNING",
        (ChannelStatus::Error(_), false) => "ERROR",
        _ => "idle",
    }
}

/// Restores the terminal on every exit path.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> DacResult<Self> {
        terminal::enable_raw_mode()?;
        let guard = Self;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Terminal control panel. Runs on the main thread.
pub struct ControlPanel<'a> {
    settings: &'a mut Settings,
    manager: &'a SettingsManager,
    controller: Arc<ToggleController>,
    dispatcher: Arc<HotkeyDispatcher>,
    events: UiReceiver,
    backend: BackendKind,
    listener_ok: bool,
    mode: PanelMode,
    notices: VecDeque<String>,
}

impl<'a> ControlPanel<'a> {
    pub fn new(
        settings: &'a mut Settings,
        manager: &'a SettingsManager,
        controller: Arc<ToggleController>,
        dispatcher: Arc<HotkeyDispatcher>,
        events: UiReceiver,
        backend: BackendKind,
    ) -> Self {
        Self {
            settings,
            manager,
            controller,
            dispatcher,
            events,
            backend,
            listener_ok: true,
            mode: PanelMode::Normal,
            notices: VecDeque::new(),
        }
    }

    /// Runs until the user quits, which is reported as `DacError::UserExit`.
    pub fn run(&mut self) -> DacResult<()> {
        let _terminal = TerminalGuard::enter()?;
        let mut shown: Vec<String> = Vec::new();

        loop {
            self.drain_events();

            let screen = self.render();
            if screen != shown {
                Self::draw(&screen)?;
                shown = screen;
            }

            if !event::poll(PANEL_TICK)? {
                continue;
            }

            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
                && self.handle_key(&key) == Flow::Quit
            {
                tracing::info!("Quit requested from control panel");
                return Err(DacError::UserExit);
            }
        }
    }

    fn draw(lines: &[String]) -> DacResult<()> {
        let mut out = io::stdout();
        queue!(out, cursor::MoveTo(0, 0), terminal::Clear(ClearType::All))?;
        for line in lines {
            queue!(out, Print(line), cursor::MoveToNextLine(1))?;
        }
        out.flush()?;
        Ok(())
    }

    fn notice(&mut self, message: impl Into<String>) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(message.into());
    }

    fn persist(&mut self) {
        if let Err(e) = self.manager.save(&*self.settings) {
            tracing::error!("Failed to save config: {}", e);
            self.notice(format!("Could not save config: {}", e));
        }
    }

    pub fn drain_events(&mut self) {
        for event in self.events.drain() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::StatusChanged {
                channel,
                status: ChannelStatus::Error(reason),
            } => self.notice(format!("{} stopped: {}", channel, reason)),
            UiEvent::StatusChanged { .. } => {}
            UiEvent::Toggled { channel, active } => self.notice(format!(
                "{} {} by hotkey",
                channel,
                if active { "started" } else { "stopped" }
            )),
            UiEvent::EmergencyStopped => self.notice("Emergency stop: all channels stopped"),
            UiEvent::Captured { target, key } => {
                let binding = KeyBinding::new(key);
                match target {
                    CaptureTarget::Hotkey(t) => *self.settings.hotkey_mut(t) = binding,
                    CaptureTarget::PressTarget => self.settings.key_presser.target_key = binding,
                }
                self.persist();
                if matches!(self.mode, PanelMode::Capturing(_)) {
                    self.mode = PanelMode::Normal;
                }
                self.notice(format!("{} set to {}", target, key.display_name()));
            }
            UiEvent::CaptureCancelled => {
                if matches!(self.mode, PanelMode::Capturing(_)) {
                    self.mode = PanelMode::Normal;
                }
                self.notice("Key capture cancelled");
            }
            UiEvent::Notice(message) => self.notice(message),
            UiEvent::BackendFailure(reason) => {
                self.listener_ok = false;
                self.notice(format!("Input backend: {}", reason));
            }
        }
    }

    /// Applies one terminal key press.
    pub fn handle_key(&mut self, key: &KeyEvent) -> Flow {
        let cancelled = key.code == TermKey::Esc;

        match std::mem::replace(&mut self.mode, PanelMode::Normal) {
            PanelMode::Normal => return self.run_command(key),
            PanelMode::PickInterval => match channel_from_key(key) {
                Some(channel) => {
                    self.mode = PanelMode::EditInterval {
                        channel,
                        buffer: String::new(),
                    }
                }
                None if !cancelled => self.mode = PanelMode::PickInterval,
                None => {}
            },
            PanelMode::EditInterval {
                channel,
                mut buffer,
            } => match key.code {
                TermKey::Enter => self.apply_interval(channel, &buffer),
                TermKey::Esc => {}
                code => {
                    match code {
                        TermKey::Backspace => {
                            buffer.pop();
                        }
                        TermKey::Char(c) if c.is_ascii_digit() || c == '.' => buffer.push(c),
                        _ => {}
                    }
                    self.mode = PanelMode::EditInterval { channel, buffer };
                }
            },
            PanelMode::PickHotkey => match binding_from_key(key) {
                Some(target) => self.begin_capture(CaptureTarget::Hotkey(target)),
                None if !cancelled => self.mode = PanelMode::PickHotkey,
                None => {}
            },
            PanelMode::PickButton => match channel_from_key(key) {
                Some(channel) if channel.kind() == ChannelKind::MouseClick => {
                    self.cycle_button(channel)
                }
                _ if cancelled => {}
                _ => self.mode = PanelMode::PickButton,
            },
            PanelMode::Capturing(target) => {
                self.mode = PanelMode::Capturing(target);
                if !self.listener_ok {
                    // No global hook: take the key from the terminal instead.
                    if let Some(code) = term_to_key(key.code) {
                        self.dispatcher.handle_key(code);
                    }
                } else if cancelled && self.dispatcher.cancel_capture() {
                    self.mode = PanelMode::Normal;
                    self.notice("Key capture cancelled");
                }
            }
        }

        Flow::Continue
    }

    fn run_command(&mut self, key: &KeyEvent) -> Flow {
        let Some(command) = PanelCommand::from_key(key) else {
            return Flow::Continue;
        };

        match command {
            PanelCommand::Toggle(channel) => {
                let active = self.controller.toggle(channel);
                self.notice(format!(
                    "{} {}",
                    channel,
                    if active { "started" } else { "stopped" }
                ));
            }
            PanelCommand::EditInterval => self.mode = PanelMode::PickInterval,
            PanelCommand::RebindHotkey => self.mode = PanelMode::PickHotkey,
            PanelCommand::CaptureTargetKey => self.begin_capture(CaptureTarget::PressTarget),
            PanelCommand::CycleButton => self.mode = PanelMode::PickButton,
            PanelCommand::ToggleAutoUpdate => {
                self.settings.auto_check_updates = !self.settings.auto_check_updates;
                self.persist();
                self.notice(format!(
                    "Update check flag {}",
                    if self.settings.auto_check_updates { "on" } else { "off" }
                ));
            }
            PanelCommand::EmergencyStop => {
                self.controller.emergency_stop();
                self.notice("Emergency stop: all channels stopped");
            }
            PanelCommand::Quit => return Flow::Quit,
        }

        Flow::Continue
    }

    fn begin_capture(&mut self, target: CaptureTarget) {
        self.dispatcher.request_capture(target);
        self.mode = PanelMode::Capturing(target);
    }

    fn apply_interval(&mut self, channel: ChannelId, input: &str) {
        let Some(seconds) = parse_interval_input(input) else {
            self.notice(format!(
                "Invalid interval '{}': enter seconds between {} and {}",
                input,
                defaults::MIN_INTERVAL,
                defaults::MAX_INTERVAL
            ));
            return;
        };

        let stored = self.controller.set_interval(channel, seconds);
        self.settings.set_interval(channel, stored);
        self.persist();
        self.notice(format!("{} interval set to {}", channel, format_seconds(stored)));
    }

    fn cycle_button(&mut self, channel: ChannelId) {
        let ChannelTarget::Mouse(button) = self.controller.target(channel) else {
            return;
        };
        let next = button.next();

        self.controller
            .set_target(channel, ChannelTarget::Mouse(next));
        match channel {
            ChannelId::Clicker1 => self.settings.clicker1.button = next,
            ChannelId::Clicker2 => self.settings.clicker2.button = next,
            ChannelId::KeyPresser => return,
        }
        self.persist();
        self.notice(format!("{} now clicks {}", channel, next));
    }

    fn prompt(&self) -> Vec<String> {
        match &self.mode {
            PanelMode::Normal => {
                let mut menu = SingleMenu::new(PANEL_WIDTH).box_start();
                for pair in PanelCommand::ALL.chunks(2) {
                    let cells: Vec<String> = pair
                        .iter()
                        .map(|c| format!(" [{}] {:<24}", c.key_hint(), c.description()))
                        .collect();
                    menu = menu.line(&cells.concat(), Align::Left);
                }
                menu.box_end().build()
            }
            PanelMode::PickInterval => vec![
                "Set interval for: [1] Clicker 1  [2] Clicker 2  [3] Key Presser".to_string(),
                "Esc cancels".to_string(),
            ],
            PanelMode::EditInterval { channel, buffer } => vec![
                format!(
                    "{} interval in seconds ({} to {}): {}_",
                    channel,
                    defaults::MIN_INTERVAL,
                    defaults::MAX_INTERVAL,
                    buffer
                ),
                "Enter applies, Esc cancels".to_string(),
            ],
            PanelMode::PickHotkey => vec![
                "Rebind: [1] Clicker 1  [2] Clicker 2  [3] Key Presser  [4] Emergency Stop"
                    .to_string(),
                "Esc cancels".to_string(),
            ],
            PanelMode::PickButton => vec![
                "Change button for: [1] Clicker 1  [2] Clicker 2".to_string(),
                "Esc cancels".to_string(),
            ],
            PanelMode::Capturing(target) => vec![
                format!("Press the new key for {}", target),
                "Escape cancels".to_string(),
            ],
        }
    }

    pub fn render(&self) -> Vec<String> {
        let snapshot = self.controller.snapshot();

        let mut menu = DoubleMenu::new(PANEL_WIDTH)
            .header("DAC Clicker")
            .box_start()
            .line(
                &format!(
                    " {:<13}{:<12}{:>9}  {:<12}{}",
                    "Channel", "Hotkey", "Interval", "Target", "State"
                ),
                Align::Left,
            )
            .divider();

        for snap in &snapshot {
            let hotkey = &self.settings.hotkey(BindingTarget::Channel(snap.id)).display;
            menu = menu.line(
                &format!(
                    " {:<13}{:<12}{:>9}  {:<12}{}",
                    snap.id.to_string(),
                    hotkey,
                    format_seconds(snap.interval),
                    snap.target.to_string(),
                    state_label(snap)
                ),
                Align::Left,
            );
        }

        let lines = menu
            .divider()
            .row(
                " Emergency stop",
                &format!("{} ", self.settings.emergency_stop.display),
            )
            .row(" Input backend", &format!("{} ", self.backend))
            .row(
                " Check for updates",
                if self.settings.auto_check_updates {
                    "on "
                } else {
                    "off "
                },
            )
            .box_end()
            .blank()
            .build();

        let mut screen = lines;
        screen.extend(self.prompt());
        if !self.notices.is_empty() {
            screen.push(String::new());
            screen.extend(self.notices.iter().map(|n| format!(" • {}", n)));
        }
        screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{UiSender, ui_queue};
    use crate::core::{KeyCode, MouseButton};
    use crate::thread::ManualClock;
    use crossterm::event::KeyModifiers;
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        settings: Settings,
        manager: SettingsManager,
        controller: Arc<ToggleController>,
        dispatcher: Arc<HotkeyDispatcher>,
        ui: UiSender,
        rx: Option<UiReceiver>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let manager = SettingsManager::new_with_path(dir.path().join("config.json")).unwrap();
            let settings = Settings::default();
            let controller = Arc::new(ToggleController::new(&settings));
            let (ui, rx) = ui_queue();
            let dispatcher = Arc::new(HotkeyDispatcher::new(
                &settings,
                Arc::clone(&controller),
                Arc::new(ManualClock::new()),
                ui.clone(),
            ));
            Self {
                _dir: dir,
                settings,
                manager,
                controller,
                dispatcher,
                ui,
                rx: Some(rx),
            }
        }

        fn panel(&mut self) -> ControlPanel<'_> {
            ControlPanel::new(
                &mut self.settings,
                &self.manager,
                Arc::clone(&self.controller),
                Arc::clone(&self.dispatcher),
                self.rx.take().unwrap(),
                BackendKind::Rdev,
            )
        }
    }

    fn press(panel: &mut ControlPanel<'_>, code: TermKey) -> Flow {
        panel.handle_key(&KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(panel: &mut ControlPanel<'_>, text: &str) {
        for c in text.chars() {
            press(panel, TermKey::Char(c));
        }
    }

    #[test]
    fn digit_keys_toggle_channels() {
        let mut h = Harness::new();
        let controller = Arc::clone(&h.controller);
        let mut panel = h.panel();

        press(&mut panel, TermKey::Char('2'));
        press(&mut panel, TermKey::Char('1'));
        assert!(controller.is_active(ChannelId::Clicker1));
        assert!(!controller.is_active(ChannelId::Clicker2));

        press(&mut panel, TermKey::Char('x'));
        assert!(controller.snapshot().iter().all(|s| !s.active));
    }

    #[test]
    fn quit_keys() {
        let mut h = Harness::new();
        let mut panel = h.panel();
        assert_eq!(press(&mut panel, TermKey::Char('q')), Flow::Quit);
        assert_eq!(press(&mut panel, TermKey::Esc), Flow::Quit);
    }

    #[test]
    fn interval_edit_updates_controller_and_file() {
        let mut h = Harness::new();
        let controller = Arc::clone(&h.controller);
        {
            let mut panel = h.panel();
            press(&mut panel, TermKey::Char('i'));
            press(&mut panel, TermKey::Char('2'));
            type_text(&mut panel, "0.255");
            press(&mut panel, TermKey::Backspace);
            press(&mut panel, TermKey::Enter);
            assert!(panel.render().iter().any(|l| l.contains("[I] Set interval")));
        }

        assert_eq!(controller.interval(ChannelId::Clicker2), 0.25);
        assert_eq!(h.settings.clicker2.interval, 0.25);
        assert_eq!(h.manager.load().unwrap().clicker2.interval, 0.25);
    }

    #[test]
    fn invalid_interval_is_rejected() {
        let mut h = Harness::new();
        let controller = Arc::clone(&h.controller);
        let mut panel = h.panel();

        press(&mut panel, TermKey::Char('i'));
        press(&mut panel, TermKey::Char('1'));
        type_text(&mut panel, "75");
        press(&mut panel, TermKey::Enter);

        assert_eq!(controller.interval(ChannelId::Clicker1), 0.1);
        assert!(panel.render().iter().any(|l| l.contains("Invalid interval '75'")));
    }

    #[test]
    fn escape_leaves_sub_prompt_without_quitting() {
        let mut h = Harness::new();
        let mut panel = h.panel();

        press(&mut panel, TermKey::Char('h'));
        assert_eq!(press(&mut panel, TermKey::Esc), Flow::Continue);
        assert_eq!(panel.mode, PanelMode::Normal);

        press(&mut panel, TermKey::Char('i'));
        press(&mut panel, TermKey::Char('9'));
        assert_eq!(panel.mode, PanelMode::PickInterval);
    }

    #[test]
    fn button_cycles_and_persists() {
        let mut h = Harness::new();
        let controller = Arc::clone(&h.controller);
        {
            let mut panel = h.panel();
            press(&mut panel, TermKey::Char('b'));
            press(&mut panel, TermKey::Char('3'));
            assert_eq!(panel.mode, PanelMode::PickButton);
            press(&mut panel, TermKey::Char('1'));
        }

        assert_eq!(
            controller.target(ChannelId::Clicker1),
            ChannelTarget::Mouse(MouseButton::Right)
        );
        assert_eq!(h.manager.load().unwrap().clicker1.button, MouseButton::Right);
    }

    #[test]
    fn hotkey_capture_flows_through_queue() {
        let mut h = Harness::new();
        let dispatcher = Arc::clone(&h.dispatcher);
        {
            let mut panel = h.panel();
            press(&mut panel, TermKey::Char('h'));
            press(&mut panel, TermKey::Char('4'));
            assert_eq!(
                dispatcher.pending_capture(),
                Some(CaptureTarget::Hotkey(BindingTarget::EmergencyStop))
            );

            // Terminal keys are ignored while the global hook captures.
            press(&mut panel, TermKey::Char('1'));
            dispatcher.handle_key(KeyCode::Function(12));
            panel.drain_events();
            assert_eq!(panel.mode, PanelMode::Normal);
        }

        assert_eq!(h.settings.emergency_stop.key, KeyCode::Function(12));
        assert_eq!(h.settings.emergency_stop.display, "F12");
        assert_eq!(
            h.manager.load().unwrap().emergency_stop.key,
            KeyCode::Function(12)
        );
        assert!(!h.controller.is_active(ChannelId::Clicker1));
    }

    #[test]
    fn capture_uses_terminal_when_listener_is_down() {
        let mut h = Harness::new();
        let ui = h.ui.clone();
        {
            let mut panel = h.panel();
            ui.post(UiEvent::BackendFailure("no hook".to_string()));
            panel.drain_events();

            press(&mut panel, TermKey::Char('t'));
            press(&mut panel, TermKey::Char('E'));
            panel.drain_events();
            assert_eq!(panel.mode, PanelMode::Normal);
        }

        assert_eq!(h.settings.key_presser.target_key.key, KeyCode::Char('e'));
        assert_eq!(
            h.controller.target(ChannelId::KeyPresser),
            ChannelTarget::Key(KeyCode::Char('e'))
        );
    }

    #[test]
    fn escape_cancels_pending_capture() {
        let mut h = Harness::new();
        let dispatcher = Arc::clone(&h.dispatcher);
        let mut panel = h.panel();

        press(&mut panel, TermKey::Char('t'));
        press(&mut panel, TermKey::Esc);
        assert_eq!(panel.mode, PanelMode::Normal);
        assert_eq!(dispatcher.pending_capture(), None);
    }

    #[test]
    fn render_shows_channels_and_errors() {
        let mut h = Harness::new();
        let controller = Arc::clone(&h.controller);
        let ui = h.ui.clone();
        let mut panel = h.panel();

        controller.start(ChannelId::KeyPresser);
        ui.post(UiEvent::StatusChanged {
            channel: ChannelId::Clicker2,
            status: ChannelStatus::Error("device gone".to_string()),
        });
        panel.drain_events();

        let screen = panel.render();
        let row = |name: &str| screen.iter().find(|l| l.contains(name)).unwrap().clone();
        assert!(row("Key Presser").contains("RUNNING"));
        assert!(row("Key Presser").contains("Space"));
        assert!(row("Clicker 1").contains("0.1s"));
        assert!(row("Clicker 1").contains("F6"));
        assert!(screen.iter().any(|l| l.contains("Clicker 2 stopped: device gone")));
        assert!(row("Emergency stop").contains("F9"));
    }

    #[test]
    fn update_flag_toggles() {
        let mut h = Harness::new();
        {
            let mut panel = h.panel();
            press(&mut panel, TermKey::Char('u'));
        }
        assert!(!h.settings.auto_check_updates);
        assert!(!h.manager.load().unwrap().auto_check_updates);
    }

    #[test]
    fn seconds_formatting() {
        assert_eq!(format_seconds(0.1), "0.1s");
        assert_eq!(format_seconds(0.01), "0.01s");
        assert_eq!(format_seconds(60.0), "60s");
        assert_eq!(format_seconds(0.125), "0.125s");
    }

    #[test]
    fn notices_are_bounded() {
        let mut h = Harness::new();
        let mut panel = h.panel();
        for i in 0..10 {
            panel.notice(format!("n{}", i));
        }
        assert_eq!(panel.notices.len(), MAX_NOTICES);
        assert_eq!(panel.notices.front().map(String::as_str), Some("n4"));
    }
}
