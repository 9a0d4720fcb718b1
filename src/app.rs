use std::collections::VecDeque;
use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use crossterm::{execute, event::EnableMouseCapture, event::DisableMouseCapture};
use ratatui::{DefaultTerminal, Frame};
use tracing::{info, warn};

use crate::core::registry::{Action, ProcessRegistry, RegistryError};
use crate::core::usage::{UsageSource, CPU_LABEL_PLACEHOLDER, MEMORY_LABEL_PLACEHOLDER};
use crate::widgets::{
    ControlsWidget,
    EventEntry,
    EventLevel,
    EventLogWidget,
    ProcessTreeWidget,
    UsageWidget,
};

use ratatui::layout::{Layout, Direction, Constraint};
use ratatui::widgets::Paragraph;
use ratatui::style::{Style, Color};
use ratatui::text::{Span, Line};

const MAX_EVENTS: usize = 100;

pub struct App {
    pub registry: ProcessRegistry,
    pub usage_source: Box<dyn UsageSource>,
    pub cpu_text: String,
    pub memory_text: String,
    pub usage_stale: bool,
    pub events: VecDeque<EventEntry>,
    pub selected: usize,
    pub exit: bool,
    pub mouse_enabled: bool,
}

impl App {
    pub fn new(registry: ProcessRegistry, usage_source: Box<dyn UsageSource>) -> Self {
        App {
            registry,
            usage_source,
            cpu_text: CPU_LABEL_PLACEHOLDER.to_string(),
            memory_text: MEMORY_LABEL_PLACEHOLDER.to_string(),
            usage_stale: false,
            events: VecDeque::with_capacity(MAX_EVENTS),
            selected: 0,
            exit: false,
            mouse_enabled: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        if let Ok(()) = execute!(
            std::io::stdout(),
            EnableMouseCapture
        ) {
            self.mouse_enabled = true;
        }

        let result = self.run_loop(terminal);

        if self.mouse_enabled {
            let _ = execute!(
                std::io::stdout(),
                DisableMouseCapture
            );
        }

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        self.refresh_usage();
        while !self.exit {
            terminal.draw(|frame| self.draw(frame))?;
            // Nothing happens between user actions, so block until the next one.
            self.handle_events()?;
        }
        Ok(())
    }

    /// Re-samples usage. On failure the previous label text stays in place.
    pub fn refresh_usage(&mut self) {
        match self.usage_source.sample() {
            Ok(snapshot) => {
                self.cpu_text = snapshot.cpu_label();
                self.memory_text = snapshot.memory_label();
                self.usage_stale = false;
            }
            Err(err) => {
                warn!(error = %err, "usage sampling failed");
                self.usage_stale = true;
                self.push_event(EventLevel::Warn, format!("Usage unavailable: {}", err));
            }
        }
    }

    /// "Create Child" button for `index`.
    pub fn press_create(&mut self, index: usize) {
        if self.registry.spawning_disabled() {
            self.push_event(
                EventLevel::Warn,
                format!("Create Child {} is disabled", index + 1),
            );
            return;
        }
        let result = self.registry.on_primary_action(index);
        self.finish_action(result);
    }

    /// "Terminate" button for `index`.
    pub fn press_terminate(&mut self, index: usize) {
        let result = self.registry.terminate_slot(index);
        self.finish_action(result);
    }

    fn finish_action(&mut self, result: Result<Action, RegistryError>) {
        match result {
            Ok(action) => {
                let level = match action {
                    Action::TerminationRefused { .. } | Action::NothingToTerminate { .. } => EventLevel::Warn,
                    _ => EventLevel::Info,
                };
                self.push_event(level, action.to_string());
                self.refresh_usage();
            }
            Err(err) => {
                let level = match err {
                    RegistryError::Spawn(_) | RegistryError::UnknownSlot(_) => EventLevel::Error,
                    _ => EventLevel::Warn,
                };
                info!(error = %err, "action rejected");
                self.push_event(level, err.to_string());
            }
        }
    }

    fn push_event(&mut self, level: EventLevel, message: String) {
        if self.events.len() == MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(EventEntry { level, message });
    }

    fn draw(&self, frame: &mut Frame) {
        let slot_count = self.registry.slot_count() as u16;

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(6),                  // Tree + Events
                Constraint::Length(slot_count + 2),  // Controls
                Constraint::Length(4),               // Usage labels
                Constraint::Length(1),               // Status bar
            ])
            .margin(1)
            .split(frame.area());

        let top_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(55), // Process tree
                Constraint::Percentage(45), // Events
            ])
            .split(main_chunks[0]);

        frame.render_widget(ProcessTreeWidget::new(self.registry.tree()), top_chunks[0]);
        frame.render_widget(EventLogWidget::new(&self.events), top_chunks[1]);
        frame.render_widget(
            ControlsWidget::new(
                self.registry.slots(),
                self.selected,
                self.registry.spawning_disabled(),
            ),
            main_chunks[1],
        );
        frame.render_widget(
            UsageWidget::new(&self.cpu_text, &self.memory_text).stale(self.usage_stale),
            main_chunks[2],
        );

        let mut status_text = Vec::new();

        status_text.push(Span::styled("↑↓", Style::default().fg(Color::Green)));
        status_text.push(Span::raw(": Select "));

        status_text.push(Span::styled("Enter/c", Style::default().fg(Color::Green)));
        status_text.push(Span::raw(": Create Child "));

        status_text.push(Span::styled("1-9", Style::default().fg(Color::Green)));
        status_text.push(Span::raw(": Create in slot "));

        status_text.push(Span::styled("t", Style::default().fg(Color::Green)));
        status_text.push(Span::raw(": Terminate "));

        status_text.push(Span::styled("q", Style::default().fg(Color::Green)));
        status_text.push(Span::raw(": Quit"));

        let status_bar = Paragraph::new(Line::from(status_text));
        frame.render_widget(status_bar, main_chunks[3]);
    }

    fn handle_events(&mut self) -> io::Result<()> {
        match event::read()? {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                self.handle_key_event(key_event)
            }
            Event::Mouse(mouse_event) => {
                self.handle_mouse_event(mouse_event)
            }
            _ => {}
        };
        Ok(())
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        if key_event.kind != KeyEventKind::Press {
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => self.exit(),
            KeyCode::Up | KeyCode::Char('k') => self.select_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.select_down(1),
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('c') => self.press_create(self.selected),
            KeyCode::Char('t') | KeyCode::Delete => self.press_terminate(self.selected),
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as usize) - ('1' as usize);
                if index < self.registry.slot_count() {
                    self.selected = index;
                    self.press_create(index);
                }
            }
            _ => {}
        }
    }

    fn handle_mouse_event(&mut self, mouse_event: MouseEvent) {
        if !self.mouse_enabled {
            return;
        }

        match mouse_event.kind {
            MouseEventKind::ScrollUp => self.select_up(1),
            MouseEventKind::ScrollDown => self.select_down(1),
            _ => {}
        }
    }

    fn select_up(&mut self, amount: usize) {
        self.selected = self.selected.saturating_sub(amount);
    }

    fn select_down(&mut self, amount: usize) {
        let last = self.registry.slot_count().saturating_sub(1);
        self.selected = (self.selected + amount).min(last);
    }

    fn exit(&mut self) {
        self.exit = true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::core::process::SpawnError;
    use crate::core::registry::tests::{FakeSpawner, SpawnLog};
    use crate::core::usage::{SampleError, UsageSnapshot};

    /// Counts calls and fails when asked to.
    struct FakeUsage {
        calls: Rc<Cell<usize>>,
        fail: Rc<Cell<bool>>,
    }

    impl UsageSource for FakeUsage {
        fn sample(&mut self) -> Result<UsageSnapshot, SampleError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail.get() {
                return Err(SampleError::MissingToken("memory"));
            }
            Ok(UsageSnapshot {
                cpu: format!("{}.0", self.calls.get()),
                memory: "2048".to_string(),
            })
        }
    }

    struct Harness {
        app: App,
        samples: Rc<Cell<usize>>,
        fail_sampling: Rc<Cell<bool>>,
        spawns: Rc<RefCell<SpawnLog>>,
    }

    fn harness(slots: usize) -> Harness {
        let (spawner, spawns) = FakeSpawner::new();
        let samples = Rc::new(Cell::new(0));
        let fail_sampling = Rc::new(Cell::new(false));
        let usage = FakeUsage {
            calls: Rc::clone(&samples),
            fail: Rc::clone(&fail_sampling),
        };
        let registry = ProcessRegistry::new(slots, 1, Box::new(spawner));
        Harness {
            app: App::new(registry, Box::new(usage)),
            samples,
            fail_sampling,
            spawns,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn every_registry_action_samples_once() {
        let mut h = harness(3);

        h.app.press_create(0);          // spawn slot
        h.app.press_create(0);          // grandchild
        h.app.press_terminate(0);       // refused
        h.app.press_terminate(2);       // nothing to terminate
        h.app.press_create(1);
        h.app.press_terminate(1);       // terminated

        assert_eq!(h.samples.get(), 6);
    }

    #[test]
    fn rejected_actions_do_not_sample() {
        let mut h = harness(3);
        h.app.press_create(0);
        h.app.press_create(0);
        h.app.press_create(0);          // grandchild limit
        assert_eq!(h.samples.get(), 2);

        h.spawns.borrow_mut().fail_next.push_back(SpawnError::Fork(nix::errno::Errno::EAGAIN));
        h.app.press_create(1);          // fork failure
        assert_eq!(h.samples.get(), 2);
        assert!(!h.app.registry.slot(1).unwrap().is_occupied());
        assert_eq!(h.app.events.back().unwrap().level, EventLevel::Error);
    }

    #[test]
    fn disabled_create_button_swallows_presses() {
        let mut h = harness(2);
        h.app.press_create(0);
        h.app.press_create(1);
        assert!(h.app.registry.spawning_disabled());
        let before = h.samples.get();

        h.app.press_terminate(1);
        h.app.press_create(1);
        h.app.press_create(0);

        assert_eq!(h.samples.get(), before + 1);
        assert!(!h.app.registry.slot(1).unwrap().is_occupied());
        assert!(!h.app.registry.slot(0).unwrap().has_grandchild);
        assert_eq!(h.spawns.borrow().spawned.len(), 2);
    }

    #[test]
    fn failed_sample_keeps_previous_labels() {
        let mut h = harness(2);
        h.app.refresh_usage();
        assert_eq!(h.app.cpu_text, "CPU Usage: 1.0%");
        assert_eq!(h.app.memory_text, "Memory Usage: 2048 KB");

        h.fail_sampling.set(true);
        h.app.press_create(0);
        assert_eq!(h.app.cpu_text, "CPU Usage: 1.0%");
        assert!(h.app.usage_stale);
        assert_eq!(h.app.events.back().unwrap().level, EventLevel::Warn);
    }

    #[test]
    fn labels_start_as_placeholders() {
        let h = harness(2);
        assert_eq!(h.app.cpu_text, "CPU Usage: ");
        assert_eq!(h.app.memory_text, "Memory Usage: ");
    }

    #[test]
    fn keys_drive_selection_and_buttons() {
        let mut h = harness(3);

        h.app.handle_key_event(key(KeyCode::Down));
        h.app.handle_key_event(key(KeyCode::Down));
        h.app.handle_key_event(key(KeyCode::Down));
        assert_eq!(h.app.selected, 2);

        h.app.handle_key_event(key(KeyCode::Enter));
        assert!(h.app.registry.slot(2).unwrap().is_occupied());

        h.app.handle_key_event(key(KeyCode::Char('t')));
        assert!(!h.app.registry.slot(2).unwrap().is_occupied());

        h.app.handle_key_event(key(KeyCode::Char('2')));
        assert_eq!(h.app.selected, 1);
        assert!(h.app.registry.slot(1).unwrap().is_occupied());

        h.app.handle_key_event(key(KeyCode::Char('9')));
        assert_eq!(h.app.selected, 1);

        h.app.handle_key_event(key(KeyCode::Up));
        h.app.handle_key_event(key(KeyCode::Up));
        assert_eq!(h.app.selected, 0);

        h.app.handle_key_event(key(KeyCode::Char('q')));
        assert!(h.app.exit);
    }

    #[test]
    fn event_log_is_bounded() {
        let mut h = harness(1);
        for _ in 0..(MAX_EVENTS + 20) {
            h.app.press_terminate(0);
        }
        assert_eq!(h.app.events.len(), MAX_EVENTS);
    }

    #[test]
    fn draw_shows_tree_controls_and_usage() {
        let mut h = harness(2);
        h.app.refresh_usage();
        h.app.press_create(0);
        h.app.press_create(0);

        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| h.app.draw(frame)).unwrap();
        let screen: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();

        assert!(screen.contains("Parent (PID: 1)"));
        assert!(screen.contains("Main Child 1 (PID: 1001)"));
        assert!(screen.contains("Child of Main Child 1 (PID: 1002)"));
        assert!(screen.contains("Create Child 2"));
        assert!(screen.contains("Memory Usage: 2048 KB"));
    }
}
