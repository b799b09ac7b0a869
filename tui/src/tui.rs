//! TUI runner: ratatui event loop with terminal setup and cleanup.
//!
//! The [`Tui`] struct owns the ratatui terminal and a [`Session`]. It runs
//! the main loop: draw a frame, poll for keyboard events, hand actions to
//! the session, and tick the session at the configured rate so external
//! changes, telemetry and pending pulse resets are picked up.

use std::io;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Terminal;
use tracing::info;

use param_deck_core::panel::Panel;
use param_deck_core::status::Sidebar;

use crate::app::{App, Key};
use crate::notification::{Notification, NotificationType};
use crate::panel_view;
use crate::session::Session;
use crate::sidebar::{self, SIDEBAR_WIDTH};
use crate::theme::Theme;


/// Snapshot of all state needed for rendering a single frame.
///
/// Extracted from `Tui` so that `terminal.draw()` can borrow its closure
/// argument without conflicting with the `&mut self` borrow on the terminal.
struct RenderState<'a> {
    app: &'a App,
    panel: &'a Panel,
    panel_names: Vec<&'static str>,
    sidebar: Sidebar,
    calibration: Option<&'a str>,
    notification: Option<&'a Notification>,
    theme: &'a Theme,
}


pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    session: Session,
    theme: Theme,
    tick_rate: Duration,
    last_tick: Instant,
}


impl Tui {
    /// Create a new TUI, entering raw mode and the alternate screen.
    pub fn new(session: Session, theme: Theme, tick_rate: Duration) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            session,
            theme,
            tick_rate,
            last_tick: Instant::now(),
        })
    }

    /// Run the main event loop until quit is requested.
    pub fn run(&mut self) -> Result<(), io::Error> {
        info!("settings UI started");
        loop {
            let now_ms = epoch_ms();
            let state = RenderState {
                app: self.session.app(),
                panel: self.session.panel(),
                panel_names: self.session.panel_names(),
                sidebar: self.session.sidebar(epoch_ns()),
                calibration: self.session.calibration(),
                notification: self.session.notifications().latest(now_ms),
                theme: &self.theme,
            };
            self.terminal.draw(|frame| render_frame(frame, &state))?;

            let timeout = self
                .tick_rate
                .checked_sub(self.last_tick.elapsed())
                .unwrap_or(Duration::ZERO);

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                        // Ctrl-C always quits immediately.
                        if key_event.code == KeyCode::Char('c')
                            && key_event.modifiers.contains(KeyModifiers::CONTROL)
                        {
                            break;
                        }

                        let key = crossterm_to_key(key_event.code, key_event.modifiers);
                        if let Some(action) = self.session.app_mut().handle_key(key) {
                            if self.session.handle_action(action, Instant::now(), epoch_ms()) {
                                break;
                            }
                        }
                    }
                    _ => {}
                }
            }

            if self.last_tick.elapsed() >= self.tick_rate {
                self.session.tick(Instant::now(), epoch_ms());
                self.last_tick = Instant::now();
            }
        }

        info!("settings UI stopped");
        self.shutdown()
    }

    /// Restore the terminal to its normal state.
    fn shutdown(&mut self) -> Result<(), io::Error> {
        terminal::disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}


impl Drop for Tui {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
    }
}


fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}


fn epoch_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}


// ---------------------------------------------------------------------------
// Rendering (free functions to avoid borrow conflicts)
// ---------------------------------------------------------------------------

/// Sidebar on the left; tabs, panel and footer on the right.
fn render_frame(frame: &mut Frame, state: &RenderState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(frame.area());

    sidebar::render_sidebar(frame, columns[0], &state.sidebar, state.theme);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Min(8),    // panel + footer
            Constraint::Length(1), // status bar
        ])
        .split(columns[1]);

    panel_view::render_tabs(
        frame,
        rows[0],
        &state.panel_names,
        state.app.panel_index,
        state.theme,
    );
    panel_view::render_panel(
        frame,
        rows[1],
        state.panel,
        state.app,
        state.calibration,
        state.theme,
    );
    render_status_bar(frame, rows[2], state.app, state.theme);

    if let Some(notification) = state.notification {
        render_notification(frame, rows[1], notification);
    }
}


fn render_status_bar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let text = format!(" {} | ? for help, q to quit", app.state.label());
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(theme.muted.term())),
        area,
    );
}


/// Banner over the top of the panel area.
fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let color = match notification.notification_type {
        NotificationType::Error => Color::Red,
        NotificationType::Warning => Color::Yellow,
        NotificationType::Success => Color::Green,
        NotificationType::Info => Color::Cyan,
    };
    let banner = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 3.min(area.height),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    frame.render_widget(Clear, banner);
    frame.render_widget(
        Paragraph::new(notification.summary())
            .block(block)
            .style(Style::default().fg(color)),
        banner,
    );
}


// ---------------------------------------------------------------------------
// Key conversion
// ---------------------------------------------------------------------------

/// Convert a crossterm `KeyCode` + `KeyModifiers` into our domain `Key` type.
pub fn crossterm_to_key(code: KeyCode, modifiers: KeyModifiers) -> Key {
    if modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char(ch) = code {
            return Key::Ctrl(ch);
        }
    }
    if modifiers.contains(KeyModifiers::ALT) {
        return Key::Char('\0');
    }
    match code {
        KeyCode::Char(ch) => Key::Char(ch),
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        _ => Key::Char('\0'), // unmapped keys produce a null char
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
