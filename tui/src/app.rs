//! Application state machine for the settings UI.
//!
//! `App` tracks which mode the UI is in (browsing a panel, editing a text
//! control, confirming a device command, reading help) and turns key
//! presses into [`AppAction`]s. It knows nothing about the store; the
//! session executes actions and feeds results back.

use param_deck_core::binding::Interaction;
use param_deck_core::supervisor::Command;

use crate::input::InputLine;


// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    /// Moving through the controls of the current panel.
    Browse,
    /// Editing the text control backed by `key`.
    EditText { key: &'static str },
    /// Waiting for y/n before running `command`.
    Confirm { command: Command },
    Help,
}

impl AppState {
    pub fn label(&self) -> &'static str {
        match self {
            AppState::Browse => "Browse",
            AppState::EditText { .. } => "Edit",
            AppState::Confirm { .. } => "Confirm",
            AppState::Help => "Help",
        }
    }
}


// ---------------------------------------------------------------------------
// AppAction
// ---------------------------------------------------------------------------

/// What a key press asks the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Quit,
    NextPanel,
    PrevPanel,
    SelectNext,
    SelectPrev,
    SelectFirst,
    SelectLast,
    /// Apply an interaction to the selected control.
    Interact(Interaction),
    /// Start editing the selected control as text.
    BeginEdit,
    /// Commit the edit buffer to the control being edited.
    SubmitText { key: &'static str, text: String },
    /// Ask for confirmation of a device command.
    RequestCommand(Command),
    /// The user confirmed; run it.
    RunCommand(Command),
    Cancel,
}


// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct App {
    pub state: AppState,
    pub panel_index: usize,
    pub selected_index: usize,
    pub input: InputLine,
}

impl App {
    pub fn new() -> Self {
        App {
            state: AppState::Browse,
            panel_index: 0,
            selected_index: 0,
            input: InputLine::new(),
        }
    }

    pub fn transition(&mut self, state: AppState) {
        self.state = state;
    }

    /// Return to browsing, dropping any edit in progress.
    pub fn back(&mut self) {
        self.input.clear();
        self.state = AppState::Browse;
    }

    /// Enter text editing for `key` with the buffer preloaded.
    pub fn begin_edit(&mut self, key: &'static str, current: &str) {
        self.input.load(current);
        self.state = AppState::EditText { key };
    }

    /// Move to panel `index` of `count`, wrapping, and reset the selection.
    pub fn set_panel(&mut self, index: usize, count: usize) {
        self.panel_index = if count == 0 { 0 } else { index % count };
        self.selected_index = 0;
    }

    pub fn next_panel(&mut self, count: usize) {
        self.set_panel(self.panel_index + 1, count);
    }

    pub fn prev_panel(&mut self, count: usize) {
        let index = if self.panel_index == 0 {
            count.saturating_sub(1)
        } else {
            self.panel_index - 1
        };
        self.set_panel(index, count);
    }

    pub fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// `len` is the number of rows in the current panel.
    pub fn select_next(&mut self, len: usize) {
        if self.selected_index + 1 < len {
            self.selected_index += 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self, len: usize) {
        self.selected_index = len.saturating_sub(1);
    }

    /// Keep the selection inside a panel of `len` rows.
    pub fn clamp_selection(&mut self, len: usize) {
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    pub fn handle_key(&mut self, key: Key) -> Option<AppAction> {
        match &self.state {
            AppState::Browse => self.handle_browse_key(key),
            AppState::EditText { key: target } => {
                let target = *target;
                self.handle_edit_key(target, key)
            }
            AppState::Confirm { command } => {
                let command = *command;
                self.handle_confirm_key(command, key)
            }
            AppState::Help => self.handle_help_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: Key) -> Option<AppAction> {
        match key {
            Key::Char('q') => Some(AppAction::Quit),
            Key::Tab => Some(AppAction::NextPanel),
            Key::BackTab => Some(AppAction::PrevPanel),
            Key::Char('j') | Key::Down => Some(AppAction::SelectNext),
            Key::Char('k') | Key::Up => Some(AppAction::SelectPrev),
            Key::Char('g') | Key::Home | Key::PageUp => Some(AppAction::SelectFirst),
            Key::Char('G') | Key::End | Key::PageDown => Some(AppAction::SelectLast),
            Key::Char(' ') | Key::Enter => Some(AppAction::Interact(Interaction::Activate)),
            Key::Char('+') | Key::Char('=') | Key::Right => {
                Some(AppAction::Interact(Interaction::Increment))
            }
            Key::Char('-') | Key::Left => Some(AppAction::Interact(Interaction::Decrement)),
            Key::Char('e') => Some(AppAction::BeginEdit),
            Key::Char('R') => Some(AppAction::RequestCommand(Command::Reboot)),
            Key::Char('P') => Some(AppAction::RequestCommand(Command::PowerOff)),
            Key::Char('F') => Some(AppAction::RequestCommand(Command::Refresh)),
            Key::Char('C') => Some(AppAction::RequestCommand(Command::ResetCalibration)),
            Key::Char('U') => Some(AppAction::RequestCommand(Command::Uninstall)),
            Key::Char('?') => {
                self.transition(AppState::Help);
                None
            }
            _ => None,
        }
    }

    fn handle_edit_key(&mut self, target: &'static str, key: Key) -> Option<AppAction> {
        match key {
            Key::Escape => Some(AppAction::Cancel),
            Key::Enter => {
                let text = self.input.submit();
                Some(AppAction::SubmitText { key: target, text })
            }
            Key::Char(c) => {
                self.input.insert(c);
                None
            }
            Key::Backspace => {
                self.input.delete_back();
                None
            }
            Key::Delete => {
                self.input.delete_forward();
                None
            }
            Key::Left => {
                self.input.move_left();
                None
            }
            Key::Right => {
                self.input.move_right();
                None
            }
            Key::Home | Key::Ctrl('a') => {
                self.input.move_home();
                None
            }
            Key::End | Key::Ctrl('e') => {
                self.input.move_end();
                None
            }
            Key::Ctrl('u') => {
                self.input.clear();
                None
            }
            _ => None,
        }
    }

    fn handle_confirm_key(&mut self, command: Command, key: Key) -> Option<AppAction> {
        match key {
            Key::Char('y') | Key::Char('Y') | Key::Enter => Some(AppAction::RunCommand(command)),
            Key::Char('n') | Key::Char('N') | Key::Escape => Some(AppAction::Cancel),
            _ => None,
        }
    }

    fn handle_help_key(&mut self, key: Key) -> Option<AppAction> {
        match key {
            Key::Escape | Key::Char('q') | Key::Char('?') | Key::Enter => {
                self.back();
                None
            }
            _ => None,
        }
    }
}

impl Default for App {
    fn default() -> Self {
        App::new()
    }
}


/// Terminal-independent key representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    BackTab,
    Escape,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Ctrl(char),
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_starts_browsing_first_panel() {
        let app = App::new();
        assert_eq!(app.state, AppState::Browse);
        assert_eq!(app.panel_index, 0);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn browse_keys() {
        let mut app = App::new();
        assert_eq!(app.handle_key(Key::Char('q')), Some(AppAction::Quit));
        assert_eq!(app.handle_key(Key::Tab), Some(AppAction::NextPanel));
        assert_eq!(app.handle_key(Key::BackTab), Some(AppAction::PrevPanel));
        assert_eq!(app.handle_key(Key::Char('j')), Some(AppAction::SelectNext));
        assert_eq!(app.handle_key(Key::Up), Some(AppAction::SelectPrev));
        assert_eq!(
            app.handle_key(Key::Char(' ')),
            Some(AppAction::Interact(Interaction::Activate))
        );
        assert_eq!(
            app.handle_key(Key::Char('+')),
            Some(AppAction::Interact(Interaction::Increment))
        );
        assert_eq!(
            app.handle_key(Key::Char('-')),
            Some(AppAction::Interact(Interaction::Decrement))
        );
        assert_eq!(app.handle_key(Key::Char('e')), Some(AppAction::BeginEdit));
    }

    #[test]
    fn page_keys_jump_to_ends() {
        let mut app = App::new();
        assert_eq!(app.handle_key(Key::PageUp), Some(AppAction::SelectFirst));
        assert_eq!(app.handle_key(Key::Home), Some(AppAction::SelectFirst));
        assert_eq!(app.handle_key(Key::PageDown), Some(AppAction::SelectLast));
        assert_eq!(app.handle_key(Key::Char('G')), Some(AppAction::SelectLast));

        app.select_last(5);
        assert_eq!(app.selected_index, 4);
        app.select_first();
        assert_eq!(app.selected_index, 0);
        app.select_last(0);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn command_keys_request_confirmation() {
        let mut app = App::new();
        assert_eq!(
            app.handle_key(Key::Char('R')),
            Some(AppAction::RequestCommand(Command::Reboot))
        );
        assert_eq!(
            app.handle_key(Key::Char('C')),
            Some(AppAction::RequestCommand(Command::ResetCalibration))
        );
        assert_eq!(app.state, AppState::Browse);
    }

    #[test]
    fn confirm_state_accepts_yes_and_no() {
        let mut app = App::new();
        app.transition(AppState::Confirm {
            command: Command::PowerOff,
        });
        assert_eq!(app.handle_key(Key::Char('x')), None);
        assert_eq!(
            app.handle_key(Key::Char('y')),
            Some(AppAction::RunCommand(Command::PowerOff))
        );
        assert_eq!(app.handle_key(Key::Escape), Some(AppAction::Cancel));
    }

    #[test]
    fn edit_mode_collects_text_and_submits() {
        let mut app = App::new();
        app.begin_edit("CarModel", "KIA");
        assert_eq!(app.handle_key(Key::Char('q')), None);
        app.handle_key(Key::Backspace);
        let action = app.handle_key(Key::Enter);
        assert_eq!(
            action,
            Some(AppAction::SubmitText {
                key: "CarModel",
                text: "KIA".to_string()
            })
        );
    }

    #[test]
    fn edit_mode_escape_cancels() {
        let mut app = App::new();
        app.begin_edit("GitBranch", "devel");
        assert_eq!(app.handle_key(Key::Escape), Some(AppAction::Cancel));
    }

    #[test]
    fn help_toggles_back_to_browse() {
        let mut app = App::new();
        assert_eq!(app.handle_key(Key::Char('?')), None);
        assert_eq!(app.state, AppState::Help);
        assert_eq!(app.handle_key(Key::Char('j')), None);
        assert_eq!(app.handle_key(Key::Char('?')), None);
        assert_eq!(app.state, AppState::Browse);
    }

    #[test]
    fn panel_navigation_wraps_and_resets_selection() {
        let mut app = App::new();
        app.selected_index = 3;
        app.prev_panel(4);
        assert_eq!(app.panel_index, 3);
        assert_eq!(app.selected_index, 0);
        app.next_panel(4);
        assert_eq!(app.panel_index, 0);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut app = App::new();
        app.select_prev();
        assert_eq!(app.selected_index, 0);
        app.select_next(2);
        app.select_next(2);
        assert_eq!(app.selected_index, 1);
        app.clamp_selection(1);
        assert_eq!(app.selected_index, 0);
        app.clamp_selection(0);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn state_labels() {
        assert_eq!(AppState::Browse.label(), "Browse");
        assert_eq!(AppState::EditText { key: "CarModel" }.label(), "Edit");
    }
}
