//! Line editor used while a text control is being edited.
//!
//! The buffer is a `Vec<char>` so cursor movement is per character, not per
//! byte.

/// A single-line edit buffer with a cursor.
#[derive(Debug, Clone, Default)]
pub struct InputLine {
    buffer: Vec<char>,
    cursor: usize,
}


impl InputLine {
    pub fn new() -> Self {
        InputLine::default()
    }

    /// Replace the buffer with `text` and put the cursor at the end.
    pub fn load(&mut self, text: &str) {
        self.buffer = text.chars().collect();
        self.cursor = self.buffer.len();
    }

    pub fn insert(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += 1;
    }

    /// Backspace.
    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.buffer.remove(self.cursor);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.buffer.len() {
            self.buffer.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.buffer.len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn text(&self) -> String {
        self.buffer.iter().collect()
    }

    /// Cursor position as a character index.
    pub fn cursor_pos(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Take the edited text, leaving the buffer empty.
    pub fn submit(&mut self) -> String {
        let text = self.text();
        self.clear();
        text
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_places_cursor_at_end() {
        let mut line = InputLine::new();
        line.load("release3");
        assert_eq!(line.cursor_pos(), 8);
        line.insert('!');
        assert_eq!(line.text(), "release3!");
    }

    #[test]
    fn editing_in_the_middle() {
        let mut line = InputLine::new();
        line.load("HYUNDAI");
        line.move_home();
        line.move_right();
        line.delete_forward();
        line.insert('X');
        assert_eq!(line.text(), "HXUNDAI");
        line.move_end();
        line.delete_back();
        assert_eq!(line.text(), "HXUNDA");
    }

    #[test]
    fn multibyte_characters_are_single_positions() {
        let mut line = InputLine::new();
        line.load("5°");
        line.delete_back();
        assert_eq!(line.text(), "5");
        assert_eq!(line.cursor_pos(), 1);
    }

    #[test]
    fn cursor_stops_at_bounds() {
        let mut line = InputLine::new();
        line.move_left();
        line.delete_back();
        assert_eq!(line.cursor_pos(), 0);
        line.insert('a');
        line.move_right();
        assert_eq!(line.cursor_pos(), 1);
    }

    #[test]
    fn submit_returns_text_and_clears() {
        let mut line = InputLine::new();
        line.load("devel");
        assert_eq!(line.submit(), "devel");
        assert!(line.is_empty());
        assert_eq!(line.cursor_pos(), 0);
    }
}
