//! Colors for the terminal UI.
//!
//! A [`Theme`] maps indicator severities and UI chrome to colors. Themes are
//! serializable and selected by name from the config file.

use ratatui::style::Color as TermColor;
use serde::{Deserialize, Serialize};

use param_deck_core::status::Severity;


/// A named color, convertible to a terminal color.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Default,
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
    White,
    Gray,
    DarkGray,
    Rgb(u8, u8, u8),
}

impl Color {
    pub fn term(self) -> TermColor {
        match self {
            Color::Default => TermColor::Reset,
            Color::Red => TermColor::Red,
            Color::Green => TermColor::Green,
            Color::Yellow => TermColor::Yellow,
            Color::Blue => TermColor::Blue,
            Color::Cyan => TermColor::Cyan,
            Color::White => TermColor::White,
            Color::Gray => TermColor::Gray,
            Color::DarkGray => TermColor::DarkGray,
            Color::Rgb(r, g, b) => TermColor::Rgb(r, g, b),
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Theme {
    pub name: String,
    pub good: Color,
    pub warning: Color,
    pub danger: Color,
    pub border: Color,
    pub selected_bg: Color,
    pub active_tab: Color,
    pub muted: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Theme {
            name: "dark".into(),
            good: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            border: Color::Gray,
            selected_bg: Color::DarkGray,
            active_tab: Color::Cyan,
            muted: Color::DarkGray,
        }
    }

    pub fn light() -> Self {
        Theme {
            name: "light".into(),
            good: Color::Rgb(0, 128, 0),
            warning: Color::Rgb(176, 112, 0),
            danger: Color::Rgb(176, 0, 0),
            border: Color::DarkGray,
            selected_bg: Color::Gray,
            active_tab: Color::Blue,
            muted: Color::Gray,
        }
    }

    /// No color at all, for terminals that render it badly.
    pub fn minimal() -> Self {
        Theme {
            name: "minimal".into(),
            good: Color::Default,
            warning: Color::Default,
            danger: Color::Default,
            border: Color::Default,
            selected_bg: Color::DarkGray,
            active_tab: Color::Default,
            muted: Color::Default,
        }
    }

    /// Look up a built-in theme; unknown names fall back to dark.
    pub fn by_name(name: &str) -> Self {
        match name {
            "light" => Theme::light(),
            "minimal" => Theme::minimal(),
            _ => Theme::dark(),
        }
    }

    pub fn severity(&self, severity: Severity) -> TermColor {
        match severity {
            Severity::Good => self.good.term(),
            Severity::Warning => self.warning.term(),
            Severity::Danger => self.danger.term(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::dark()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_colors_in_dark_theme() {
        let theme = Theme::dark();
        assert_eq!(theme.severity(Severity::Good), TermColor::Green);
        assert_eq!(theme.severity(Severity::Warning), TermColor::Yellow);
        assert_eq!(theme.severity(Severity::Danger), TermColor::Red);
    }

    #[test]
    fn unknown_name_falls_back_to_dark() {
        assert_eq!(Theme::by_name("solarized"), Theme::dark());
        assert_eq!(Theme::by_name("light").name, "light");
    }

    #[test]
    fn theme_round_trips_through_json() {
        let json = serde_json::to_string(&Theme::light()).unwrap();
        let back: Theme = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Theme::light());
    }

    #[test]
    fn rgb_converts() {
        assert_eq!(Color::Rgb(1, 2, 3).term(), TermColor::Rgb(1, 2, 3));
    }
}
