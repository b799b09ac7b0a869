//! Terminal settings UI for Param Deck.
//!
//! `session` holds the behavior (panels, watcher, telemetry, commands) and
//! `tui` drives it from a crossterm event loop. The remaining modules are
//! the state machine, views and small helpers they share.

pub mod app;
pub mod input;
pub mod notification;
pub mod panel_view;
pub mod session;
pub mod sidebar;
pub mod theme;
pub mod tui;

pub use session::Session;
pub use theme::Theme;
pub use tui::Tui;
