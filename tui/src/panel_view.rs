//! Panel view: tab strip, control table and the footer below it.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap};

use param_deck_core::binding::{ControlBinding, ControlKind};
use param_deck_core::panel::Panel;

use crate::app::{App, AppState};
use crate::theme::Theme;


const HELP: &[(&str, &str)] = &[
    ("Tab / BackTab", "next / previous panel"),
    ("j k", "select"),
    ("g G PgUp PgDn", "first / last control"),
    ("Space Enter", "toggle, cycle or edit"),
    ("+ -", "step a value"),
    ("e", "edit text"),
    ("R P F", "reboot, power off, refresh"),
    ("C U", "reset calibration, uninstall"),
    ("?", "this help"),
    ("q", "quit"),
];


pub fn render_tabs(frame: &mut Frame, area: Rect, names: &[&str], active: usize, theme: &Theme) {
    let tabs = Tabs::new(names.iter().map(|n| n.to_string()).collect::<Vec<_>>())
        .select(active)
        .highlight_style(Style::default().fg(theme.active_tab.term()).bold())
        .divider("|");
    frame.render_widget(tabs, area);
}


/// Control table plus a footer for the selected row.
pub fn render_panel(
    frame: &mut Frame,
    area: Rect,
    panel: &Panel,
    app: &App,
    calibration: Option<&str>,
    theme: &Theme,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(6)])
        .split(area);

    if matches!(app.state, AppState::Help) {
        render_help(frame, chunks[0], theme);
    } else {
        render_controls(frame, chunks[0], panel, app.selected_index, theme);
    }
    render_footer(frame, chunks[1], panel, app, calibration, theme);
}


fn render_controls(frame: &mut Frame, area: Rect, panel: &Panel, selected: usize, theme: &Theme) {
    let rows: Vec<Row> = panel
        .bindings()
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let style = if i == selected {
                Style::default().bg(theme.selected_bg.term())
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(b.title()),
                Cell::from(b.display()).style(value_style(b, theme)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Fill(1), Constraint::Length(14)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border.term()))
            .title(panel.name()),
    );
    frame.render_widget(table, area);
}


/// Toggles show green when on; other kinds are plain.
fn value_style(binding: &ControlBinding, theme: &Theme) -> Style {
    match (binding.kind(), binding.value().as_bool()) {
        (ControlKind::Toggle(_), Some(true)) => Style::default().fg(theme.good.term()),
        (ControlKind::Toggle(_), _) => Style::default().fg(theme.muted.term()),
        _ => Style::default(),
    }
}


fn render_footer(
    frame: &mut Frame,
    area: Rect,
    panel: &Panel,
    app: &App,
    calibration: Option<&str>,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border.term()));
    let text = footer_text(panel, app, calibration);
    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);

    if let AppState::EditText { .. } = app.state {
        let col = area.x + 1 + app.input.cursor_pos() as u16;
        frame.set_cursor_position((col.min(area.right().saturating_sub(2)), area.y + 1));
    }
}


/// What the footer says for the current state.
pub fn footer_text(panel: &Panel, app: &App, calibration: Option<&str>) -> String {
    match &app.state {
        AppState::EditText { .. } => app.input.text(),
        AppState::Confirm { command } => format!("{} [y/n]", command.confirmation()),
        AppState::Help => "Esc to close help".to_string(),
        AppState::Browse => {
            let description = panel
                .bindings()
                .get(app.selected_index)
                .map(|b| b.description())
                .unwrap_or("");
            match calibration {
                Some(cal) if description.is_empty() => cal.to_string(),
                Some(cal) => format!("{}\n\n{}", description, cal),
                None => description.to_string(),
            }
        }
    }
}


fn render_help(frame: &mut Frame, area: Rect, theme: &Theme) {
    let rows: Vec<Row> = HELP
        .iter()
        .map(|(keys, what)| Row::new(vec![Cell::from(*keys).style(Style::default().bold()), Cell::from(*what)]))
        .collect();
    let table = Table::new(rows, [Constraint::Length(16), Constraint::Fill(1)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border.term()))
            .title("Keys"),
    );
    frame.render_widget(table, area);
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use param_deck_core::binding::{ControlSpec, LiveMirror};
    use param_deck_core::panel::{PanelBuilder, PanelDefinition, PanelEntry};
    use param_deck_core::store::{MemoryParams, ParamHandle};
    use param_deck_core::supervisor::Command;
    use ratatui::style::Color;

    use super::*;

    static DEF: PanelDefinition = PanelDefinition {
        name: "Test",
        entries: &[
            PanelEntry::new(ControlSpec::toggle("IsMetric", "Use Metric", "km/h", "")),
            PanelEntry::new(ControlSpec::text("CarModel", "Car Model", "", "")),
        ],
    };

    fn panel(values: &[(&'static str, &'static str)]) -> Panel {
        let store: ParamHandle = Arc::new(MemoryParams::with_values(
            values.iter().map(|(k, v)| (*k, v.as_bytes())),
        ));
        PanelBuilder::new(store, LiveMirror::new()).build(&DEF)
    }

    #[test]
    fn toggle_on_is_green() {
        let p = panel(&[("IsMetric", "1")]);
        let style = value_style(&p.bindings()[0], &Theme::dark());
        assert_eq!(style.fg, Some(Color::Green));
    }

    #[test]
    fn toggle_off_is_muted() {
        let p = panel(&[]);
        let style = value_style(&p.bindings()[0], &Theme::dark());
        assert_eq!(style.fg, Some(Color::DarkGray));
    }

    #[test]
    fn text_value_is_plain() {
        let p = panel(&[("CarModel", "KIA")]);
        assert_eq!(value_style(&p.bindings()[1], &Theme::dark()).fg, None);
    }

    #[test]
    fn footer_shows_selected_description() {
        let p = panel(&[]);
        let app = App::new();
        assert_eq!(footer_text(&p, &app, None), "km/h");
    }

    #[test]
    fn footer_appends_calibration() {
        let p = panel(&[]);
        let mut app = App::new();
        assert_eq!(footer_text(&p, &app, Some("pointed")), "km/h\n\npointed");
        app.selected_index = 1;
        assert_eq!(footer_text(&p, &app, Some("pointed")), "pointed");
    }

    #[test]
    fn footer_in_confirm_and_edit_states() {
        let p = panel(&[]);
        let mut app = App::new();
        app.transition(AppState::Confirm {
            command: Command::Reboot,
        });
        assert_eq!(
            footer_text(&p, &app, None),
            "Are you sure you want to reboot? [y/n]"
        );
        app.begin_edit("CarModel", "KIA");
        assert_eq!(footer_text(&p, &app, None), "KIA");
    }
}
