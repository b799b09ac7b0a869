//! Sidebar view: network meter and the three status indicators.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use param_deck_core::status::thresholds::MAX_NET_BARS;
use param_deck_core::status::{ItemStatus, Sidebar};

use crate::theme::Theme;


/// Width the sidebar wants, in columns.
pub const SIDEBAR_WIDTH: u16 = 24;


pub fn render_sidebar(frame: &mut Frame, area: Rect, sidebar: &Sidebar, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.severity(sidebar.worst())));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(vec![
            Span::raw(meter(sidebar.net_bars)),
            Span::raw(" "),
            Span::styled(sidebar.net_type, Style::default().bold()),
        ]),
        Line::from(sidebar.connect_name.clone()),
        Line::styled(sidebar.link_detail.clone(), Style::default().fg(theme.muted.term())),
    ];
    if let Some(battery) = &sidebar.battery {
        lines.push(Line::from(format!("BAT {}", battery)));
    }
    lines.push(Line::raw(""));
    for item in [&sidebar.thermal, &sidebar.connectivity, &sidebar.vehicle] {
        lines.push(item_line(item, theme));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}


/// Signal meter, lit dots first.
pub fn meter(bars: u8) -> String {
    let lit = bars.min(MAX_NET_BARS) as usize;
    let dark = MAX_NET_BARS as usize - lit;
    format!("{}{}", "●".repeat(lit), "○".repeat(dark))
}


/// One indicator with a colored marker.
pub fn item_line(item: &ItemStatus, theme: &Theme) -> Line<'static> {
    let color = theme.severity(item.severity);
    Line::from(vec![
        Span::styled("▌", Style::default().fg(color)),
        Span::raw(" "),
        Span::styled(item.label.clone(), item_style(item, theme)),
    ])
}


fn item_style(item: &ItemStatus, theme: &Theme) -> Style {
    Style::default().fg(theme.severity(item.severity))
}
