use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Padding, Paragraph},
};

use crate::app::App;

const DRAWER_WIDTH: u16 = 32;

/// Navigation drawer drawn over the left edge of the study screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let drawer = Rect {
        width: DRAWER_WIDTH.min(area.width),
        ..area
    };
    frame.render_widget(Clear, drawer);

    let mut lines: Vec<Line> = Vec::with_capacity(app.menu_items().len() + 2);
    for (index, item) in app.menu_items().iter().enumerate() {
        let is_selected = index == app.menu_selected();
        let style = if is_selected {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if is_selected { ">" } else { " " };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", marker), style),
            Span::styled(item.label(), style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("j/k move · enter open · esc close".fg(Color::DarkGray)));

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray)
            .title(" Smritify ")
            .title_style(Style::default().fg(Color::Cyan).bold())
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(widget, drawer);
}
