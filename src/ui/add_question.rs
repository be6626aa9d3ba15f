use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, FormField};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    let title = Paragraph::new(Span::styled(
        "ADD QUESTIONS",
        Style::default().fg(Color::Cyan).bold(),
    ));
    frame.render_widget(title, chunks[0]);

    let form = app.form();
    let focused = form.focused();
    render_field(frame, chunks[1], " Question ", &form.question, focused == FormField::Question);
    render_field(
        frame,
        chunks[2],
        " Answer (optional) ",
        &form.answer,
        focused == FormField::Answer,
    );
    render_field(frame, chunks[3], " Subject ", &form.subject, focused == FormField::Subject);

    super::render_status(frame, chunks[5], app);
    render_controls(frame, chunks[6]);
}

fn render_field(frame: &mut Frame, area: Rect, title: &str, value: &str, is_focused: bool) {
    let border = if is_focused { Color::Cyan } else { Color::DarkGray };
    let text = if is_focused {
        format!("{}_", value)
    } else {
        value.to_string()
    };

    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .fg(Color::White)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(title),
        );
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("tab next field  ·  enter save  ·  esc back to study")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
