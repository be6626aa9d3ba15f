use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::models::QuestionRecord;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    render_header(frame, chunks[0], app);

    match app.session().current() {
        Some(record) => render_card(frame, chunks[1], app, record),
        None => render_empty(frame, chunks[1]),
    }

    super::render_status(frame, chunks[2], app);
    render_controls(frame, chunks[3], app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let session = app.session();
    let progress = session
        .position()
        .map(|(current, total)| format!("{}/{}", current, total))
        .unwrap_or_default();

    let halves = Layout::horizontal([Constraint::Fill(1), Constraint::Length(12)]).split(area);

    let title = Paragraph::new(Line::from(vec![
        Span::styled("STUDY MODE", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("  ·  {}", session.deck().label()),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    frame.render_widget(title, halves[0]);

    let widget = Paragraph::new(progress)
        .alignment(Alignment::Right)
        .fg(Color::DarkGray);
    frame.render_widget(widget, halves[1]);
}

fn render_card(frame: &mut Frame, area: Rect, app: &App, record: &QuestionRecord) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Color::DarkGray)
        .title(card_title(record))
        .padding(Padding::uniform(1));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let question = Paragraph::new(record.question.as_str())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(question, chunks[0]);

    let session = app.session();
    let answer = if session.is_revealed() {
        Paragraph::new(session.current_answer_text().unwrap_or_default())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .fg(Color::Green)
    } else if app.is_generating() {
        Paragraph::new("generating...")
            .alignment(Alignment::Center)
            .fg(Color::DarkGray)
    } else {
        Paragraph::new("drag right or press space to reveal")
            .alignment(Alignment::Center)
            .fg(Color::DarkGray)
    };
    frame.render_widget(answer, chunks[1]);
}

fn card_title(record: &QuestionRecord) -> Line<'_> {
    let mut spans = vec![Span::styled(
        format!(" {} ", record.subject),
        Style::default().fg(Color::Cyan),
    )];
    if record.is_bookmarked {
        spans.push(Span::styled("[bookmarked] ", Style::default().fg(Color::Yellow)));
    }
    if record.is_understood {
        spans.push(Span::styled("[understood] ", Style::default().fg(Color::Green)));
    }
    Line::from(spans)
}

fn render_empty(frame: &mut Frame, area: Rect) {
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No questions in this deck",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from("press a to add one, m to pick another deck".fg(Color::DarkGray)),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect, app: &App) {
    let generate = if app.ai_enabled() { "g ai answer  ·  " } else { "" };
    let text = format!(
        "h/l prev/next  ·  space reveal  ·  b bookmark  ·  u understood  ·  {}m menu  ·  a add  ·  q quit",
        generate
    );
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
