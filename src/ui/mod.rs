mod add_question;
mod menu;
mod study;

use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph},
};

use crate::app::App;
use crate::models::Screen;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    frame.render_widget(Block::default().bg(Color::Reset), area);

    match app.screen {
        Screen::Study => study::render(frame, area, app),
        Screen::AddQuestion => add_question::render(frame, area, app),
        Screen::Menu => {
            study::render(frame, area, app);
            menu::render(frame, area, app);
        }
    }
}

/// Status line shared by every screen.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let widget = Paragraph::new(app.status().unwrap_or(""))
        .alignment(Alignment::Center)
        .fg(Color::Yellow);
    frame.render_widget(widget, area);
}
