//! # smritify
//!
//! A flashcard study tool: questions tagged by subject, kept in a local
//! SQLite database, studied one card at a time in the terminal, with
//! optional answers from a chat-completion API.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use smritify::{Config, Deck, Smritify, SmritifyError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SmritifyError> {
//!     let config = Config::from_env()?;
//!
//!     // Open the database and study every question
//!     let app = Smritify::open(&config, Deck::All)?;
//!     app.run().await?;
//!
//!     Ok(())
//! }
//! ```

mod app;
pub mod config;
pub mod generator;
mod models;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod terminal;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

pub use app::{AddQuestionForm, App, FormField, MenuItem};
pub use config::{Config, ConfigError};
pub use generator::{Answer, AnswerGenerator, GeneratorConfig, GeneratorError};
pub use models::{Deck, QuestionRecord, Screen};
pub use session::{PendingAnswer, StudySession, SwipeDirection};
pub use store::{QuestionStore, StoreError};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Error type for smritify operations.
#[derive(Error, Debug)]
pub enum SmritifyError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("answer generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The interactive study application.
pub struct Smritify {
    app: App,
    generator: Arc<AnswerGenerator>,
}

impl Smritify {
    /// Build from already opened parts.
    pub fn new(store: Arc<QuestionStore>, generator: AnswerGenerator, deck: Deck) -> Self {
        let ai_enabled = generator.is_enabled();
        Self {
            app: App::new(store, deck, ai_enabled),
            generator: Arc::new(generator),
        }
    }

    /// Open the database and answer generator described by `config`.
    pub fn open(config: &Config, deck: Deck) -> Result<Self, SmritifyError> {
        let store = QuestionStore::open(&config.db_path)?;
        let generator = AnswerGenerator::new(config.generator.clone())?;
        Ok(Self::new(Arc::new(store), generator, deck))
    }

    /// Run the study UI in the terminal.
    ///
    /// This will take over the terminal and return when the user quits.
    /// Must be called from within a tokio runtime; answer generation runs on
    /// spawned tasks.
    pub async fn run(mut self) -> Result<(), SmritifyError> {
        self.app.reload();

        let mut term = terminal::StudyTerminal::enter()?;
        let result = run_event_loop(&mut term, &mut self.app, &self.generator);
        term.leave()?;
        result
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }
}

/// What the event loop must do after an input event.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    None,
    Quit,
    Generate(PendingAnswer),
}

type Completion = (i64, Result<Answer, GeneratorError>);

fn run_event_loop(
    terminal: &mut terminal::AppTerminal,
    app: &mut App,
    generator: &Arc<AnswerGenerator>,
) -> Result<(), SmritifyError> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();

    loop {
        while let Ok((question_id, result)) = rx.try_recv() {
            app.finish_generation(question_id, result);
        }

        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll with a timeout so finished generations get drawn promptly.
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        let action = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => handle_input(app, key.code),
            Event::Mouse(mouse) => {
                handle_mouse(app, mouse);
                Action::None
            }
            _ => Action::None,
        };

        match action {
            Action::None => {}
            Action::Quit => break,
            Action::Generate(pending) => spawn_generation(generator, pending, tx.clone()),
        }
    }

    info!("Study session closed");
    Ok(())
}

fn spawn_generation(
    generator: &Arc<AnswerGenerator>,
    pending: PendingAnswer,
    tx: mpsc::UnboundedSender<Completion>,
) {
    let generator = Arc::clone(generator);
    tokio::spawn(async move {
        let result = generator.generate_answer(&pending.question).await;
        let _ = tx.send((pending.question_id, result));
    });
}

fn handle_input(app: &mut App, key: KeyCode) -> Action {
    match app.screen {
        Screen::Study => handle_study_input(app, key),
        Screen::Menu => handle_menu_input(app, key),
        Screen::AddQuestion => handle_add_question_input(app, key),
    }
}

fn handle_study_input(app: &mut App, key: KeyCode) -> Action {
    match key {
        KeyCode::Left | KeyCode::Char('h') => app.previous_question(),
        KeyCode::Right | KeyCode::Char('l') => app.next_question(),
        KeyCode::Char(' ') => app.toggle_reveal(),
        KeyCode::Char('b') => app.toggle_bookmark(),
        KeyCode::Char('u') => app.mark_understood(),
        KeyCode::Char('g') => {
            return app
                .begin_generation()
                .map_or(Action::None, Action::Generate);
        }
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('m') | KeyCode::Tab => app.open_menu(),
        KeyCode::Char('a') => app.open_add_question(),
        KeyCode::Char('q') | KeyCode::Char('Q') => return Action::Quit,
        _ => {}
    }
    Action::None
}

fn handle_menu_input(app: &mut App, key: KeyCode) -> Action {
    match key {
        KeyCode::Down | KeyCode::Char('j') => app.select_next_menu_item(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous_menu_item(),
        KeyCode::Enter => app.choose_menu_item(),
        KeyCode::Esc | KeyCode::Char('m') | KeyCode::Tab => app.close_menu(),
        KeyCode::Char('q') | KeyCode::Char('Q') => return Action::Quit,
        _ => {}
    }
    Action::None
}

fn handle_add_question_input(app: &mut App, key: KeyCode) -> Action {
    match key {
        KeyCode::Esc => app.close_add_question(),
        KeyCode::Tab | KeyCode::Down => app.form_mut().focus_next(),
        KeyCode::BackTab | KeyCode::Up => app.form_mut().focus_previous(),
        KeyCode::Enter => app.submit_question(),
        KeyCode::Backspace => app.form_mut().pop(),
        KeyCode::Char(c) => app.form_mut().push(c),
        _ => {}
    }
    Action::None
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != Screen::Study {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.drag_start(mouse.column),
        MouseEventKind::Drag(MouseButton::Left) => app.drag_to(mouse.column),
        MouseEventKind::Up(MouseButton::Left) => app.drag_end(),
        _ => {}
    }
}
