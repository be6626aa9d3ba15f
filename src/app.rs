use std::sync::Arc;

use tracing::{error, info, warn};

use crate::generator::{Answer, GeneratorError};
use crate::models::{Deck, Screen};
use crate::session::{PendingAnswer, StudySession, SwipeDirection};
use crate::store::{QuestionStore, StoreError};

/// Drag distance credited for each terminal column the pointer moves.
const UNITS_PER_COLUMN: f64 = 8.0;

const FORM_FIELDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Study(Deck),
    AddQuestion,
}

impl MenuItem {
    pub fn label(&self) -> String {
        match self {
            MenuItem::Study(deck) => deck.label(),
            MenuItem::AddQuestion => "Add questions".to_string(),
        }
    }
}

/// Input fields of the add-question screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Question,
    Answer,
    Subject,
}

impl FormField {
    fn index(self) -> usize {
        match self {
            FormField::Question => 0,
            FormField::Answer => 1,
            FormField::Subject => 2,
        }
    }

    fn from_index(index: usize) -> Self {
        match index % FORM_FIELDS {
            0 => FormField::Question,
            1 => FormField::Answer,
            _ => FormField::Subject,
        }
    }
}

#[derive(Debug, Default)]
pub struct AddQuestionForm {
    pub question: String,
    pub answer: String,
    pub subject: String,
    focused: usize,
}

impl AddQuestionForm {
    pub fn focused(&self) -> FormField {
        FormField::from_index(self.focused)
    }

    pub fn focus_next(&mut self) {
        self.focused = (self.focused + 1) % FORM_FIELDS;
    }

    pub fn focus_previous(&mut self) {
        self.focused = (self.focused + FORM_FIELDS - 1) % FORM_FIELDS;
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focused() {
            FormField::Question => &mut self.question,
            FormField::Answer => &mut self.answer,
            FormField::Subject => &mut self.subject,
        }
    }

    pub fn push(&mut self, c: char) {
        self.field_mut().push(c);
    }

    pub fn pop(&mut self) {
        self.field_mut().pop();
    }

    /// Question and subject are required; the answer may be left blank.
    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty() && !self.subject.trim().is_empty()
    }

    fn clear(&mut self) {
        self.question.clear();
        self.answer.clear();
        self.subject.clear();
        self.focused = FormField::Question.index();
    }
}

/// State of the terminal shell around a [`StudySession`].
pub struct App {
    pub screen: Screen,
    store: Arc<QuestionStore>,
    session: StudySession,
    form: AddQuestionForm,
    menu_items: Vec<MenuItem>,
    menu_selected: usize,
    status: Option<String>,
    generating: Option<PendingAnswer>,
    drag_origin: Option<u16>,
    ai_enabled: bool,
}

impl App {
    pub fn new(store: Arc<QuestionStore>, deck: Deck, ai_enabled: bool) -> Self {
        let session = StudySession::new(Arc::clone(&store)).with_deck(deck);
        Self {
            screen: Screen::Study,
            store,
            session,
            form: AddQuestionForm::default(),
            menu_items: Vec::new(),
            menu_selected: 0,
            status: None,
            generating: None,
            drag_origin: None,
            ai_enabled,
        }
    }

    pub fn session(&self) -> &StudySession {
        &self.session
    }

    pub fn form(&self) -> &AddQuestionForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut AddQuestionForm {
        &mut self.form
    }

    pub fn menu_items(&self) -> &[MenuItem] {
        &self.menu_items
    }

    pub fn menu_selected(&self) -> usize {
        self.menu_selected
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_generating(&self) -> bool {
        self.generating.is_some()
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai_enabled
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }

    fn report(&mut self, action: &str, err: StoreError) {
        error!("{} failed: {}", action, err);
        self.set_status(format!("{} failed: {}", action, err));
    }

    pub fn reload(&mut self) {
        match self.session.load() {
            Ok(()) => {
                let count = self.session.questions().len();
                self.set_status(format!("{}: {} questions", self.session.deck().label(), count));
            }
            Err(e) => self.report("Loading questions", e),
        }
    }

    pub fn next_question(&mut self) {
        self.session.next();
        self.drag_origin = None;
    }

    pub fn previous_question(&mut self) {
        self.session.previous();
        self.drag_origin = None;
    }

    /// Flip the answer's visibility from the keyboard.
    pub fn toggle_reveal(&mut self) {
        let direction = if self.session.is_revealed() {
            SwipeDirection::Left
        } else {
            SwipeDirection::Right
        };
        self.session.swipe(direction);
    }

    pub fn drag_start(&mut self, column: u16) {
        self.drag_origin = Some(column);
    }

    /// Pointer moved to `column` while held down.
    pub fn drag_to(&mut self, column: u16) {
        if let Some(origin) = self.drag_origin {
            let delta = (f64::from(column) - f64::from(origin)) * UNITS_PER_COLUMN;
            self.session.reveal(delta);
        }
    }

    pub fn drag_end(&mut self) {
        self.drag_origin = None;
    }

    pub fn toggle_bookmark(&mut self) {
        match self.session.toggle_bookmark_current() {
            Ok(Some(true)) => self.set_status("Bookmarked"),
            Ok(Some(false)) => self.set_status("Bookmark removed"),
            Ok(None) => {}
            Err(e) => self.report("Bookmark", e),
        }
    }

    pub fn mark_understood(&mut self) {
        if self.session.is_empty() {
            return;
        }
        match self.session.mark_understood_and_advance() {
            Ok(()) => self.set_status("Marked as understood"),
            Err(e) => self.report("Marking understood", e),
        }
    }

    /// Start a generation for the current card.
    ///
    /// Returns `None` when the deck is empty or a request is already running.
    pub fn begin_generation(&mut self) -> Option<PendingAnswer> {
        if self.generating.is_some() {
            self.set_status("Still generating the previous answer...");
            return None;
        }
        let pending = self.session.pending_request()?;
        info!(question_id = pending.question_id, "Requesting generated answer");
        self.generating = Some(pending.clone());
        self.set_status("Generating answer...");
        Some(pending)
    }

    /// Apply the outcome of a request started by [`begin_generation`](Self::begin_generation).
    pub fn finish_generation(&mut self, question_id: i64, result: Result<Answer, GeneratorError>) {
        if self
            .generating
            .as_ref()
            .is_some_and(|pending| pending.question_id == question_id)
        {
            self.generating = None;
        }

        let status = match &result {
            Ok(Answer::Disabled) => "AI features are disabled".to_string(),
            Ok(Answer::Generated(_)) => "Answer saved".to_string(),
            Err(e) => {
                warn!(question_id, "Answer generation failed: {}", e);
                "Answer generation failed, keeping the existing answer".to_string()
            }
        };

        match self.session.apply_generated(question_id, result) {
            Ok(_) => self.set_status(status),
            Err(e) => self.report("Saving answer", e),
        }
    }

    pub fn open_menu(&mut self) {
        let mut items = vec![
            MenuItem::Study(Deck::All),
            MenuItem::Study(Deck::Bookmarked),
            MenuItem::Study(Deck::Unanswered),
        ];
        match self.store.subjects() {
            Ok(subjects) => items.extend(
                subjects
                    .into_iter()
                    .map(|subject| MenuItem::Study(Deck::Subject(subject))),
            ),
            Err(e) => self.report("Listing subjects", e),
        }
        items.push(MenuItem::AddQuestion);

        self.menu_selected = items
            .iter()
            .position(|item| matches!(item, MenuItem::Study(deck) if deck == self.session.deck()))
            .unwrap_or(0);
        self.menu_items = items;
        self.screen = Screen::Menu;
    }

    pub fn close_menu(&mut self) {
        self.screen = Screen::Study;
    }

    pub fn select_next_menu_item(&mut self) {
        if !self.menu_items.is_empty() {
            self.menu_selected = (self.menu_selected + 1) % self.menu_items.len();
        }
    }

    pub fn select_previous_menu_item(&mut self) {
        let len = self.menu_items.len();
        if len > 0 {
            self.menu_selected = (self.menu_selected + len - 1) % len;
        }
    }

    pub fn choose_menu_item(&mut self) {
        match self.menu_items.get(self.menu_selected).cloned() {
            Some(MenuItem::Study(deck)) => {
                self.session.set_deck(deck);
                self.reload();
                self.screen = Screen::Study;
            }
            Some(MenuItem::AddQuestion) => self.open_add_question(),
            None => self.screen = Screen::Study,
        }
    }

    pub fn open_add_question(&mut self) {
        self.screen = Screen::AddQuestion;
    }

    /// Save the form as a new question.
    pub fn submit_question(&mut self) {
        if !self.form.is_complete() {
            self.set_status("Question and subject are required");
            return;
        }
        let answer = Some(self.form.answer.as_str());
        match self.store.add(&self.form.question, answer, &self.form.subject) {
            Ok(id) => {
                self.form.clear();
                self.set_status(format!("Added question #{}", id));
            }
            Err(e) => self.report("Adding question", e),
        }
    }

    /// Leave the add screen and pick up any questions added there.
    pub fn close_add_question(&mut self) {
        self.screen = Screen::Study;
        self.reload();
    }
}
