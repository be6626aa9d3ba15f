mod question;

pub use question::{Deck, QuestionRecord};

/// Which screen the terminal shell is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Study,
    AddQuestion,
    Menu,
}
