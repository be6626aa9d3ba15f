use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single stored question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: i64,
    pub question: String,
    pub answer: Option<String>,
    pub subject: String,
    pub is_bookmarked: bool,
    pub is_understood: bool,
    pub created_at: DateTime<Utc>,
}

/// The store query a study session is built from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Deck {
    #[default]
    All,
    Subject(String),
    Bookmarked,
    Unanswered,
}

impl Deck {
    /// Short label for headers and menus.
    pub fn label(&self) -> String {
        match self {
            Deck::All => "All questions".to_string(),
            Deck::Subject(subject) => format!("Subject: {}", subject),
            Deck::Bookmarked => "Bookmarked".to_string(),
            Deck::Unanswered => "Unanswered".to_string(),
        }
    }
}
