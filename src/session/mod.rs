//! Study session state: an ordered snapshot of questions, a cursor into it
//! and whether the current answer is revealed.
//!
//! The snapshot is taken by [`StudySession::load`] and is not refreshed by
//! later writes. Flag mutations go straight to the store and leave the
//! snapshot as loaded; only [`StudySession::toggle_bookmark_current`] and
//! generated answers touch the in-memory copy.

use std::sync::Arc;

use tracing::{debug, info};

use crate::generator::{Answer, AnswerGenerator, GeneratorError};
use crate::models::{Deck, QuestionRecord};
use crate::store::{self, QuestionStore};

/// Minimum horizontal drag distance that counts as a swipe.
pub const REVEAL_THRESHOLD: f64 = 50.0;

/// Shown when the current question has no stored answer.
pub const NO_ANSWER_PLACEHOLDER: &str = "No answer available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Shows the answer.
    Right,
    /// Hides the answer.
    Left,
}

/// A generation request captured from the current card.
///
/// The result must be applied with [`StudySession::apply_generated`] using
/// `question_id`, whatever card is current by then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAnswer {
    pub question_id: i64,
    pub question: String,
}

pub struct StudySession {
    store: Arc<QuestionStore>,
    deck: Deck,
    questions: Vec<QuestionRecord>,
    cursor: usize,
    revealed: bool,
    reveal_threshold: f64,
}

impl StudySession {
    /// Create an empty session over `store`. Call [`load`](Self::load) to
    /// fill it.
    pub fn new(store: Arc<QuestionStore>) -> Self {
        Self {
            store,
            deck: Deck::All,
            questions: Vec::new(),
            cursor: 0,
            revealed: false,
            reveal_threshold: REVEAL_THRESHOLD,
        }
    }

    pub fn with_deck(mut self, deck: Deck) -> Self {
        self.deck = deck;
        self
    }

    pub fn with_reveal_threshold(mut self, threshold: f64) -> Self {
        self.reveal_threshold = threshold;
        self
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Switch decks. Takes effect on the next [`load`](Self::load).
    pub fn set_deck(&mut self, deck: Deck) {
        self.deck = deck;
    }

    pub fn reveal_threshold(&self) -> f64 {
        self.reveal_threshold
    }

    /// Replace the snapshot with the deck's current contents.
    pub fn load(&mut self) -> store::Result<()> {
        self.questions = self.store.list_deck(&self.deck)?;
        self.cursor = 0;
        self.revealed = false;
        info!(deck = %self.deck.label(), count = self.questions.len(), "Loaded study session");
        Ok(())
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 1-based position of the current card and the deck size.
    pub fn position(&self) -> Option<(usize, usize)> {
        if self.questions.is_empty() {
            None
        } else {
            Some((self.cursor + 1, self.questions.len()))
        }
    }

    pub fn current(&self) -> Option<&QuestionRecord> {
        self.questions.get(self.cursor)
    }

    pub fn current_question_text(&self) -> Option<&str> {
        self.current().map(|record| record.question.as_str())
    }

    /// The current answer, or [`NO_ANSWER_PLACEHOLDER`] when there is none.
    pub fn current_answer_text(&self) -> Option<&str> {
        self.current()
            .map(|record| record.answer.as_deref().unwrap_or(NO_ANSWER_PLACEHOLDER))
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn next(&mut self) {
        let len = self.questions.len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor + 1) % len;
        self.revealed = false;
    }

    pub fn previous(&mut self) {
        let len = self.questions.len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor + len - 1) % len;
        self.revealed = false;
    }

    /// Handle a horizontal drag of `delta` units.
    ///
    /// Drags no longer than the threshold are ignored, as are non-finite
    /// deltas. Returns whether the reveal state changed.
    pub fn reveal(&mut self, delta: f64) -> bool {
        if !delta.is_finite() || delta.abs() <= self.reveal_threshold {
            return false;
        }
        let direction = if delta > 0.0 {
            SwipeDirection::Right
        } else {
            SwipeDirection::Left
        };
        self.swipe(direction)
    }

    /// Apply a swipe that already passed the threshold.
    ///
    /// Swiping towards the state the card is already in does nothing.
    pub fn swipe(&mut self, direction: SwipeDirection) -> bool {
        if self.questions.is_empty() {
            return false;
        }
        match direction {
            SwipeDirection::Right if !self.revealed => {
                self.revealed = true;
                true
            }
            SwipeDirection::Left if self.revealed => {
                self.revealed = false;
                true
            }
            _ => false,
        }
    }

    /// Bookmark the current question in the store.
    ///
    /// The snapshot keeps its loaded flag until the next `load`.
    pub fn bookmark_current(&mut self) -> store::Result<()> {
        if let Some(id) = self.current().map(|record| record.id) {
            self.store.set_bookmark(id, true)?;
        }
        Ok(())
    }

    /// Flip the current question's bookmark, in the store and the snapshot.
    ///
    /// Returns the new flag, or `None` when the session is empty.
    pub fn toggle_bookmark_current(&mut self) -> store::Result<Option<bool>> {
        let Some(record) = self.questions.get_mut(self.cursor) else {
            return Ok(None);
        };
        let bookmarked = !record.is_bookmarked;
        self.store.set_bookmark(record.id, bookmarked)?;
        record.is_bookmarked = bookmarked;
        Ok(Some(bookmarked))
    }

    pub fn mark_understood_and_advance(&mut self) -> store::Result<()> {
        let Some(id) = self.current().map(|record| record.id) else {
            return Ok(());
        };
        self.store.set_understood(id)?;
        self.next();
        Ok(())
    }

    /// Capture the current card for a generation request.
    pub fn pending_request(&self) -> Option<PendingAnswer> {
        self.current().map(|record| PendingAnswer {
            question_id: record.id,
            question: record.question.clone(),
        })
    }

    /// Store a generation result against `question_id`.
    ///
    /// Failures leave both the store and the snapshot untouched. Returns
    /// whether an answer was written.
    pub fn apply_generated(
        &mut self,
        question_id: i64,
        result: Result<Answer, GeneratorError>,
    ) -> store::Result<bool> {
        let answer = match result {
            Ok(answer) => answer.into_text(),
            Err(e) => {
                debug!(question_id, "Keeping existing answer after failed generation: {}", e);
                return Ok(false);
            }
        };

        self.store.set_answer(question_id, &answer)?;
        if let Some(record) = self.questions.iter_mut().find(|r| r.id == question_id) {
            record.answer = Some(answer);
        }
        Ok(true)
    }

    /// Generate an answer for the current question and store it.
    ///
    /// The write targets the question that was current when the call
    /// started.
    pub async fn request_generated_answer(
        &mut self,
        generator: &AnswerGenerator,
    ) -> store::Result<bool> {
        let Some(pending) = self.pending_request() else {
            return Ok(false);
        };
        let result = generator.generate_answer(&pending.question).await;
        self.apply_generated(pending.question_id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{DISABLED_MESSAGE, GeneratorConfig};

    fn store_with(questions: &[(&str, Option<&str>)]) -> Arc<QuestionStore> {
        let store = QuestionStore::open_in_memory().unwrap();
        for (question, answer) in questions {
            store.add(question, *answer, "Subj").unwrap();
        }
        Arc::new(store)
    }

    fn loaded(count: usize) -> StudySession {
        let questions: Vec<String> = (0..count).map(|i| format!("Q{}?", i)).collect();
        let pairs: Vec<(&str, Option<&str>)> =
            questions.iter().map(|q| (q.as_str(), None)).collect();
        let mut session = StudySession::new(store_with(&pairs));
        session.load().unwrap();
        session
    }

    #[test]
    fn test_next_cycles_back_to_start() {
        for len in 1..=6 {
            let mut session = loaded(len);
            session.next();
            let start = session.cursor();
            for _ in 0..len {
                session.next();
            }
            assert_eq!(session.cursor(), start, "len {}", len);
        }
    }

    #[test]
    fn test_previous_wraps_to_last() {
        for len in 1..=5 {
            let mut session = loaded(len);
            assert_eq!(session.cursor(), 0);
            session.previous();
            assert_eq!(session.cursor(), len - 1);
        }
    }

    #[test]
    fn test_reveal_right_is_idempotent() {
        let mut session = loaded(2);
        assert!(session.reveal(60.0));
        assert!(!session.reveal(60.0));
        assert!(session.is_revealed());
    }

    #[test]
    fn test_reveal_round_trip() {
        let mut session = loaded(2);
        session.reveal(60.0);
        session.reveal(-60.0);
        assert!(!session.is_revealed());
    }

    #[test]
    fn test_reveal_is_asymmetric() {
        let mut session = loaded(1);
        // Hiding an already hidden answer does nothing.
        assert!(!session.reveal(-100.0));
        assert!(!session.is_revealed());
    }

    #[test]
    fn test_reveal_below_threshold_ignored() {
        let mut session = loaded(1);
        assert!(!session.reveal(50.0));
        assert!(!session.reveal(-10.0));
        assert!(!session.is_revealed());
        assert!(session.reveal(50.5));
    }

    #[test]
    fn test_reveal_ignores_non_finite_delta() {
        let mut session = loaded(1);
        assert!(!session.reveal(f64::NAN));
        assert!(!session.reveal(f64::INFINITY));
        assert!(!session.is_revealed());

        session.reveal(60.0);
        assert!(!session.reveal(f64::NAN));
        assert!(!session.reveal(f64::NEG_INFINITY));
        assert!(session.is_revealed());
    }

    #[test]
    fn test_custom_threshold() {
        let mut session = loaded(1).with_reveal_threshold(5.0);
        assert!(session.reveal(6.0));
        assert!(session.is_revealed());
    }

    #[test]
    fn test_navigation_resets_reveal() {
        let mut session = loaded(3);
        session.swipe(SwipeDirection::Right);
        session.next();
        assert!(!session.is_revealed());

        session.swipe(SwipeDirection::Right);
        session.previous();
        assert!(!session.is_revealed());

        session.previous();
        assert!(!session.is_revealed());
    }

    #[test]
    fn test_empty_session_is_noop() {
        let mut session = loaded(0);
        assert!(session.is_empty());

        session.next();
        session.previous();
        session.bookmark_current().unwrap();
        session.mark_understood_and_advance().unwrap();
        assert_eq!(session.toggle_bookmark_current().unwrap(), None);
        assert!(!session.reveal(100.0));

        assert_eq!(session.cursor(), 0);
        assert!(!session.is_revealed());
        assert!(session.current().is_none());
        assert!(session.current_question_text().is_none());
        assert!(session.position().is_none());
        assert!(session.pending_request().is_none());
    }

    #[test]
    fn test_two_question_scenario() {
        let mut session = StudySession::new(store_with(&[("A?", None), ("B?", Some("ans"))]));
        session.load().unwrap();

        assert_eq!(session.cursor(), 0);
        assert_eq!(session.current_question_text(), Some("A?"));
        assert_eq!(session.current_answer_text(), Some(NO_ANSWER_PLACEHOLDER));

        session.next();
        assert_eq!(session.current_question_text(), Some("B?"));
        assert_eq!(session.current_answer_text(), Some("ans"));

        session.next();
        assert_eq!(session.current_question_text(), Some("A?"));
        assert_eq!(session.position(), Some((1, 2)));
    }

    #[test]
    fn test_bookmark_current_leaves_snapshot_stale() {
        let store = store_with(&[("A?", None)]);
        let mut session = StudySession::new(Arc::clone(&store));
        session.load().unwrap();

        session.bookmark_current().unwrap();
        let id = session.current().unwrap().id;

        assert!(store.get(id).unwrap().unwrap().is_bookmarked);
        assert!(!session.current().unwrap().is_bookmarked);

        session.load().unwrap();
        assert!(session.current().unwrap().is_bookmarked);
    }

    #[test]
    fn test_toggle_bookmark_updates_both() {
        let store = store_with(&[("A?", None)]);
        let mut session = StudySession::new(Arc::clone(&store));
        session.load().unwrap();
        let id = session.current().unwrap().id;

        assert_eq!(session.toggle_bookmark_current().unwrap(), Some(true));
        assert!(session.current().unwrap().is_bookmarked);
        assert!(store.get(id).unwrap().unwrap().is_bookmarked);

        assert_eq!(session.toggle_bookmark_current().unwrap(), Some(false));
        assert!(!store.get(id).unwrap().unwrap().is_bookmarked);
    }

    #[test]
    fn test_mark_understood_advances() {
        let store = store_with(&[("A?", None), ("B?", None)]);
        let mut session = StudySession::new(Arc::clone(&store));
        session.load().unwrap();
        let first = session.current().unwrap().id;
        session.swipe(SwipeDirection::Right);

        session.mark_understood_and_advance().unwrap();

        assert!(store.get(first).unwrap().unwrap().is_understood);
        assert_eq!(session.current_question_text(), Some("B?"));
        assert!(!session.is_revealed());
    }

    #[test]
    fn test_deck_filters_load() {
        let store = store_with(&[("A?", None), ("B?", Some("ans"))]);
        let mut session = StudySession::new(Arc::clone(&store)).with_deck(Deck::Unanswered);
        session.load().unwrap();
        assert_eq!(session.questions().len(), 1);
        assert_eq!(session.current_question_text(), Some("A?"));

        session.set_deck(Deck::Bookmarked);
        session.load().unwrap();
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_generator_persists_placeholder() {
        let store = store_with(&[("X?", None)]);
        let mut session = StudySession::new(Arc::clone(&store));
        session.load().unwrap();
        let generator = AnswerGenerator::disabled().unwrap();

        assert!(session.request_generated_answer(&generator).await.unwrap());

        let id = session.current().unwrap().id;
        assert_eq!(session.current_answer_text(), Some(DISABLED_MESSAGE));
        assert_eq!(
            store.get(id).unwrap().unwrap().answer.as_deref(),
            Some(DISABLED_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_answer() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .create_async()
            .await;
        let generator = AnswerGenerator::new(GeneratorConfig {
            api_key: Some("key".to_string()),
            base_url: server.url(),
            ..GeneratorConfig::default()
        })
        .unwrap();

        let store = store_with(&[("X?", Some("old"))]);
        let mut session = StudySession::new(Arc::clone(&store));
        session.load().unwrap();

        assert!(!session.request_generated_answer(&generator).await.unwrap());

        let id = session.current().unwrap().id;
        assert_eq!(session.current_answer_text(), Some("old"));
        assert_eq!(store.get(id).unwrap().unwrap().answer.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_empty_completion_leaves_question_unanswered() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":""}}]}"#)
            .create_async()
            .await;
        let generator = AnswerGenerator::new(GeneratorConfig {
            api_key: Some("key".to_string()),
            base_url: server.url(),
            ..GeneratorConfig::default()
        })
        .unwrap();

        let store = store_with(&[("X?", None)]);
        let mut session = StudySession::new(Arc::clone(&store));
        session.load().unwrap();

        assert!(!session.request_generated_answer(&generator).await.unwrap());

        let id = session.current().unwrap().id;
        assert_eq!(session.current_answer_text(), Some(NO_ANSWER_PLACEHOLDER));
        assert!(store.get(id).unwrap().unwrap().answer.is_none());
        assert_eq!(store.list_unanswered().unwrap().len(), 1);
    }

    #[test]
    fn test_late_answer_targets_captured_question() {
        let store = store_with(&[("A?", None), ("B?", None)]);
        let mut session = StudySession::new(Arc::clone(&store));
        session.load().unwrap();

        let pending = session.pending_request().unwrap();
        assert_eq!(pending.question, "A?");
        session.next();

        let applied = session
            .apply_generated(pending.question_id, Ok(Answer::Generated("for A".to_string())))
            .unwrap();
        assert!(applied);

        assert_eq!(session.current_question_text(), Some("B?"));
        assert_eq!(session.current_answer_text(), Some(NO_ANSWER_PLACEHOLDER));
        assert_eq!(
            store.get(pending.question_id).unwrap().unwrap().answer.as_deref(),
            Some("for A")
        );

        session.previous();
        assert_eq!(session.current_answer_text(), Some("for A"));
    }

    #[test]
    fn test_late_answer_after_reload_still_persists() {
        let store = store_with(&[("A?", None)]);
        let mut session = StudySession::new(Arc::clone(&store)).with_deck(Deck::Bookmarked);
        session.load().unwrap();
        assert!(session.is_empty());

        let id = store.list(None).unwrap()[0].id;
        assert!(session
            .apply_generated(id, Ok(Answer::Generated("x".to_string())))
            .unwrap());
        assert_eq!(store.get(id).unwrap().unwrap().answer.as_deref(), Some("x"));
    }
}
