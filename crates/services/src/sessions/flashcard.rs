use chrono::{DateTime, Utc};

use study_core::model::{
    DeckId, Flashcard, FlashcardCheckpoint, Judgment, RemoteSessionId, SessionSummary, StudyStats,
    completion_message,
};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Where the learner is on the current card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyPhase {
    /// Front shown.
    Question,
    /// Back (and hint) shown; judging is allowed.
    Answer,
    /// Judged, waiting for the advance delay.
    Advancing,
    Complete,
}

/// Result of moving past the current card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyStep {
    Next { index: usize },
    Complete,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory flashcard session for one deck.
///
/// Cards are studied in the order they were fetched. The session never
/// performs I/O; `FlashcardStudyService` drives it and persists checkpoints.
#[derive(Debug, Clone)]
pub struct FlashcardSession {
    deck_id: DeckId,
    cards: Vec<Flashcard>,
    current: usize,
    phase: StudyPhase,
    stats: StudyStats,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    remote_session: Option<RemoteSessionId>,
}

impl FlashcardSession {
    /// Start a fresh session over `cards`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no cards are provided.
    pub fn new(
        deck_id: DeckId,
        cards: Vec<Flashcard>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if cards.is_empty() {
            return Err(SessionError::Empty);
        }
        let stats = StudyStats::new(card_total(&cards));
        Ok(Self {
            deck_id,
            cards,
            current: 0,
            phase: StudyPhase::Question,
            stats,
            started_at,
            completed_at: None,
            remote_session: None,
        })
    }

    /// Continue from a checkpoint already validated against `cards`.
    ///
    /// Only the index, the counters and the start time are restored. A
    /// checkpoint without a start time, or with one later than `now`, starts
    /// the clock at `now`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no cards are provided.
    pub fn resume(
        deck_id: DeckId,
        cards: Vec<Flashcard>,
        checkpoint: &FlashcardCheckpoint,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let started_at = checkpoint.started_at.map_or(now, |at| at.min(now));
        let mut session = Self::new(deck_id, cards, started_at)?;
        session.current = checkpoint.current_index.min(session.cards.len() - 1);
        session.stats.correct = checkpoint.stats.correct;
        session.stats.incorrect = checkpoint.stats.incorrect;
        Ok(session)
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn phase(&self) -> StudyPhase {
        self.phase
    }

    #[must_use]
    pub fn stats(&self) -> StudyStats {
        self.stats
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn remote_session(&self) -> Option<RemoteSessionId> {
        self.remote_session
    }

    pub fn set_remote_session(&mut self, id: RemoteSessionId) {
        self.remote_session = Some(id);
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == StudyPhase::Complete
    }

    /// The card being studied, or `None` once complete.
    #[must_use]
    pub fn current_card(&self) -> Option<&Flashcard> {
        if self.is_complete() {
            return None;
        }
        self.cards.get(self.current)
    }

    /// Whether the back of the current card is visible.
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        matches!(self.phase, StudyPhase::Answer | StudyPhase::Advancing)
    }

    /// Flip the current card. Flipping a revealed card hides the answer again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after completion and
    /// `SessionError::Advancing` while a judged card waits to advance.
    pub fn reveal(&mut self) -> Result<StudyPhase, SessionError> {
        self.phase = match self.phase {
            StudyPhase::Question => StudyPhase::Answer,
            StudyPhase::Answer => StudyPhase::Question,
            StudyPhase::Advancing => return Err(SessionError::Advancing),
            StudyPhase::Complete => return Err(SessionError::Completed),
        };
        Ok(self.phase)
    }

    /// Record the learner's judgment of the revealed card.
    ///
    /// The session stays on the card until `next` is called.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRevealed` before the answer is shown,
    /// `SessionError::Advancing` if the card was already judged and
    /// `SessionError::Completed` after completion.
    pub fn judge(&mut self, judgment: Judgment) -> Result<(), SessionError> {
        match self.phase {
            StudyPhase::Answer => {}
            StudyPhase::Question => return Err(SessionError::NotRevealed),
            StudyPhase::Advancing => return Err(SessionError::Advancing),
            StudyPhase::Complete => return Err(SessionError::Completed),
        }
        self.stats.record(judgment);
        self.phase = StudyPhase::Advancing;
        Ok(())
    }

    /// Move to the next card, completing the session after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session already completed.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<StudyStep, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.current + 1 < self.cards.len() {
            self.current += 1;
            self.phase = StudyPhase::Question;
            return Ok(StudyStep::Next {
                index: self.current,
            });
        }
        self.phase = StudyPhase::Complete;
        self.completed_at = Some(now);
        Ok(StudyStep::Complete)
    }

    /// Step back one card without judging. Returns `false` on the first card.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after completion and
    /// `SessionError::Advancing` while a judged card waits to advance.
    pub fn previous(&mut self) -> Result<bool, SessionError> {
        match self.phase {
            StudyPhase::Complete => return Err(SessionError::Completed),
            StudyPhase::Advancing => return Err(SessionError::Advancing),
            StudyPhase::Question | StudyPhase::Answer => {}
        }
        self.phase = StudyPhase::Question;
        if self.current == 0 {
            return Ok(false);
        }
        self.current -= 1;
        Ok(true)
    }

    /// Whether the current card is the last of the deck.
    #[must_use]
    pub fn is_last_card(&self) -> bool {
        self.current + 1 >= self.cards.len()
    }

    /// Snapshot for the checkpoint store. A judged card that is waiting to
    /// advance is saved as already passed, so it cannot be judged twice.
    #[must_use]
    pub fn checkpoint(&self) -> FlashcardCheckpoint {
        let index = match self.phase {
            StudyPhase::Advancing if !self.is_last_card() => self.current + 1,
            _ => self.current,
        };
        FlashcardCheckpoint::new(index, self.stats, self.started_at)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.cards.len();
        let is_complete = self.is_complete();
        SessionProgress {
            position: if is_complete { total } else { self.current + 1 },
            total,
            answered: usize::try_from(self.stats.judged()).unwrap_or(usize::MAX),
            is_complete,
        }
    }

    /// Statistics for the remote session-close endpoint. The duration is
    /// zero if `completed_at` precedes the start.
    #[must_use]
    pub fn summary(&self, completed_at: DateTime<Utc>) -> SessionSummary {
        SessionSummary::saturating(&self.stats, self.started_at, completed_at)
    }

    #[must_use]
    pub fn completion_message(&self) -> String {
        completion_message(&self.stats)
    }
}

fn card_total(cards: &[Flashcard]) -> u32 {
    u32::try_from(cards.len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use study_core::model::CardId;
    use study_core::time::fixed_now;

    fn cards(n: u64) -> Vec<Flashcard> {
        (1..=n)
            .map(|i| Flashcard::new(CardId::new(i), format!("front {i}"), format!("back {i}"), None).unwrap())
            .collect()
    }

    fn session(n: u64) -> FlashcardSession {
        FlashcardSession::new(DeckId::new(1), cards(n), fixed_now()).unwrap()
    }

    #[test]
    fn empty_deck_is_rejected() {
        let err = FlashcardSession::new(DeckId::new(1), Vec::new(), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn judging_requires_revealed_answer() {
        let mut s = session(2);
        assert!(matches!(s.judge(Judgment::Correct), Err(SessionError::NotRevealed)));

        assert_eq!(s.reveal().unwrap(), StudyPhase::Answer);
        s.judge(Judgment::Correct).unwrap();
        assert!(matches!(s.judge(Judgment::Correct), Err(SessionError::Advancing)));
        assert_eq!(s.stats().correct, 1);
    }

    #[test]
    fn reveal_toggles() {
        let mut s = session(1);
        assert_eq!(s.reveal().unwrap(), StudyPhase::Answer);
        assert!(s.is_revealed());
        assert_eq!(s.reveal().unwrap(), StudyPhase::Question);
        assert!(!s.is_revealed());
    }

    #[test]
    fn next_past_last_card_completes() {
        let mut s = session(2);
        assert_eq!(s.next(fixed_now()).unwrap(), StudyStep::Next { index: 1 });
        let done_at = fixed_now() + Duration::seconds(5);
        assert_eq!(s.next(done_at).unwrap(), StudyStep::Complete);
        assert!(s.is_complete());
        assert!(s.current_card().is_none());
        assert_eq!(s.completed_at(), Some(done_at));
        assert!(matches!(s.next(done_at), Err(SessionError::Completed)));
        assert!(matches!(s.reveal(), Err(SessionError::Completed)));
    }

    #[test]
    fn previous_on_first_card_is_noop() {
        let mut s = session(3);
        assert!(!s.previous().unwrap());
        assert_eq!(s.current_index(), 0);

        s.next(fixed_now()).unwrap();
        s.reveal().unwrap();
        assert!(s.previous().unwrap());
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.phase(), StudyPhase::Question);
    }

    #[test]
    fn resume_restores_index_counters_and_start() {
        let started = fixed_now() - Duration::minutes(3);
        let checkpoint = FlashcardCheckpoint::new(
            2,
            StudyStats {
                correct: 1,
                incorrect: 1,
                total: 99,
            },
            started,
        );
        let s = FlashcardSession::resume(DeckId::new(1), cards(4), &checkpoint, fixed_now()).unwrap();
        assert_eq!(s.current_index(), 2);
        assert_eq!(s.stats().correct, 1);
        assert_eq!(s.stats().incorrect, 1);
        assert_eq!(s.stats().total, 4);
        assert_eq!(s.started_at(), started);
        assert_eq!(s.phase(), StudyPhase::Question);
        assert_eq!(s.checkpoint().current_index, 2);
    }

    #[test]
    fn resume_clamps_future_start_to_now() {
        let checkpoint = FlashcardCheckpoint::new(
            0,
            StudyStats::default(),
            fixed_now() + Duration::hours(1),
        );
        let mut s =
            FlashcardSession::resume(DeckId::new(1), cards(1), &checkpoint, fixed_now()).unwrap();
        assert_eq!(s.started_at(), fixed_now());

        s.next(fixed_now()).unwrap();
        assert_eq!(s.summary(fixed_now() - Duration::seconds(3)).duration_secs(), 0);
    }

    #[test]
    fn judged_card_is_checkpointed_as_passed() {
        let mut s = session(2);
        s.reveal().unwrap();
        s.judge(Judgment::Correct).unwrap();
        let cp = s.checkpoint();
        assert_eq!(cp.current_index, 1);
        assert_eq!(cp.stats.correct, 1);

        s.next(fixed_now()).unwrap();
        s.reveal().unwrap();
        s.judge(Judgment::Incorrect).unwrap();
        assert!(s.is_last_card());
        assert_eq!(s.checkpoint().current_index, 1);
    }

    #[test]
    fn progress_reports_position() {
        let mut s = session(2);
        assert_eq!(s.progress().label("Card"), "Card 1 of 2");
        s.next(fixed_now()).unwrap();
        s.next(fixed_now()).unwrap();
        let progress = s.progress();
        assert!(progress.is_complete);
        assert_eq!(progress.position, 2);
    }

    #[test]
    fn summary_counts_judged_cards() {
        let mut s = session(2);
        s.reveal().unwrap();
        s.judge(Judgment::Correct).unwrap();
        s.next(fixed_now()).unwrap();
        s.reveal().unwrap();
        s.judge(Judgment::Incorrect).unwrap();
        let end = fixed_now() + Duration::seconds(42);
        s.next(end).unwrap();

        let summary = s.summary(end);
        assert_eq!(summary.cards_studied(), 2);
        assert_eq!(summary.cards_mastered(), 1);
        assert_eq!(summary.duration_secs(), 42);
        assert_eq!(s.completion_message(), "Study session complete! 1/2 correct");
    }
}
