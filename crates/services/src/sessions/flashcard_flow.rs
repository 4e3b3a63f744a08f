use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use study_core::model::{CheckpointKey, DeckId, Judgment, SessionSummary, StudyStats};

use super::flashcard::{FlashcardSession, StudyStep};
use crate::Clock;
use crate::api::StudyApi;
use crate::checkpoints::CheckpointService;
use crate::error::SessionError;

/// Outcome of opening a deck for study.
#[derive(Debug)]
pub enum StudyStart {
    /// The deck has no cards; nothing was started or saved.
    Empty,
    Ready {
        session: FlashcardSession,
        resumed: bool,
    },
}

/// Final report of a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyCompletion {
    pub stats: StudyStats,
    pub summary: SessionSummary,
    pub message: String,
}

/// What happened after a judgment or a manual move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyOutcome {
    Continue { index: usize },
    Complete(StudyCompletion),
}

/// Drives flashcard sessions against the API and the checkpoint store.
#[derive(Clone)]
pub struct FlashcardStudyService {
    clock: Clock,
    api: Arc<dyn StudyApi>,
    checkpoints: CheckpointService,
    advance_delay: Duration,
}

impl FlashcardStudyService {
    pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(500);

    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn StudyApi>, checkpoints: CheckpointService) -> Self {
        Self {
            clock,
            api,
            checkpoints,
            advance_delay: Self::DEFAULT_ADVANCE_DELAY,
        }
    }

    /// Pause between judging a card and showing the next one.
    #[must_use]
    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    /// Fetch the deck's cards and start or resume a session.
    ///
    /// A remote session record is requested once cards are known to exist;
    /// failing to get one only disables the close call at the end.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Fetch` if the cards cannot be loaded.
    pub async fn open(&self, deck_id: DeckId) -> Result<StudyStart, SessionError> {
        let cards = self
            .api
            .get_cards(deck_id)
            .await
            .map_err(SessionError::Fetch)?;
        if cards.is_empty() {
            info!(%deck_id, "deck has no cards");
            return Ok(StudyStart::Empty);
        }

        let now = self.clock.now();
        let (mut session, resumed) = match self
            .checkpoints
            .resume_flashcards(deck_id, cards.len())
            .await
        {
            Some(checkpoint) => (
                FlashcardSession::resume(deck_id, cards, &checkpoint, now)?,
                true,
            ),
            None => (FlashcardSession::new(deck_id, cards, now)?, false),
        };

        match self.api.start_session(deck_id).await {
            Ok(remote) => session.set_remote_session(remote),
            Err(err) => warn!(%deck_id, error = %err, "continuing without remote session"),
        }

        info!(
            %deck_id,
            cards = session.total_cards(),
            index = session.current_index(),
            resumed,
            "study session started"
        );
        Ok(StudyStart::Ready { session, resumed })
    }

    /// Judge the revealed card, persist, wait the advance delay and move on.
    ///
    /// The checkpoint written before the delay already points past the judged
    /// card. On the last card nothing is written until completion clears it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the card cannot be judged in its current phase.
    pub async fn judge(
        &self,
        session: &mut FlashcardSession,
        judgment: Judgment,
    ) -> Result<StudyOutcome, SessionError> {
        session.judge(judgment)?;
        debug!(deck_id = %session.deck_id(), ?judgment, "card judged");
        if !session.is_last_card() {
            self.persist(session).await;
        }
        if !self.advance_delay.is_zero() {
            tokio::time::sleep(self.advance_delay).await;
        }
        self.next(session).await
    }

    /// Move to the next card without judging. On the last card this completes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session already completed.
    pub async fn next(&self, session: &mut FlashcardSession) -> Result<StudyOutcome, SessionError> {
        match session.next(self.clock.now())? {
            StudyStep::Next { index } => {
                self.persist(session).await;
                Ok(StudyOutcome::Continue { index })
            }
            StudyStep::Complete => Ok(StudyOutcome::Complete(self.finish(session).await)),
        }
    }

    /// Step back one card. Returns `false` if already on the first card.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session cannot move in its current phase.
    pub async fn previous(&self, session: &mut FlashcardSession) -> Result<bool, SessionError> {
        let moved = session.previous()?;
        if moved {
            self.persist(session).await;
        }
        Ok(moved)
    }

    /// Leave a session without completing it. Progress stays resumable if
    /// anything was judged or the learner moved past the first card.
    pub async fn suspend(&self, session: &FlashcardSession) {
        if session.is_complete() {
            return;
        }
        if session.current_index() > 0 || session.stats().has_progress() {
            self.persist(session).await;
        }
    }

    async fn finish(&self, session: &FlashcardSession) -> StudyCompletion {
        let completed_at = session.completed_at().unwrap_or_else(|| self.clock.now());
        let summary = session.summary(completed_at);

        if let Some(remote) = session.remote_session() {
            if let Err(err) = self.api.end_session(remote, &summary).await {
                warn!(session_id = %remote, error = %err, "failed to close remote session");
            }
        }
        self.checkpoints
            .clear_or_warn(CheckpointKey::Flashcards(session.deck_id()))
            .await;

        let stats = session.stats();
        info!(
            deck_id = %session.deck_id(),
            correct = stats.correct,
            incorrect = stats.incorrect,
            "study session complete"
        );
        StudyCompletion {
            stats,
            summary,
            message: session.completion_message(),
        }
    }

    async fn persist(&self, session: &FlashcardSession) {
        self.checkpoints
            .save_or_warn(
                CheckpointKey::Flashcards(session.deck_id()),
                &session.checkpoint(),
            )
            .await;
    }
}
