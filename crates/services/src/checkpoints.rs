use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use storage::repository::{CheckpointRecord, CheckpointRepository};
use study_core::model::{CheckpointKey, DeckId, FlashcardCheckpoint, Quiz, QuizCheckpoint};

use crate::Clock;
use crate::error::CheckpointError;

/// Typed access to the checkpoint store.
///
/// Storage problems never abort a study flow: the `resume_*` helpers log and
/// fall back to a fresh start, and callers treat `save` failures as warnings.
#[derive(Clone)]
pub struct CheckpointService {
    clock: Clock,
    repo: Arc<dyn CheckpointRepository>,
}

impl CheckpointService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn CheckpointRepository>) -> Self {
        Self { clock, repo }
    }

    /// Load and decode the checkpoint under `key`.
    ///
    /// A payload that no longer decodes is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `CheckpointError::Storage` if the store cannot be read.
    pub async fn load<T: DeserializeOwned>(
        &self,
        key: CheckpointKey,
    ) -> Result<Option<T>, CheckpointError> {
        let Some(record) = self.repo.load(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&record.payload) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(%key, error = %err, "ignoring malformed checkpoint");
                Ok(None)
            }
        }
    }

    /// Encode and store `value` under `key`, replacing any previous checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `CheckpointError` if encoding or the store write fails.
    pub async fn save<T: Serialize>(
        &self,
        key: CheckpointKey,
        value: &T,
    ) -> Result<(), CheckpointError> {
        let payload = serde_json::to_string(value)?;
        self.repo
            .save(&CheckpointRecord::new(key, payload, self.clock.now()))
            .await?;
        debug!(%key, "checkpoint saved");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `CheckpointError::Storage` if the store cannot be written.
    pub async fn clear(&self, key: CheckpointKey) -> Result<bool, CheckpointError> {
        Ok(self.repo.clear(key).await?)
    }

    /// Keys of all stored checkpoints, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `CheckpointError::Storage` if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<CheckpointKey>, CheckpointError> {
        Ok(self.repo.list_keys().await?)
    }

    /// Checkpoint of a deck with `len` cards, if one exists and still fits.
    pub async fn resume_flashcards(&self, deck_id: DeckId, len: usize) -> Option<FlashcardCheckpoint> {
        let key = CheckpointKey::Flashcards(deck_id);
        let checkpoint: FlashcardCheckpoint = self.load_or_warn(key).await?;
        match checkpoint.validate_against(len) {
            Ok(()) => Some(checkpoint),
            Err(mismatch) => {
                warn!(%key, error = %mismatch, "discarding stale checkpoint");
                self.clear_or_warn(key).await;
                None
            }
        }
    }

    /// Checkpoint of `quiz`, if one exists and still fits.
    pub async fn resume_quiz(&self, quiz: &Quiz) -> Option<QuizCheckpoint> {
        let key = CheckpointKey::Quiz(quiz.id());
        let checkpoint: QuizCheckpoint = self.load_or_warn(key).await?;
        match checkpoint.validate_against(quiz) {
            Ok(()) => Some(checkpoint),
            Err(mismatch) => {
                warn!(%key, error = %mismatch, "discarding stale checkpoint");
                self.clear_or_warn(key).await;
                None
            }
        }
    }

    pub(crate) async fn save_or_warn<T: Serialize>(&self, key: CheckpointKey, value: &T) {
        if let Err(err) = self.save(key, value).await {
            warn!(%key, error = %err, "failed to save checkpoint");
        }
    }

    pub(crate) async fn clear_or_warn(&self, key: CheckpointKey) {
        if let Err(err) = self.clear(key).await {
            warn!(%key, error = %err, "failed to clear checkpoint");
        }
    }

    async fn load_or_warn<T: DeserializeOwned>(&self, key: CheckpointKey) -> Option<T> {
        match self.load(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(%key, error = %err, "failed to read checkpoint");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;
    use study_core::model::{Choice, ChoiceId, Question, QuestionId, QuizId, StudyStats};
    use study_core::time::{fixed_clock, fixed_now};

    fn service() -> (CheckpointService, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        (CheckpointService::new(fixed_clock(), repo.clone()), repo)
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (service, _) = service();
        let key = CheckpointKey::Flashcards(DeckId::new(1));
        let cp = FlashcardCheckpoint::new(1, StudyStats::new(3), fixed_now());

        service.save(key, &cp).await.unwrap();
        let loaded: FlashcardCheckpoint = service.load(key).await.unwrap().unwrap();
        assert_eq!(loaded, cp);
        assert_eq!(service.list().await.unwrap(), vec![key]);
    }

    #[tokio::test]
    async fn malformed_payload_reads_as_absent() {
        let (service, repo) = service();
        let key = CheckpointKey::Flashcards(DeckId::new(2));
        repo.save(&CheckpointRecord::new(key, "not json", fixed_now()))
            .await
            .unwrap();

        let loaded: Option<FlashcardCheckpoint> = service.load(key).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn stale_flashcard_checkpoint_is_discarded() {
        let (service, repo) = service();
        let deck = DeckId::new(3);
        let key = CheckpointKey::Flashcards(deck);
        service
            .save(key, &FlashcardCheckpoint::new(5, StudyStats::new(6), fixed_now()))
            .await
            .unwrap();

        assert!(service.resume_flashcards(deck, 2).await.is_none());
        assert!(repo.load(key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn valid_quiz_checkpoint_is_resumed() {
        let (service, _) = service();
        let question = Question::new(
            QuestionId::new(1),
            "Q",
            vec![Choice::new(ChoiceId::new(1), "a")],
        )
        .unwrap();
        let quiz = Quiz::new(QuizId::new(4), "Quiz", 60, vec![question]).unwrap();
        let cp = QuizCheckpoint {
            current_index: 0,
            answers: Vec::new(),
            remaining_secs: 30,
            started_at: Some(fixed_now()),
        };
        service.save(CheckpointKey::Quiz(quiz.id()), &cp).await.unwrap();

        assert_eq!(service.resume_quiz(&quiz).await, Some(cp));
    }
}
