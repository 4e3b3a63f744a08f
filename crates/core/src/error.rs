use thiserror::Error;

use crate::model::{
    CheckpointMismatch, FlashcardError, ParseCheckpointKeyError, QuizModelError,
    SessionSummaryError,
};

/// Aggregate of the domain validation errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Flashcard(#[from] FlashcardError),
    #[error(transparent)]
    Quiz(#[from] QuizModelError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointMismatch),
    #[error(transparent)]
    CheckpointKey(#[from] ParseCheckpointKeyError),
}
