//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::model::{ChoiceId, QuestionId};

/// Errors emitted by the REST client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("username or password was rejected")]
    InvalidCredentials,
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    #[error("response violates domain rules: {0}")]
    Domain(#[from] study_core::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while reading or writing checkpoints.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CheckpointError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("checkpoint encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors emitted by the flashcard study flow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no cards available for session")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("reveal the answer before judging the card")]
    NotRevealed,
    #[error("card is already being judged")]
    Advancing,
    #[error("failed to load flashcards: {0}")]
    Fetch(#[source] ApiError),
}

/// Errors emitted by the quiz flow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    Empty,
    #[error("quiz is not in progress")]
    NotInProgress,
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("choice {choice} does not belong to question {question}")]
    UnknownChoice {
        question: QuestionId,
        choice: ChoiceId,
    },
    #[error("choice {index} is out of range ({len} choices)")]
    ChoiceOutOfRange { index: usize, len: usize },
    #[error("failed to load quiz questions: {0}")]
    Fetch(#[source] ApiError),
    #[error("failed to submit quiz: {0}")]
    Submit(#[source] ApiError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
