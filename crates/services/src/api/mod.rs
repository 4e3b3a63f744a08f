//! Remote StudyBuddy REST API.

mod client;
mod config;
mod dto;

use async_trait::async_trait;

use study_core::model::{
    Deck, DeckId, Flashcard, Quiz, QuizId, QuizInfo, QuizResult, QuizSubmission, RemoteSessionId,
    SessionSummary,
};

use crate::error::ApiError;

pub use client::{AuthTokens, HttpStudyApi};
pub use config::{ApiConfig, parse_timeout};

/// Operations the study flows need from the backend.
///
/// Implementations must be cheap to share; flows hold them behind `Arc`.
#[async_trait]
pub trait StudyApi: Send + Sync {
    async fn list_decks(&self) -> Result<Vec<Deck>, ApiError>;

    /// Cards of a deck in server order.
    async fn get_cards(&self, deck_id: DeckId) -> Result<Vec<Flashcard>, ApiError>;

    /// Open a remote study session and return its id.
    async fn start_session(&self, deck_id: DeckId) -> Result<RemoteSessionId, ApiError>;

    /// Close a remote study session with its final statistics.
    async fn end_session(
        &self,
        session_id: RemoteSessionId,
        summary: &SessionSummary,
    ) -> Result<(), ApiError>;

    async fn list_quizzes(&self) -> Result<Vec<QuizInfo>, ApiError>;

    /// Quiz with its questions in server order.
    async fn get_quiz(&self, quiz_id: QuizId) -> Result<Quiz, ApiError>;

    /// Score a submission server-side.
    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizResult, ApiError>;
}
