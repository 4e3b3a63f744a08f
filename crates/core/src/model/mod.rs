pub mod checkpoint;
mod flashcard;
mod ids;
mod progress;
mod quiz;
mod user;

pub use checkpoint::{
    CheckpointKey, CheckpointMismatch, FlashcardCheckpoint, ParseCheckpointKeyError,
    QuizCheckpoint, SavedAnswer,
};
pub use ids::{CardId, ChoiceId, DeckId, ParseIdError, QuestionId, QuizId, RemoteSessionId};

pub use flashcard::{Deck, Difficulty, Flashcard, FlashcardError};
pub use progress::{Judgment, SessionSummary, SessionSummaryError, StudyStats, completion_message};
pub use quiz::{
    Choice, Question, Quiz, QuizAnswer, QuizInfo, QuizModelError, QuizResult, QuizSubmission,
};
pub use user::UserProfile;
