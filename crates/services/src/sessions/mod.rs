mod flashcard;
mod flashcard_flow;
mod progress;
mod quiz;
mod quiz_flow;

// Public API of the session subsystem.
pub use crate::error::{QuizError, SessionError};
pub use flashcard::{FlashcardSession, StudyPhase, StudyStep};
pub use flashcard_flow::{FlashcardStudyService, StudyCompletion, StudyOutcome, StudyStart};
pub use progress::SessionProgress;
pub use quiz::{QuizPhase, QuizSession};
pub use quiz_flow::{QuizService, QuizStart, QuizTick};
