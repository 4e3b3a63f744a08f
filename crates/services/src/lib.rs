#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod checkpoints;
pub mod countdown;
pub mod error;
pub mod sessions;

pub use study_core::Clock;

pub use api::{ApiConfig, AuthTokens, HttpStudyApi, StudyApi};
pub use app_services::AppServices;
pub use checkpoints::CheckpointService;
pub use countdown::CountdownTimer;
pub use error::{ApiError, AppServicesError, CheckpointError, QuizError, SessionError};
pub use sessions::{
    FlashcardSession, FlashcardStudyService, QuizPhase, QuizService, QuizSession, QuizStart,
    QuizTick, SessionProgress, StudyCompletion, StudyOutcome, StudyPhase, StudyStart, StudyStep,
};
