use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::api::{ApiConfig, HttpStudyApi, StudyApi};
use crate::checkpoints::CheckpointService;
use crate::error::AppServicesError;
use crate::sessions::{FlashcardStudyService, QuizService};

/// Assembles the app-facing services over one API client and one checkpoint store.
#[derive(Clone)]
pub struct AppServices {
    api: Arc<dyn StudyApi>,
    checkpoints: CheckpointService,
    flashcards: Arc<FlashcardStudyService>,
    quizzes: Arc<QuizService>,
}

impl AppServices {
    /// Build services backed by `SQLite` checkpoints and the HTTP API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or HTTP client setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        api: ApiConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let api: Arc<dyn StudyApi> = Arc::new(HttpStudyApi::new(api)?);
        Ok(Self::from_parts(clock, api, &storage))
    }

    /// Build services from an existing API implementation and storage.
    #[must_use]
    pub fn from_parts(clock: Clock, api: Arc<dyn StudyApi>, storage: &Storage) -> Self {
        let checkpoints = CheckpointService::new(clock, Arc::clone(&storage.checkpoints));
        let flashcards = Arc::new(FlashcardStudyService::new(
            clock,
            Arc::clone(&api),
            checkpoints.clone(),
        ));
        let quizzes = Arc::new(QuizService::new(
            clock,
            Arc::clone(&api),
            checkpoints.clone(),
        ));
        Self {
            api,
            checkpoints,
            flashcards,
            quizzes,
        }
    }

    #[must_use]
    pub fn api(&self) -> Arc<dyn StudyApi> {
        Arc::clone(&self.api)
    }

    #[must_use]
    pub fn checkpoints(&self) -> &CheckpointService {
        &self.checkpoints
    }

    #[must_use]
    pub fn flashcards(&self) -> Arc<FlashcardStudyService> {
        Arc::clone(&self.flashcards)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }
}
