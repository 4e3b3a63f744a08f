use std::sync::Arc;

use tracing::{debug, info};

use study_core::TickOutcome;
use study_core::model::{CheckpointKey, ChoiceId, QuestionId, QuizId, QuizResult};

use super::quiz::QuizSession;
use crate::Clock;
use crate::api::StudyApi;
use crate::checkpoints::CheckpointService;
use crate::countdown::CountdownTimer;
use crate::error::QuizError;

/// Outcome of opening a quiz.
#[derive(Debug)]
pub enum QuizStart {
    /// The quiz has no questions.
    Empty,
    Ready {
        session: QuizSession,
        resumed: bool,
    },
}

/// What a countdown tick did to the attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizTick {
    Running { remaining: u32 },
    /// Time ran out and the answers were submitted.
    Submitted(QuizResult),
    /// The countdown had already stopped.
    Stopped,
}

/// Drives quiz attempts against the API and the checkpoint store.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    api: Arc<dyn StudyApi>,
    checkpoints: CheckpointService,
    tick_checkpoint_every: u32,
}

impl QuizService {
    pub const DEFAULT_TICK_CHECKPOINT_EVERY: u32 = 10;

    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn StudyApi>, checkpoints: CheckpointService) -> Self {
        Self {
            clock,
            api,
            checkpoints,
            tick_checkpoint_every: Self::DEFAULT_TICK_CHECKPOINT_EVERY,
        }
    }

    /// Save the remaining time every `ticks` seconds while the clock runs.
    /// Zero disables tick checkpoints.
    #[must_use]
    pub fn with_tick_checkpoint_every(mut self, ticks: u32) -> Self {
        self.tick_checkpoint_every = ticks;
        self
    }

    /// Fetch the quiz and start or resume an attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Fetch` if the quiz cannot be loaded.
    pub async fn open(&self, quiz_id: QuizId) -> Result<QuizStart, QuizError> {
        let quiz = self.api.get_quiz(quiz_id).await.map_err(QuizError::Fetch)?;
        if quiz.is_empty() {
            info!(%quiz_id, "quiz has no questions");
            return Ok(QuizStart::Empty);
        }

        let now = self.clock.now();
        let (session, resumed) = match self.checkpoints.resume_quiz(&quiz).await {
            Some(checkpoint) => (QuizSession::resume(quiz, &checkpoint, now)?, true),
            None => (QuizSession::new(quiz, now)?, false),
        };
        info!(
            %quiz_id,
            questions = session.quiz().questions().len(),
            remaining = session.remaining_secs(),
            resumed,
            "quiz started"
        );
        Ok(QuizStart::Ready { session, resumed })
    }

    /// Start the one-second countdown for `session`.
    #[must_use]
    pub fn start_timer(&self, session: &QuizSession) -> CountdownTimer {
        CountdownTimer::start(session.countdown())
    }

    /// # Errors
    ///
    /// Returns `QuizError` if the ids do not belong to the quiz or results are in.
    pub async fn select(
        &self,
        session: &mut QuizSession,
        question_id: QuestionId,
        choice_id: ChoiceId,
    ) -> Result<(), QuizError> {
        session.select(question_id, choice_id)?;
        self.persist(session).await;
        Ok(())
    }

    /// Answer the current question by choice position.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if there is no such choice or results are in.
    pub async fn select_at(
        &self,
        session: &mut QuizSession,
        index: usize,
    ) -> Result<ChoiceId, QuizError> {
        let choice = session.select_at(index)?;
        self.persist(session).await;
        Ok(choice)
    }

    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` once results are in.
    pub async fn next(&self, session: &mut QuizSession) -> Result<bool, QuizError> {
        let moved = session.next()?;
        if moved {
            self.persist(session).await;
        }
        Ok(moved)
    }

    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` once results are in.
    pub async fn previous(&self, session: &mut QuizSession) -> Result<bool, QuizError> {
        let moved = session.previous()?;
        if moved {
            self.persist(session).await;
        }
        Ok(moved)
    }

    /// Apply one countdown second. When time runs out the attempt is
    /// submitted; this happens once per attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Submit` if the automatic submission fails. The
    /// attempt stays in progress and can still be submitted by hand.
    pub async fn on_tick(&self, session: &mut QuizSession) -> Result<QuizTick, QuizError> {
        match session.tick() {
            TickOutcome::Running { remaining } => {
                if self.tick_checkpoint_every > 0 && remaining % self.tick_checkpoint_every == 0 {
                    self.persist(session).await;
                }
                Ok(QuizTick::Running { remaining })
            }
            TickOutcome::Expired => {
                info!(quiz_id = %session.quiz().id(), "time is up, submitting");
                self.submit(session).await.map(QuizTick::Submitted)
            }
            TickOutcome::Stopped => Ok(QuizTick::Stopped),
        }
    }

    /// Submit the answered questions for scoring.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` if results are already in and
    /// `QuizError::Submit` if the server call fails; the attempt is left
    /// untouched in that case.
    pub async fn submit(&self, session: &mut QuizSession) -> Result<QuizResult, QuizError> {
        if !session.is_in_progress() {
            return Err(QuizError::NotInProgress);
        }
        let submission = session.submission();
        debug!(
            quiz_id = %submission.quiz_id,
            answers = submission.answers.len(),
            time_taken = submission.time_taken_secs,
            "submitting quiz"
        );
        let result = self
            .api
            .submit_quiz(&submission)
            .await
            .map_err(QuizError::Submit)?;

        session.record_result(result.clone());
        self.checkpoints
            .clear_or_warn(CheckpointKey::Quiz(session.quiz().id()))
            .await;
        info!(
            quiz_id = %submission.quiz_id,
            score = result.score,
            correct = result.correct_answers,
            total = result.total_questions,
            "quiz scored"
        );
        Ok(result)
    }

    /// Reset the attempt to its initial state for another try.
    pub fn retake(&self, session: &mut QuizSession) {
        session.retake(self.clock.now());
        debug!(quiz_id = %session.quiz().id(), "quiz retake");
    }

    /// Leave an unfinished attempt so it can be resumed later.
    pub async fn suspend(&self, session: &QuizSession) {
        if session.is_in_progress() {
            self.persist(session).await;
        }
    }

    /// End the attempt. If results are in they are handed to `on_complete`;
    /// an unfinished attempt is suspended instead.
    pub async fn close<F>(&self, session: QuizSession, on_complete: F)
    where
        F: FnOnce(&QuizResult) + Send,
    {
        match session.result() {
            Some(result) => on_complete(result),
            None => self.suspend(&session).await,
        }
    }

    async fn persist(&self, session: &QuizSession) {
        if !session.is_in_progress() {
            return;
        }
        self.checkpoints
            .save_or_warn(CheckpointKey::Quiz(session.quiz().id()), &session.checkpoint())
            .await;
    }
}

impl QuizTick {
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}
