use std::collections::HashMap;

use chrono::{DateTime, Utc};

use study_core::model::{
    ChoiceId, Question, QuestionId, Quiz, QuizAnswer, QuizCheckpoint, QuizResult, QuizSubmission,
    SavedAnswer,
};
use study_core::{Countdown, TickOutcome, format_clock};

use super::progress::SessionProgress;
use crate::error::QuizError;

#[derive(Debug, Clone, PartialEq)]
pub enum QuizPhase {
    InProgress,
    Results(QuizResult),
}

/// In-memory attempt at one quiz.
///
/// Answers are kept per question, last selection wins. Navigation is
/// clamped at both ends and nothing forces every question to be answered.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: Quiz,
    current: usize,
    answers: HashMap<QuestionId, ChoiceId>,
    countdown: Countdown,
    phase: QuizPhase,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if the quiz has no questions.
    pub fn new(quiz: Quiz, started_at: DateTime<Utc>) -> Result<Self, QuizError> {
        if quiz.is_empty() {
            return Err(QuizError::Empty);
        }
        let countdown = Countdown::new(quiz.time_limit_secs());
        Ok(Self {
            quiz,
            current: 0,
            answers: HashMap::new(),
            countdown,
            phase: QuizPhase::InProgress,
            started_at,
        })
    }

    /// Continue an attempt from a checkpoint already validated against `quiz`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if the quiz has no questions.
    pub fn resume(
        quiz: Quiz,
        checkpoint: &QuizCheckpoint,
        now: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        let mut session = Self::new(quiz, checkpoint.started_at.unwrap_or(now))?;
        session.current = checkpoint
            .current_index
            .min(session.quiz.questions().len() - 1);
        session.answers = checkpoint
            .answers
            .iter()
            .map(|a| (a.question_id, a.choice_id))
            .collect();
        session.countdown = Countdown::resume(session.quiz.time_limit_secs(), checkpoint.remaining_secs);
        Ok(session)
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.phase == QuizPhase::InProgress
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        match &self.phase {
            QuizPhase::Results(result) => Some(result),
            QuizPhase::InProgress => None,
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        // `new` guarantees at least one question and `current` is clamped.
        &self.quiz.questions()[self.current]
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<ChoiceId> {
        self.answers.get(&question_id).copied()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    /// Remaining time as `m:ss`.
    #[must_use]
    pub fn clock_label(&self) -> String {
        format_clock(self.countdown.remaining())
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Record `choice_id` as the answer to `question_id`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` once results are in,
    /// `QuizError::UnknownQuestion` or `QuizError::UnknownChoice` for ids
    /// that are not part of this quiz.
    pub fn select(&mut self, question_id: QuestionId, choice_id: ChoiceId) -> Result<(), QuizError> {
        self.ensure_in_progress()?;
        let question = self
            .quiz
            .question(question_id)
            .ok_or(QuizError::UnknownQuestion(question_id))?;
        if !question.has_choice(choice_id) {
            return Err(QuizError::UnknownChoice {
                question: question_id,
                choice: choice_id,
            });
        }
        self.answers.insert(question_id, choice_id);
        Ok(())
    }

    /// Answer the current question with the choice at zero-based `index`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::ChoiceOutOfRange` if there is no such choice.
    pub fn select_at(&mut self, index: usize) -> Result<ChoiceId, QuizError> {
        self.ensure_in_progress()?;
        let question = self.current_question();
        let choice = question
            .choice_at(index)
            .ok_or(QuizError::ChoiceOutOfRange {
                index,
                len: question.choices().len(),
            })?
            .id;
        let question_id = question.id();
        self.answers.insert(question_id, choice);
        Ok(choice)
    }

    /// Move forward one question. Returns `false` on the last question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` once results are in.
    pub fn next(&mut self) -> Result<bool, QuizError> {
        self.ensure_in_progress()?;
        if self.current + 1 >= self.quiz.questions().len() {
            return Ok(false);
        }
        self.current += 1;
        Ok(true)
    }

    /// Move back one question. Returns `false` on the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` once results are in.
    pub fn previous(&mut self) -> Result<bool, QuizError> {
        self.ensure_in_progress()?;
        if self.current == 0 {
            return Ok(false);
        }
        self.current -= 1;
        Ok(true)
    }

    /// Advance the countdown one second. Does nothing once results are in.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_in_progress() {
            return TickOutcome::Stopped;
        }
        self.countdown.tick()
    }

    /// Answered questions in quiz order, with the time spent so far.
    #[must_use]
    pub fn submission(&self) -> QuizSubmission {
        let answers = self
            .quiz
            .questions()
            .iter()
            .filter_map(|q| {
                self.answer_for(q.id()).map(|choice_id| QuizAnswer {
                    question_id: q.id(),
                    choice_id,
                })
            })
            .collect();
        QuizSubmission {
            quiz_id: self.quiz.id(),
            time_taken_secs: self.countdown.elapsed(),
            answers,
        }
    }

    pub fn record_result(&mut self, result: QuizResult) {
        self.phase = QuizPhase::Results(result);
    }

    /// Start the attempt over: first question, no answers, full time.
    pub fn retake(&mut self, now: DateTime<Utc>) {
        self.current = 0;
        self.answers.clear();
        self.countdown.reset();
        self.phase = QuizPhase::InProgress;
        self.started_at = now;
    }

    #[must_use]
    pub fn checkpoint(&self) -> QuizCheckpoint {
        let answers = self
            .submission()
            .answers
            .into_iter()
            .map(|a| SavedAnswer {
                question_id: a.question_id,
                choice_id: a.choice_id,
            })
            .collect();
        QuizCheckpoint {
            current_index: self.current,
            answers,
            remaining_secs: self.countdown.remaining(),
            started_at: Some(self.started_at),
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            position: self.current + 1,
            total: self.quiz.questions().len(),
            answered: self.answers.len(),
            is_complete: !self.is_in_progress(),
        }
    }

    fn ensure_in_progress(&self) -> Result<(), QuizError> {
        if self.is_in_progress() {
            Ok(())
        } else {
            Err(QuizError::NotInProgress)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{Choice, QuizId};
    use study_core::time::fixed_now;

    fn quiz(limit: u32) -> Quiz {
        let questions = (1..=3)
            .map(|i| {
                Question::new(
                    QuestionId::new(i),
                    format!("Q{i}"),
                    vec![
                        Choice::new(ChoiceId::new(i * 10), "a"),
                        Choice::new(ChoiceId::new(i * 10 + 1), "b"),
                    ],
                )
                .unwrap()
            })
            .collect();
        Quiz::new(QuizId::new(1), "Quiz", limit, questions).unwrap()
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let quiz = Quiz::new(QuizId::new(1), "Empty", 60, Vec::new()).unwrap();
        assert!(matches!(QuizSession::new(quiz, fixed_now()), Err(QuizError::Empty)));
    }

    #[test]
    fn last_selection_wins() {
        let mut s = QuizSession::new(quiz(60), fixed_now()).unwrap();
        s.select(QuestionId::new(1), ChoiceId::new(10)).unwrap();
        s.select(QuestionId::new(1), ChoiceId::new(11)).unwrap();

        let submission = s.submission();
        assert_eq!(submission.answers.len(), 1);
        assert_eq!(submission.answers[0].choice_id, ChoiceId::new(11));
    }

    #[test]
    fn foreign_ids_are_rejected() {
        let mut s = QuizSession::new(quiz(60), fixed_now()).unwrap();
        assert!(matches!(
            s.select(QuestionId::new(9), ChoiceId::new(10)),
            Err(QuizError::UnknownQuestion(_))
        ));
        assert!(matches!(
            s.select(QuestionId::new(1), ChoiceId::new(20)),
            Err(QuizError::UnknownChoice { .. })
        ));
        assert!(matches!(
            s.select_at(2),
            Err(QuizError::ChoiceOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(s.answered_count(), 0);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut s = QuizSession::new(quiz(60), fixed_now()).unwrap();
        assert!(!s.previous().unwrap());
        assert!(s.next().unwrap());
        assert!(s.next().unwrap());
        assert!(!s.next().unwrap());
        assert_eq!(s.current_index(), 2);
        assert_eq!(s.progress().label("Question"), "Question 3 of 3");
    }

    #[test]
    fn select_at_maps_index_to_choice_id() {
        let mut s = QuizSession::new(quiz(60), fixed_now()).unwrap();
        s.next().unwrap();
        assert_eq!(s.select_at(1).unwrap(), ChoiceId::new(21));
        assert_eq!(s.answer_for(QuestionId::new(2)), Some(ChoiceId::new(21)));
    }

    #[test]
    fn submission_skips_unanswered_and_reports_time_taken() {
        let mut s = QuizSession::new(quiz(60), fixed_now()).unwrap();
        s.select(QuestionId::new(3), ChoiceId::new(30)).unwrap();
        s.select(QuestionId::new(1), ChoiceId::new(11)).unwrap();
        for _ in 0..15 {
            s.tick();
        }

        let submission = s.submission();
        assert_eq!(submission.time_taken_secs, 15);
        assert_eq!(s.remaining_secs(), 45);
        assert_eq!(s.clock_label(), "0:45");
        let ids: Vec<_> = submission.answers.iter().map(|a| a.question_id).collect();
        assert_eq!(ids, vec![QuestionId::new(1), QuestionId::new(3)]);
    }

    #[test]
    fn results_freeze_the_attempt_until_retake() {
        let mut s = QuizSession::new(quiz(60), fixed_now()).unwrap();
        s.select_at(0).unwrap();
        s.next().unwrap();
        s.tick();
        s.record_result(QuizResult {
            score: 100.0,
            correct_answers: 1,
            total_questions: 3,
        });

        assert_eq!(s.tick(), TickOutcome::Stopped);
        assert!(matches!(s.select_at(0), Err(QuizError::NotInProgress)));
        assert_eq!(s.result().unwrap().incorrect_answers(), 2);

        s.retake(fixed_now());
        assert!(s.is_in_progress());
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.answered_count(), 0);
        assert_eq!(s.remaining_secs(), 60);
    }

    #[test]
    fn checkpoint_restores_answers_and_time() {
        let mut s = QuizSession::new(quiz(60), fixed_now()).unwrap();
        s.select(QuestionId::new(2), ChoiceId::new(21)).unwrap();
        s.next().unwrap();
        s.tick();
        s.tick();

        let cp = s.checkpoint();
        let resumed = QuizSession::resume(quiz(60), &cp, fixed_now()).unwrap();
        assert_eq!(resumed.current_index(), 1);
        assert_eq!(resumed.remaining_secs(), 58);
        assert_eq!(resumed.answer_for(QuestionId::new(2)), Some(ChoiceId::new(21)));
        assert_eq!(resumed.submission().time_taken_secs, 2);
    }
}
