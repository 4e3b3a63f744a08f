#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use services::{ApiError, StudyApi};
use study_core::model::{
    CardId, Choice, ChoiceId, Deck, DeckId, Flashcard, Question, QuestionId, Quiz, QuizId,
    QuizInfo, QuizResult, QuizSubmission, RemoteSessionId, SessionSummary,
};

/// Scriptable in-process `StudyApi`.
#[derive(Default)]
pub struct FakeApi {
    pub cards: Mutex<Vec<Flashcard>>,
    pub quiz: Mutex<Option<Quiz>>,
    pub fail_cards: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_end: AtomicBool,
    pub fail_submit: AtomicBool,
    pub started: AtomicU32,
    pub ended: Mutex<Vec<(RemoteSessionId, SessionSummary)>>,
    pub submissions: Mutex<Vec<QuizSubmission>>,
}

impl FakeApi {
    pub fn with_cards(n: u64) -> Self {
        let api = Self::default();
        *api.cards.lock().unwrap() = cards(n);
        api
    }

    pub fn with_quiz(quiz: Quiz) -> Self {
        let api = Self::default();
        *api.quiz.lock().unwrap() = Some(quiz);
        api
    }

    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    pub fn ended(&self) -> Vec<(RemoteSessionId, SessionSummary)> {
        self.ended.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<QuizSubmission> {
        self.submissions.lock().unwrap().clone()
    }
}

fn failure() -> ApiError {
    ApiError::InvalidResponse("scripted failure".into())
}

#[async_trait]
impl StudyApi for FakeApi {
    async fn list_decks(&self) -> Result<Vec<Deck>, ApiError> {
        Ok(vec![Deck::new(DeckId::new(1), "Deck").unwrap()])
    }

    async fn get_cards(&self, _deck_id: DeckId) -> Result<Vec<Flashcard>, ApiError> {
        if self.fail_cards.load(Ordering::SeqCst) {
            return Err(failure());
        }
        Ok(self.cards.lock().unwrap().clone())
    }

    async fn start_session(&self, _deck_id: DeckId) -> Result<RemoteSessionId, ApiError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(failure());
        }
        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RemoteSessionId::new(u64::from(n) + 100))
    }

    async fn end_session(
        &self,
        session_id: RemoteSessionId,
        summary: &SessionSummary,
    ) -> Result<(), ApiError> {
        if self.fail_end.load(Ordering::SeqCst) {
            return Err(failure());
        }
        self.ended.lock().unwrap().push((session_id, *summary));
        Ok(())
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizInfo>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_quiz(&self, _quiz_id: QuizId) -> Result<Quiz, ApiError> {
        self.quiz.lock().unwrap().clone().ok_or_else(failure)
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizResult, ApiError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(failure());
        }
        self.submissions.lock().unwrap().push(submission.clone());
        let correct = u32::try_from(submission.answers.len()).unwrap();
        Ok(QuizResult {
            score: 50.0,
            correct_answers: correct,
            total_questions: 4,
        })
    }
}

pub fn cards(n: u64) -> Vec<Flashcard> {
    (1..=n)
        .map(|i| {
            Flashcard::new(CardId::new(i), format!("front {i}"), format!("back {i}"), None).unwrap()
        })
        .collect()
}

/// Quiz with `n` questions of two choices each: question `i` offers `i*10` and `i*10+1`.
pub fn quiz(id: u64, limit_secs: u32, n: u64) -> Quiz {
    let questions = (1..=n)
        .map(|i| {
            Question::new(
                QuestionId::new(i),
                format!("Question {i}"),
                vec![
                    Choice::new(ChoiceId::new(i * 10), "first"),
                    Choice::new(ChoiceId::new(i * 10 + 1), "second"),
                ],
            )
            .unwrap()
        })
        .collect();
    Quiz::new(QuizId::new(id), "Fake quiz", limit_secs, questions).unwrap()
}
