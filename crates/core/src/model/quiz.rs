use thiserror::Error;

use crate::model::flashcard::Difficulty;
use crate::model::ids::{ChoiceId, QuestionId, QuizId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizModelError {
    #[error("question {0} has no choices")]
    NoChoices(QuestionId),

    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),
}

/// One selectable answer of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: ChoiceId,
    pub text: String,
}

impl Choice {
    #[must_use]
    pub fn new(id: ChoiceId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    choices: Vec<Choice>,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuizModelError::NoChoices` if `choices` is empty.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        choices: Vec<Choice>,
    ) -> Result<Self, QuizModelError> {
        if choices.is_empty() {
            return Err(QuizModelError::NoChoices(id));
        }
        Ok(Self {
            id,
            text: text.into(),
            choices,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Choice at a zero-based position, as shown to the user.
    #[must_use]
    pub fn choice_at(&self, index: usize) -> Option<&Choice> {
        self.choices.get(index)
    }

    #[must_use]
    pub fn has_choice(&self, choice_id: ChoiceId) -> bool {
        self.choices.iter().any(|c| c.id == choice_id)
    }
}

/// A quiz with its ordered questions and time budget in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    time_limit_secs: u32,
    questions: Vec<Question>,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `QuizModelError::DuplicateQuestion` if two questions share an id.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        time_limit_secs: u32,
        questions: Vec<Question>,
    ) -> Result<Self, QuizModelError> {
        for (i, q) in questions.iter().enumerate() {
            if questions[..i].iter().any(|prev| prev.id == q.id) {
                return Err(QuizModelError::DuplicateQuestion(q.id));
            }
        }
        Ok(Self {
            id,
            title: title.into(),
            time_limit_secs,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Listing entry for a quiz, without its questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizInfo {
    pub id: QuizId,
    pub title: String,
    pub time_limit_secs: Option<u32>,
    pub question_count: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub subject: Option<String>,
}

/// One answered question in a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizAnswer {
    pub question_id: QuestionId,
    pub choice_id: ChoiceId,
}

/// Payload sent to the scoring endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSubmission {
    pub quiz_id: QuizId,
    pub time_taken_secs: u32,
    pub answers: Vec<QuizAnswer>,
}

/// Server-side score of a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
}

impl QuizResult {
    #[must_use]
    pub fn incorrect_answers(&self) -> u32 {
        self.total_questions.saturating_sub(self.correct_answers)
    }
}
