//! Wire shapes of the REST API and their mapping onto domain types.

use serde::{Deserialize, Serialize};
use tracing::warn;

use study_core::model::{
    CardId, Choice, ChoiceId, Deck, DeckId, Difficulty, Flashcard, Question, QuestionId, Quiz,
    QuizId, QuizInfo, QuizResult, QuizSubmission, RemoteSessionId, SessionSummary, UserProfile,
};

use crate::error::ApiError;

/// Used when a quiz arrives without a time limit.
pub(crate) const DEFAULT_TIME_LIMIT_SECS: u32 = 1800;

/// List endpoints answer either a paginated envelope or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Paginated { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            Self::Paginated { results } => results,
            Self::Bare(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SubjectDto {
    Named { name: String },
    Plain(String),
}

impl SubjectDto {
    fn into_name(self) -> String {
        match self {
            Self::Named { name } | Self::Plain(name) => name,
        }
    }
}

//
// ─── AUTH ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct LoginDto<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenPairDto {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Login answers either `{access, refresh}` or `{user, tokens: {access, refresh}}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LoginResponse {
    Nested { tokens: TokenPairDto },
    Flat(TokenPairDto),
}

impl LoginResponse {
    pub(crate) fn into_pair(self) -> TokenPairDto {
        match self {
            Self::Nested { tokens } | Self::Flat(tokens) => tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileDto {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl From<ProfileDto> for UserProfile {
    fn from(dto: ProfileDto) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            id: dto.id,
            username: dto.username,
            email: non_blank(dto.email),
            first_name: non_blank(dto.first_name),
            last_name: non_blank(dto.last_name),
        }
    }
}

//
// ─── FLASHCARDS ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct DeckDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subject: Option<SubjectDto>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub flashcard_count: Option<u32>,
}

impl DeckDto {
    pub(crate) fn into_domain(self) -> Option<Deck> {
        let deck = match Deck::new(DeckId::new(self.id), self.title) {
            Ok(deck) => deck,
            Err(err) => {
                warn!(deck_id = self.id, error = %err, "skipping deck");
                return None;
            }
        };
        Some(
            deck.with_description(self.description)
                .with_subject(self.subject.map(SubjectDto::into_name))
                .with_difficulty(self.difficulty.as_deref().map(Difficulty::parse))
                .with_card_count(self.flashcard_count),
        )
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CardDto {
    pub id: u64,
    pub front_text: String,
    pub back_text: String,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Shown in place of a card face the server sent blank.
pub(crate) const BLANK_FACE: &str = "(blank)";

impl CardDto {
    /// Blank faces are replaced by a placeholder so the deck keeps every card
    /// the server lists.
    pub(crate) fn into_domain(self) -> Option<Flashcard> {
        let id = self.id;
        let face = |text: String, side: &str| {
            if text.trim().is_empty() {
                warn!(card_id = id, side, "card face is blank");
                BLANK_FACE.to_string()
            } else {
                text
            }
        };
        let front = face(self.front_text, "front");
        let back = face(self.back_text, "back");
        match Flashcard::new(CardId::new(id), front, back, self.hint) {
            Ok(card) => Some(card),
            Err(err) => {
                warn!(card_id = id, error = %err, "skipping flashcard");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionStartDto {
    pub id: u64,
}

impl SessionStartDto {
    pub(crate) fn into_domain(self) -> RemoteSessionId {
        RemoteSessionId::new(self.id)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionEndDto {
    pub cards_studied: u32,
    pub cards_mastered: u32,
    pub session_duration: u64,
}

impl From<&SessionSummary> for SessionEndDto {
    fn from(summary: &SessionSummary) -> Self {
        Self {
            cards_studied: summary.cards_studied(),
            cards_mastered: summary.cards_mastered(),
            session_duration: summary.duration_secs(),
        }
    }
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct QuizInfoDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub total_questions: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub subject: Option<SubjectDto>,
}

impl From<QuizInfoDto> for QuizInfo {
    fn from(dto: QuizInfoDto) -> Self {
        Self {
            id: QuizId::new(dto.id),
            title: dto.title,
            time_limit_secs: dto.time_limit,
            question_count: dto.total_questions,
            difficulty: dto.difficulty.as_deref().map(Difficulty::parse),
            subject: dto.subject.map(SubjectDto::into_name),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceDto {
    pub id: u64,
    pub choice_text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionDto {
    pub id: u64,
    pub question_text: String,
    #[serde(default)]
    pub choices: Vec<ChoiceDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub questions: Vec<QuestionDto>,
}

impl QuizDto {
    pub(crate) fn into_domain(self) -> Result<Quiz, ApiError> {
        let questions = self
            .questions
            .into_iter()
            .filter_map(|q| {
                let choices = q
                    .choices
                    .into_iter()
                    .map(|c| Choice::new(ChoiceId::new(c.id), c.choice_text))
                    .collect();
                match Question::new(QuestionId::new(q.id), q.question_text, choices) {
                    Ok(question) => Some(question),
                    Err(err) => {
                        warn!(question_id = q.id, error = %err, "skipping question");
                        None
                    }
                }
            })
            .collect();
        Quiz::new(
            QuizId::new(self.id),
            self.title,
            self.time_limit.unwrap_or(DEFAULT_TIME_LIMIT_SECS),
            questions,
        )
        .map_err(|e| ApiError::Domain(e.into()))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerDto {
    pub question_id: u64,
    pub choice_id: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitDto {
    pub quiz_id: u64,
    pub time_taken: u32,
    pub answers: Vec<AnswerDto>,
}

impl From<&QuizSubmission> for SubmitDto {
    fn from(submission: &QuizSubmission) -> Self {
        Self {
            quiz_id: submission.quiz_id.value(),
            time_taken: submission.time_taken_secs,
            answers: submission
                .answers
                .iter()
                .map(|a| AnswerDto {
                    question_id: a.question_id.value(),
                    choice_id: a.choice_id.value(),
                })
                .collect(),
        }
    }
}

/// Scores come back as numbers or as decimal strings depending on the serializer.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ScoreDto {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultDto {
    pub score: ScoreDto,
    pub correct_answers: u32,
    pub total_questions: u32,
}

impl ResultDto {
    pub(crate) fn into_domain(self) -> Result<QuizResult, ApiError> {
        let score = match self.score {
            ScoreDto::Number(n) => n,
            ScoreDto::Text(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ApiError::InvalidResponse(format!("score {raw:?} is not a number")))?,
        };
        Ok(QuizResult {
            score,
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
        })
    }
}
