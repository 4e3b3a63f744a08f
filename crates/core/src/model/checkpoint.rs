//! Locally persisted snapshots of in-progress study sessions.
//!
//! A checkpoint is keyed by the entity being studied; there is at most one
//! per key. Payloads are JSON and tolerate missing fields, so a partially
//! written record still loads with defaults. Whether a loaded record still
//! fits the freshly fetched items is decided by `validate_against`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ChoiceId, DeckId, QuestionId, QuizId};
use crate::model::progress::StudyStats;
use crate::model::quiz::Quiz;

const FLASHCARD_PREFIX: &str = "flashcard_session_";
const QUIZ_PREFIX: &str = "quiz_session_";

//
// ─── KEYS ──────────────────────────────────────────────────────────────────────
//

/// Storage key of a checkpoint, one per studied entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckpointKey {
    Flashcards(DeckId),
    Quiz(QuizId),
}

impl CheckpointKey {
    /// The string form used by storage backends.
    #[must_use]
    pub fn storage_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flashcards(id) => write!(f, "{FLASHCARD_PREFIX}{id}"),
            Self::Quiz(id) => write!(f, "{QUIZ_PREFIX}{id}"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid checkpoint key: {0}")]
pub struct ParseCheckpointKeyError(String);

impl FromStr for CheckpointKey {
    type Err = ParseCheckpointKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCheckpointKeyError(s.to_owned());
        if let Some(rest) = s.strip_prefix(FLASHCARD_PREFIX) {
            return rest.parse().map(Self::Flashcards).map_err(|_| err());
        }
        if let Some(rest) = s.strip_prefix(QUIZ_PREFIX) {
            return rest.parse().map(Self::Quiz).map_err(|_| err());
        }
        Err(err())
    }
}

//
// ─── VALIDATION ────────────────────────────────────────────────────────────────
//

/// Why a stored checkpoint no longer fits the session it would resume.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CheckpointMismatch {
    #[error("saved index {index} is outside {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("saved counters ({judged}) exceed {len} items")]
    CountsExceedItems { judged: u32, len: usize },

    #[error("saved remaining time {remaining}s exceeds the {limit}s limit")]
    RemainingExceedsLimit { remaining: u32, limit: u32 },

    #[error("saved answer references unknown question {0}")]
    UnknownQuestion(QuestionId),

    #[error("saved answer references choice {choice} not offered by question {question}")]
    UnknownChoice {
        question: QuestionId,
        choice: ChoiceId,
    },
}

//
// ─── FLASHCARDS ────────────────────────────────────────────────────────────────
//

/// Progress of a flashcard session. Field names match the legacy web client
/// so records written by it load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardCheckpoint {
    #[serde(rename = "currentCardIndex", default)]
    pub current_index: usize,
    #[serde(rename = "studyStats", default)]
    pub stats: StudyStats,
    #[serde(rename = "startTime", default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl FlashcardCheckpoint {
    #[must_use]
    pub fn new(current_index: usize, stats: StudyStats, started_at: DateTime<Utc>) -> Self {
        Self {
            current_index,
            stats,
            started_at: Some(started_at),
        }
    }

    /// Check the checkpoint against a deck of `len` cards.
    ///
    /// # Errors
    ///
    /// Returns `CheckpointMismatch` when the index or counters cannot belong to the deck.
    pub fn validate_against(&self, len: usize) -> Result<(), CheckpointMismatch> {
        if self.current_index >= len {
            return Err(CheckpointMismatch::IndexOutOfRange {
                index: self.current_index,
                len,
            });
        }
        let judged = self.stats.judged();
        if usize::try_from(judged).map_or(true, |j| j > len) {
            return Err(CheckpointMismatch::CountsExceedItems { judged, len });
        }
        Ok(())
    }
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAnswer {
    pub question_id: QuestionId,
    pub choice_id: ChoiceId,
}

/// Progress of a quiz attempt: position, answers so far and time left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizCheckpoint {
    #[serde(default)]
    pub current_index: usize,
    #[serde(default)]
    pub answers: Vec<SavedAnswer>,
    pub remaining_secs: u32,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl QuizCheckpoint {
    /// Check the checkpoint against the quiz as it is now served.
    ///
    /// # Errors
    ///
    /// Returns `CheckpointMismatch` when position, time or answers no longer fit.
    pub fn validate_against(&self, quiz: &Quiz) -> Result<(), CheckpointMismatch> {
        let len = quiz.questions().len();
        if self.current_index >= len {
            return Err(CheckpointMismatch::IndexOutOfRange {
                index: self.current_index,
                len,
            });
        }
        if self.remaining_secs > quiz.time_limit_secs() {
            return Err(CheckpointMismatch::RemainingExceedsLimit {
                remaining: self.remaining_secs,
                limit: quiz.time_limit_secs(),
            });
        }
        for answer in &self.answers {
            let question = quiz
                .question(answer.question_id)
                .ok_or(CheckpointMismatch::UnknownQuestion(answer.question_id))?;
            if !question.has_choice(answer.choice_id) {
                return Err(CheckpointMismatch::UnknownChoice {
                    question: answer.question_id,
                    choice: answer.choice_id,
                });
            }
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::quiz::{Choice, Question};
    use crate::time::fixed_now;

    #[test]
    fn keys_round_trip_through_strings() {
        let key = CheckpointKey::Flashcards(DeckId::new(7));
        assert_eq!(key.storage_key(), "flashcard_session_7");
        assert_eq!("flashcard_session_7".parse::<CheckpointKey>().unwrap(), key);

        let key = CheckpointKey::Quiz(QuizId::new(3));
        assert_eq!(key.storage_key(), "quiz_session_3");
        assert_eq!("quiz_session_3".parse::<CheckpointKey>().unwrap(), key);

        assert!("session_3".parse::<CheckpointKey>().is_err());
        assert!("quiz_session_x".parse::<CheckpointKey>().is_err());
    }

    #[test]
    fn flashcard_checkpoint_reads_legacy_layout() {
        let raw = r#"{
            "currentCardIndex": 2,
            "studyStats": {"correct": 1, "incorrect": 1, "total": 4},
            "startTime": "2023-11-14T22:13:20.000Z"
        }"#;
        let cp: FlashcardCheckpoint = serde_json::from_str(raw).unwrap();
        assert_eq!(cp.current_index, 2);
        assert_eq!(cp.stats.correct, 1);
        assert_eq!(cp.started_at, Some(fixed_now()));
    }

    #[test]
    fn flashcard_checkpoint_defaults_missing_fields() {
        let cp: FlashcardCheckpoint = serde_json::from_str("{}").unwrap();
        assert_eq!(cp.current_index, 0);
        assert_eq!(cp.stats, StudyStats::default());
        assert_eq!(cp.started_at, None);
    }

    #[test]
    fn flashcard_checkpoint_out_of_range_is_rejected() {
        let cp = FlashcardCheckpoint::new(3, StudyStats::default(), fixed_now());
        assert_eq!(
            cp.validate_against(3),
            Err(CheckpointMismatch::IndexOutOfRange { index: 3, len: 3 })
        );
        assert!(cp.validate_against(4).is_ok());

        let stats = StudyStats {
            correct: 2,
            incorrect: 2,
            total: 5,
        };
        let cp = FlashcardCheckpoint::new(0, stats, fixed_now());
        assert_eq!(
            cp.validate_against(3),
            Err(CheckpointMismatch::CountsExceedItems { judged: 4, len: 3 })
        );
    }

    fn quiz() -> Quiz {
        let q = Question::new(
            QuestionId::new(1),
            "Q1",
            vec![Choice::new(ChoiceId::new(10), "a"), Choice::new(ChoiceId::new(11), "b")],
        )
        .unwrap();
        Quiz::new(QuizId::new(1), "Quiz", 60, vec![q]).unwrap()
    }

    #[test]
    fn quiz_checkpoint_validates_answers_and_time() {
        let quiz = quiz();
        let mut cp = QuizCheckpoint {
            current_index: 0,
            answers: vec![SavedAnswer {
                question_id: QuestionId::new(1),
                choice_id: ChoiceId::new(11),
            }],
            remaining_secs: 40,
            started_at: Some(fixed_now()),
        };
        assert!(cp.validate_against(&quiz).is_ok());

        cp.remaining_secs = 61;
        assert!(matches!(
            cp.validate_against(&quiz),
            Err(CheckpointMismatch::RemainingExceedsLimit { .. })
        ));

        cp.remaining_secs = 10;
        cp.answers[0].choice_id = ChoiceId::new(99);
        assert!(matches!(
            cp.validate_against(&quiz),
            Err(CheckpointMismatch::UnknownChoice { .. })
        ));

        cp.answers[0].question_id = QuestionId::new(5);
        assert_eq!(
            cp.validate_against(&quiz),
            Err(CheckpointMismatch::UnknownQuestion(QuestionId::new(5)))
        );
    }
}
