use std::fmt;

use thiserror::Error;

use crate::model::ids::{CardId, DeckId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlashcardError {
    #[error("flashcard front cannot be empty")]
    EmptyFront,

    #[error("flashcard back cannot be empty")]
    EmptyBack,

    #[error("deck title cannot be empty")]
    EmptyTitle,
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty label attached to decks and quizzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    /// Any label the server sends that this client does not know.
    Other(String),
}

impl Difficulty {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Self::Easy,
            "medium" => Self::Medium,
            "hard" => Self::Hard,
            _ => Self::Other(raw.trim().to_owned()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── DECK ──────────────────────────────────────────────────────────────────────
//

/// A named collection of flashcards with shared metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    id: DeckId,
    title: String,
    description: Option<String>,
    subject: Option<String>,
    difficulty: Option<Difficulty>,
    card_count: Option<u32>,
}

impl Deck {
    /// # Errors
    ///
    /// Returns `FlashcardError::EmptyTitle` if the title is blank.
    pub fn new(id: DeckId, title: impl Into<String>) -> Result<Self, FlashcardError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(FlashcardError::EmptyTitle);
        }
        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description: None,
            subject: None,
            difficulty: None,
            card_count: None,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = non_blank(description);
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = non_blank(subject);
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Option<Difficulty>) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn with_card_count(mut self, card_count: Option<u32>) -> Self {
        self.card_count = card_count;
        self
    }

    #[must_use]
    pub fn id(&self) -> DeckId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<&Difficulty> {
        self.difficulty.as_ref()
    }

    #[must_use]
    pub fn card_count(&self) -> Option<u32> {
        self.card_count
    }
}

//
// ─── FLASHCARD ─────────────────────────────────────────────────────────────────
//

/// A single two-sided card, immutable for the duration of a study session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    id: CardId,
    front: String,
    back: String,
    hint: Option<String>,
}

impl Flashcard {
    /// Build a card, trimming a blank hint away.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardError::EmptyFront` / `EmptyBack` when a face is blank.
    pub fn new(
        id: CardId,
        front: impl Into<String>,
        back: impl Into<String>,
        hint: Option<String>,
    ) -> Result<Self, FlashcardError> {
        let front = front.into();
        let back = back.into();
        if front.trim().is_empty() {
            return Err(FlashcardError::EmptyFront);
        }
        if back.trim().is_empty() {
            return Err(FlashcardError::EmptyBack);
        }
        Ok(Self {
            id,
            front,
            back,
            hint: non_blank(hint),
        })
    }

    #[must_use]
    pub fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub fn front(&self) -> &str {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> &str {
        &self.back
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
