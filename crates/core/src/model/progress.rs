use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,
}

/// The learner's self-assessment of a revealed card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgment {
    Correct,
    Incorrect,
}

/// Running counters of a flashcard session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyStats {
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub incorrect: u32,
    #[serde(default)]
    pub total: u32,
}

impl StudyStats {
    #[must_use]
    pub fn new(total: u32) -> Self {
        Self {
            correct: 0,
            incorrect: 0,
            total,
        }
    }

    pub fn record(&mut self, judgment: Judgment) {
        match judgment {
            Judgment::Correct => self.correct = self.correct.saturating_add(1),
            Judgment::Incorrect => self.incorrect = self.incorrect.saturating_add(1),
        }
    }

    /// Number of cards judged so far.
    #[must_use]
    pub fn judged(&self) -> u32 {
        self.correct.saturating_add(self.incorrect)
    }

    #[must_use]
    pub fn has_progress(&self) -> bool {
        self.judged() > 0
    }
}

/// Statistics posted to the remote session-close endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    cards_studied: u32,
    cards_mastered: u32,
    duration_secs: u64,
}

impl SessionSummary {
    /// Build the summary of a finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    pub fn from_stats(
        stats: &StudyStats,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        Ok(Self::saturating(stats, started_at, completed_at))
    }

    /// Like `from_stats`, but a reversed range yields a zero duration.
    #[must_use]
    pub fn saturating(
        stats: &StudyStats,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let duration_secs = u64::try_from((completed_at - started_at).num_seconds()).unwrap_or(0);
        Self {
            cards_studied: stats.judged(),
            cards_mastered: stats.correct,
            duration_secs,
        }
    }

    #[must_use]
    pub fn cards_studied(&self) -> u32 {
        self.cards_studied
    }

    #[must_use]
    pub fn cards_mastered(&self) -> u32 {
        self.cards_mastered
    }

    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }
}

/// Message shown when a flashcard session completes.
#[must_use]
pub fn completion_message(stats: &StudyStats) -> String {
    format!(
        "Study session complete! {}/{} correct",
        stats.correct, stats.total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn record_counts_each_judgment() {
        let mut stats = StudyStats::new(2);
        stats.record(Judgment::Correct);
        stats.record(Judgment::Incorrect);
        assert_eq!(stats.correct, 1);
        assert_eq!(stats.incorrect, 1);
        assert_eq!(stats.judged(), 2);
        assert_eq!(completion_message(&stats), "Study session complete! 1/2 correct");
    }

    #[test]
    fn summary_uses_whole_seconds() {
        let start = fixed_now();
        let end = start + Duration::milliseconds(90_900);
        let stats = StudyStats {
            correct: 3,
            incorrect: 1,
            total: 5,
        };
        let summary = SessionSummary::from_stats(&stats, start, end).unwrap();
        assert_eq!(summary.cards_studied(), 4);
        assert_eq!(summary.cards_mastered(), 3);
        assert_eq!(summary.duration_secs(), 90);
    }

    #[test]
    fn summary_rejects_reversed_range() {
        let start = fixed_now();
        let err = SessionSummary::from_stats(&StudyStats::new(1), start, start - Duration::seconds(1))
            .unwrap_err();
        assert_eq!(err, SessionSummaryError::InvalidTimeRange);
    }

    #[test]
    fn saturating_summary_clamps_reversed_range() {
        let start = fixed_now();
        let stats = StudyStats {
            correct: 1,
            incorrect: 0,
            total: 1,
        };
        let summary = SessionSummary::saturating(&stats, start, start - Duration::minutes(5));
        assert_eq!(summary.duration_secs(), 0);
        assert_eq!(summary.cards_studied(), 1);
    }

    #[test]
    fn stats_deserialize_with_missing_fields() {
        let stats: StudyStats = serde_json::from_str(r#"{"correct":2}"#).unwrap();
        assert_eq!(stats, StudyStats { correct: 2, incorrect: 0, total: 0 });
    }
}
