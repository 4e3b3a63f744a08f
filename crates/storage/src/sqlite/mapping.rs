use chrono::{DateTime, Utc};
use sqlx::Row;
use study_core::model::CheckpointKey;

use crate::repository::{CheckpointRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn parse_key(raw: &str) -> Result<CheckpointKey, StorageError> {
    raw.parse::<CheckpointKey>().map_err(ser)
}

pub(crate) fn map_checkpoint_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<CheckpointRecord, StorageError> {
    let key = parse_key(&row.try_get::<String, _>("key").map_err(ser)?)?;
    let payload: String = row.try_get("payload").map_err(ser)?;
    let saved_at: DateTime<Utc> = row.try_get("saved_at").map_err(ser)?;
    Ok(CheckpointRecord {
        key,
        payload,
        saved_at,
    })
}
