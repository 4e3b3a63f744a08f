use sqlx::Row;
use study_core::model::CheckpointKey;
use tracing::warn;

use super::SqliteRepository;
use super::mapping::{map_checkpoint_row, parse_key, ser};
use crate::repository::{CheckpointRecord, CheckpointRepository, StorageError};

#[async_trait::async_trait]
impl CheckpointRepository for SqliteRepository {
    async fn load(&self, key: CheckpointKey) -> Result<Option<CheckpointRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT key, payload, saved_at
                FROM study_checkpoints
                WHERE key = ?1
            ",
        )
        .bind(key.storage_key())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_checkpoint_row).transpose()
    }

    async fn save(&self, record: &CheckpointRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO study_checkpoints (key, payload, saved_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    payload = excluded.payload,
                    saved_at = excluded.saved_at
            ",
        )
        .bind(record.key.storage_key())
        .bind(&record.payload)
        .bind(record.saved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self, key: CheckpointKey) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM study_checkpoints WHERE key = ?1")
            .bind(key.storage_key())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.rows_affected() > 0)
    }

    async fn list_keys(&self) -> Result<Vec<CheckpointKey>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT key
                FROM study_checkpoints
                ORDER BY saved_at DESC, key ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.try_get("key").map_err(ser)?;
            match parse_key(&raw) {
                Ok(key) => out.push(key),
                // Rows written by something other than this client; leave them alone.
                Err(err) => warn!(key = %raw, error = %err, "skipping unrecognized checkpoint key"),
            }
        }
        Ok(out)
    }
}
