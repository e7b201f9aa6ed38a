//! Sled-based storage for summary results.

use crate::summary::{HistoricalRecord, ProcessingMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    DbError(#[from] sled::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("storage task failed: {0}")]
    Task(String),
}

/// What actually gets written: texts and classification, no metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredResult {
    id: u64,
    original_text: String,
    summary: String,
    classification: String,
    created_at: DateTime<Utc>,
}

impl From<StoredResult> for HistoricalRecord {
    fn from(stored: StoredResult) -> Self {
        // Elapsed time was never persisted
        let metadata = ProcessingMetadata::compute(&stored.original_text, &stored.summary, 0.0);
        Self {
            id: stored.id,
            original_text: stored.original_text,
            summary: stored.summary,
            classification: stored.classification,
            metadata,
            created_at: stored.created_at,
        }
    }
}

/// Sled-based storage for summary history.
///
/// Records are keyed by a monotonic id in big-endian form, so key order is
/// insertion order.
#[derive(Clone)]
pub struct Storage {
    db: sled::Db,
}

impl Storage {
    /// Open or create storage at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Persist an accepted summary, returning its id and creation time
    pub fn save(
        &self,
        original_text: &str,
        summary: &str,
        classification: &str,
    ) -> Result<(u64, DateTime<Utc>), StorageError> {
        let id = self.db.generate_id()?;
        let stored = StoredResult {
            id,
            original_text: original_text.to_string(),
            summary: summary.to_string(),
            classification: classification.to_string(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_vec(&stored)?;
        self.db.insert(id.to_be_bytes(), value)?;
        self.db.flush()?;
        Ok((id, stored.created_at))
    }

    /// List stored records, newest first
    pub fn list(&self, limit: usize, offset: usize) -> Result<Vec<HistoricalRecord>, StorageError> {
        let mut results = Vec::with_capacity(limit.min(self.count()));
        for item in self.db.iter().rev().skip(offset).take(limit) {
            let (_key, value) = item?;
            let stored: StoredResult = serde_json::from_slice(&value)?;
            results.push(stored.into());
        }
        Ok(results)
    }

    /// Get the number of stored records
    pub fn count(&self) -> usize {
        self.db.len()
    }
}
