//! Write-batch journal
//!
//! A batch is recorded as a single journal object before any of its writes
//! are applied, and the object is removed once they all succeed. Records that
//! survive a crash are replayed on the next open. Every operation is an
//! idempotent overwrite or delete, so replaying a partially applied batch is
//! safe.
//!
//! Record layout: MessagePack-encoded [`JournalRecord`] followed by a
//! little-endian CRC32 of the encoded bytes.
//! Keys: `_journal/{timestamp_millis}_{uuid}.log`

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::storage::StorageBackend;
use crate::{Error, Result};

const JOURNAL_PREFIX: &str = "_journal/";

/// One storage-level write inside a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BatchOp {
    /// Overwrite `key` with an encoded document
    Put { key: String, data: Vec<u8> },
    /// Remove `key`
    Delete { key: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub ops: Vec<BatchOp>,
}

impl JournalRecord {
    pub fn new(ops: Vec<BatchOp>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            ops,
        }
    }
}

pub struct Journal {
    storage: Arc<dyn StorageBackend>,
}

impl Journal {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    fn record_key(record: &JournalRecord) -> String {
        format!(
            "{}{:020}_{}.log",
            JOURNAL_PREFIX,
            record.created_at.timestamp_millis(),
            record.id.simple()
        )
    }

    /// Persist a record; returns its key
    pub async fn append(&self, record: &JournalRecord) -> Result<String> {
        let mut buf = rmp_serde::to_vec(record)
            .map_err(|e| Error::journal(format!("Failed to serialize batch: {}", e)))?;

        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());

        let key = Self::record_key(record);
        tracing::debug!(%key, ops = record.ops.len(), bytes = buf.len(), "Writing journal record");

        self.storage.put(&key, Bytes::from(buf)).await?;
        Ok(key)
    }

    /// Keys of records still waiting to be applied, oldest first
    pub async fn pending(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .storage
            .list(JOURNAL_PREFIX)
            .await?
            .into_iter()
            .filter(|k| k.ends_with(".log"))
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Read and verify a single record
    pub async fn read(&self, key: &str) -> Result<JournalRecord> {
        let data = self
            .storage
            .get(key)
            .await?
            .ok_or_else(|| Error::journal(format!("Journal record {} vanished", key)))?;

        if data.len() < 4 {
            return Err(Error::journal(format!(
                "Journal record {} too short ({} bytes)",
                key,
                data.len()
            )));
        }

        let (payload, crc_bytes) = data.split_at(data.len() - 4);
        let stored_crc = u32::from_le_bytes(
            crc_bytes
                .try_into()
                .map_err(|_| Error::journal("Invalid CRC bytes"))?,
        );
        let computed_crc = crc32fast::hash(payload);
        if stored_crc != computed_crc {
            return Err(Error::journal(format!(
                "Journal record {} corrupted (CRC mismatch: expected {}, got {})",
                key, stored_crc, computed_crc
            )));
        }

        rmp_serde::from_slice(payload).map_err(|e| {
            Error::journal(format!("Failed to deserialize journal record {}: {}", key, e))
        })
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.storage.delete(key).await
    }
}

/// Apply operations in order
pub(crate) async fn apply(storage: &dyn StorageBackend, ops: &[BatchOp]) -> Result<()> {
    for op in ops {
        match op {
            BatchOp::Put { key, data } => storage.put(key, Bytes::from(data.clone())).await?,
            BatchOp::Delete { key } => storage.delete(key).await?,
        }
    }
    Ok(())
}
