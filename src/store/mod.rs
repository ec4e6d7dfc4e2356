//! Document store
//!
//! A small document database on top of a [`StorageBackend`]:
//! - Collections of JSON-object documents, addressed by [`DocumentPath`]
//! - Overwrite (`set`), top-level field merge (`update`) and delete
//! - Listing the direct children of a collection
//! - Atomic multi-document write batches, journaled for crash recovery

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::StorageBackend;
use crate::types::Fields;
use crate::{Error, Result};

pub mod journal;
pub mod path;

pub use journal::{BatchOp, Journal, JournalRecord};
pub use path::{CollectionPath, DocumentPath};

pub struct DocumentStore {
    storage: Arc<dyn StorageBackend>,
    journal: Journal,

    /// Serialises mutations within this process
    write_lock: Mutex<()>,
}

impl DocumentStore {
    /// Open a store and roll forward any batch interrupted by a crash
    pub async fn open(storage: Arc<dyn StorageBackend>) -> Result<Self> {
        let store = Self {
            journal: Journal::new(storage.clone()),
            storage,
            write_lock: Mutex::new(()),
        };
        store.recover().await?;
        Ok(store)
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Read a document
    pub async fn get(&self, path: &DocumentPath) -> Result<Option<Fields>> {
        match self.storage.get(&path.key()).await? {
            Some(data) => Ok(Some(decode(path, &data)?)),
            None => Ok(None),
        }
    }

    /// Create or overwrite a document
    pub async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<()> {
        let data = encode(&fields)?;
        let _guard = self.write_lock.lock().await;
        self.storage.put(&path.key(), data).await
    }

    /// Merge top-level fields into an existing document.
    ///
    /// Each given field replaces the stored value of the same name; other
    /// stored fields are kept. Fails with [`Error::DocumentNotFound`] when
    /// the document does not exist.
    pub async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut current = self
            .get(path)
            .await?
            .ok_or_else(|| Error::DocumentNotFound(path.to_string()))?;

        current.extend(fields);
        self.storage.put(&path.key(), encode(&current)?).await
    }

    /// Delete a document. Deleting a missing document succeeds.
    ///
    /// Sub-collections under the document are left in place.
    pub async fn delete(&self, path: &DocumentPath) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.storage.delete(&path.key()).await
    }

    /// Ids of the documents directly inside a collection, sorted
    pub async fn list_ids(&self, collection: &CollectionPath) -> Result<Vec<String>> {
        let keys = self.storage.list(&collection.prefix()).await?;
        let mut ids: Vec<String> = keys
            .iter()
            .filter_map(|key| collection.child_id(key))
            .map(str::to_string)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Documents directly inside a collection with their ids, sorted by id
    pub async fn list(&self, collection: &CollectionPath) -> Result<Vec<(String, Fields)>> {
        let mut documents = Vec::new();
        for id in self.list_ids(collection).await? {
            let path = collection.doc(&id)?;
            // deleted between listing and reading
            if let Some(fields) = self.get(&path).await? {
                documents.push((id, fields));
            }
        }
        Ok(documents)
    }

    pub fn batch(&self) -> WriteBatch {
        WriteBatch::default()
    }

    /// Apply every write in `batch`, or none of them.
    ///
    /// The batch is journaled before any write is applied. If applying fails
    /// part way, the journal record stays behind and the remaining writes
    /// are applied by the next [`DocumentStore::recover`].
    pub async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.ops.is_empty() {
            return Ok(());
        }

        let record = JournalRecord::new(batch.ops);
        let _guard = self.write_lock.lock().await;

        let key = self.journal.append(&record).await?;
        journal::apply(self.storage.as_ref(), &record.ops).await?;
        self.journal.remove(&key).await?;

        tracing::debug!(batch_id = %record.id, ops = record.ops.len(), "Committed write batch");
        Ok(())
    }

    /// Replay journaled batches that were not fully applied.
    ///
    /// Returns the number of batches replayed. Records that fail their
    /// checksum are logged and discarded.
    pub async fn recover(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let pending = self.journal.pending().await?;
        if pending.is_empty() {
            return Ok(0);
        }

        tracing::info!(records = pending.len(), "Replaying interrupted write batches");

        let mut replayed = 0;
        for key in pending {
            match self.journal.read(&key).await {
                Ok(record) => {
                    journal::apply(self.storage.as_ref(), &record.ops).await?;
                    replayed += 1;
                }
                Err(Error::Journal(msg)) => {
                    tracing::error!(%key, error = %msg, "Discarding unreadable journal record");
                }
                Err(e) => return Err(e),
            }
            self.journal.remove(&key).await?;
        }

        tracing::info!(replayed, "Write batch recovery complete");
        Ok(replayed)
    }
}

/// Writes to be committed together by [`DocumentStore::commit`]
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Create or overwrite a document
    pub fn set(&mut self, path: &DocumentPath, fields: &Fields) -> Result<&mut Self> {
        self.ops.push(BatchOp::Put {
            key: path.key(),
            data: encode(fields)?.to_vec(),
        });
        Ok(self)
    }

    pub fn delete(&mut self, path: &DocumentPath) -> &mut Self {
        self.ops.push(BatchOp::Delete { key: path.key() });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

fn encode(fields: &Fields) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(fields)?))
}

fn decode(path: &DocumentPath, data: &[u8]) -> Result<Fields> {
    serde_json::from_slice(data)
        .map_err(|e| Error::storage(format!("Document {} is not a JSON object: {}", path, e)))
}
