//! Storage abstraction layer
//!
//! Provides a unified key/object interface over S3, the local filesystem
//! and process memory. The document store is built on top of it.

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

pub mod local;
pub mod memory;
pub mod s3;

/// Storage backend trait
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read object from storage, `None` if the key does not exist
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Write object to storage, replacing any previous value
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Delete object from storage. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if object exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// List every key under `prefix`, at any depth
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
        prefix: Option<String>,
    },
    Local {
        root_path: String,
    },
    Memory,
}

/// Create storage backend from config
pub async fn create_storage(config: StorageConfig) -> Result<Box<dyn StorageBackend>> {
    match config {
        StorageConfig::S3 {
            bucket,
            region,
            endpoint,
            prefix,
        } => {
            let backend = s3::S3Storage::new(bucket, region, endpoint, prefix).await?;
            Ok(Box::new(backend))
        }
        StorageConfig::Local { root_path } => {
            let backend = local::LocalStorage::new(root_path)?;
            Ok(Box::new(backend))
        }
        StorageConfig::Memory => Ok(Box::new(memory::MemoryStorage::new())),
    }
}
