//! Durable storage for rendered invoices.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

/// Keyed file storage for invoice documents.
#[async_trait]
pub trait InvoiceStorage: Send + Sync {
    /// Writes `bytes` under `key`, replacing any previous file.
    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Returns true if a file exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Reads the file under `key`, or `None` if there is none.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// Stores invoices as files in a local directory.
#[derive(Debug, Clone)]
pub struct FsInvoiceStorage {
    root: PathBuf,
}

impl FsInvoiceStorage {
    /// Creates a storage rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl InvoiceStorage for FsInvoiceStorage {
    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path(key), bytes).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path(key)).await?)
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory invoice storage for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvoiceStorage {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    writes: Arc<RwLock<Vec<String>>>,
    fail_on_write: Arc<AtomicBool>,
}

impl InMemoryInvoiceStorage {
    /// Creates a new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every subsequent write to fail.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.fail_on_write.store(fail, Ordering::SeqCst);
    }

    /// Returns the keys written so far, in order, including overwrites.
    pub async fn write_log(&self) -> Vec<String> {
        self.writes.read().await.clone()
    }

    /// Returns the number of stored files.
    pub async fn file_count(&self) -> usize {
        self.files.read().await.len()
    }
}

#[async_trait]
impl InvoiceStorage for InMemoryInvoiceStorage {
    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        if self.fail_on_write.load(Ordering::SeqCst) {
            return Err(std::io::Error::other(format!("write to {key} refused")).into());
        }
        self.files.write().await.insert(key.to_string(), bytes);
        self.writes.write().await.push(key.to_string());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.files.read().await.contains_key(key))
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.files.read().await.get(key).cloned())
    }
}
