//! In-memory storage double for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::Storage;
use crate::JwtResult;
use crate::error::JwtError;

/// Record kept by [`RecordingStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    pub value: String,
    /// `None` for records written with `forever`.
    pub ttl_minutes: Option<u64>,
}

/// Map storage that counts writes. Expiry is recorded, not enforced.
#[derive(Debug, Default)]
pub(crate) struct RecordingStorage {
    records: DashMap<String, Record>,
    writes: AtomicUsize,
    failing: bool,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn record(&self, key: &str) -> Option<Record> {
        self.records.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    fn check(&self) -> JwtResult<()> {
        if self.failing {
            return Err(JwtError::storage("backend unavailable"));
        }
        Ok(())
    }

    fn put(&self, key: &str, value: &str, ttl_minutes: Option<u64>) -> JwtResult<bool> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records.insert(
            key.to_string(),
            Record {
                value: value.to_string(),
                ttl_minutes,
            },
        );
        Ok(true)
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn add(&self, key: &str, value: &str, ttl_minutes: u64) -> JwtResult<bool> {
        self.put(key, value, Some(ttl_minutes))
    }

    async fn forever(&self, key: &str, value: &str) -> JwtResult<bool> {
        self.put(key, value, None)
    }

    async fn get(&self, key: &str) -> JwtResult<Option<String>> {
        self.check()?;
        Ok(self.record(key).map(|record| record.value))
    }

    async fn destroy(&self, key: &str) -> JwtResult<bool> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.remove(key).is_some())
    }

    async fn flush(&self) -> JwtResult<()> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_concurrent_writes_are_all_recorded() {
        let storage = Arc::new(RecordingStorage::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let storage = Arc::clone(&storage);
                tokio::spawn(async move { storage.add(&format!("jti-{i}"), "1", 5).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        assert_eq!(storage.len(), 32);
        assert_eq!(storage.writes(), 32);
        assert_eq!(
            storage.record("jti-7"),
            Some(Record {
                value: "1".to_string(),
                ttl_minutes: Some(5),
            })
        );

        assert!(storage.destroy("jti-7").await.unwrap());
        assert!(storage.get("jti-7").await.unwrap().is_none());
        storage.flush().await.unwrap();
        assert_eq!(storage.len(), 0);
    }

    #[tokio::test]
    async fn test_failing_store_rejects_everything() {
        let storage = RecordingStorage::failing();
        assert!(storage.add("jti", "1", 5).await.is_err());
        assert!(storage.get("jti").await.is_err());
        assert_eq!(storage.writes(), 0);
    }
}
