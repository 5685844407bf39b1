//! Key-value storage backends
//!
//! The settlement core only needs atomic batches, point reads and ordered
//! prefix scans. RocksDB backs production deployments; the in-memory map
//! backs tests and the simulator.

use crate::errors::{SlotResult, StorageError};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Ordered set of writes applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreBatch {
    puts: Vec<(Vec<u8>, Vec<u8>)>,
    deletes: Vec<Vec<u8>>,
}

impl StoreBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.puts.push((key.into(), value.into()));
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.deletes.push(key.into());
    }

    pub fn len(&self) -> usize {
        self.puts.len() + self.deletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty()
    }
}

/// Storage used by the slot machine
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> SlotResult<Option<Vec<u8>>>;

    /// Apply every write in the batch atomically
    fn write(&self, batch: StoreBatch) -> SlotResult<()>;

    /// Entries whose key starts with `prefix`, in key order
    fn scan_prefix(&self, prefix: &[u8], limit: usize) -> SlotResult<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// In-memory ordered map
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryStorage {
    fn get(&self, key: &[u8]) -> SlotResult<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::ReadFailed("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, batch: StoreBatch) -> SlotResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::WriteFailed("memory store lock poisoned".to_string()))?;
        for (key, value) in batch.puts {
            entries.insert(key, value);
        }
        for key in batch.deletes {
            entries.remove(&key);
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8], limit: usize) -> SlotResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::ReadFailed("memory store lock poisoned".to_string()))?;
        Ok(entries
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .take(limit)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

/// RocksDB-backed storage tuned for small, frequent batches
#[derive(Clone)]
pub struct OptimizedStorage {
    db: Arc<DB>,
}

impl OptimizedStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> SlotResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(4);
        opts.set_target_file_size_base(64 * 1024 * 1024);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path.as_ref()).map_err(|e| {
            StorageError::DatabaseOpenFailed(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl KvStore for OptimizedStorage {
    fn get(&self, key: &[u8]) -> SlotResult<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| StorageError::ReadFailed(e.to_string()).into())
    }

    fn write(&self, batch: StoreBatch) -> SlotResult<()> {
        let mut write_batch = WriteBatch::default();
        for (key, value) in &batch.puts {
            write_batch.put(key, value);
        }
        for key in &batch.deletes {
            write_batch.delete(key);
        }
        self.db.write(write_batch)?;
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8], limit: usize) -> SlotResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut rows = Vec::new();
        for item in self.db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            if !key.starts_with(prefix) || rows.len() >= limit {
                break;
            }
            rows.push((key.to_vec(), value.to_vec()));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(store: &dyn KvStore) {
        let mut batch = StoreBatch::new();
        batch.put(b"a:1".to_vec(), b"one".to_vec());
        batch.put(b"a:2".to_vec(), b"two".to_vec());
        batch.put(b"b:1".to_vec(), b"other".to_vec());
        assert_eq!(batch.len(), 3);
        store.write(batch).unwrap();

        assert_eq!(store.get(b"a:1").unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.get(b"missing").unwrap(), None);

        let rows = store.scan_prefix(b"a:", 10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, b"a:1".to_vec());
        assert_eq!(store.scan_prefix(b"a:", 1).unwrap().len(), 1);

        let mut batch = StoreBatch::new();
        batch.delete(b"a:1".to_vec());
        store.write(batch).unwrap();
        assert_eq!(store.get(b"a:1").unwrap(), None);
    }

    #[test]
    fn test_memory_storage() {
        let store = MemoryStorage::new();
        exercise(&store);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_rocksdb_storage() {
        let dir = TempDir::new().unwrap();
        let store = OptimizedStorage::new(dir.path()).unwrap();
        exercise(&store);
    }
}
