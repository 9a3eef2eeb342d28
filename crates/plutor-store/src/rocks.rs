//! RocksDB storage backend.

use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;

use crate::backend::{BatchOp, KvBackend, ALL_COLUMN_FAMILIES};
use crate::error::StoreError;

/// RocksDB-backed storage with one column family per table and index.
pub struct RocksBackend {
    db: DB,
}

impl RocksBackend {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)
            .map_err(|e| StoreError::Backend(format!("create {}: {}", path.display(), e)))?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = ALL_COLUMN_FAMILIES
            .iter()
            .map(|cf| ColumnFamilyDescriptor::new(*cf, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;
        tracing::info!(path = %path.display(), "opened rocksdb identity store");

        Ok(Self { db })
    }

    fn cf(&self, cf_name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(cf_name)
            .ok_or_else(|| StoreError::Backend(format!("column family '{}' not found", cf_name)))
    }
}

impl KvBackend for RocksBackend {
    fn get(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let handle = self.cf(cf)?;
        Ok(self.db.get_cf(handle, key)?)
    }

    fn scan(&self, cf: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let handle = self.cf(cf)?;
        let mut entries = Vec::new();
        for item in self.db.iterator_cf(handle, IteratorMode::Start) {
            let (key, value) = item?;
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        for op in &ops {
            match op {
                BatchOp::Put { cf, key, value } => batch.put_cf(self.cf(cf)?, key, value),
                BatchOp::Delete { cf, key } => batch.delete_cf(self.cf(cf)?, key),
            }
        }
        self.db.write(batch)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        for cf in ALL_COLUMN_FAMILIES {
            self.db.flush_cf(self.cf(cf)?)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "rocksdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CF_EMAIL_INDEX, CF_USERS};

    #[test]
    fn test_open_storage() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RocksBackend::open(dir.path()).is_ok());
    }

    #[test]
    fn test_batch_put_get() {
        let dir = tempfile::tempdir().unwrap();
        let backend = RocksBackend::open(dir.path()).unwrap();

        backend
            .write_batch(vec![
                BatchOp::Put {
                    cf: CF_USERS,
                    key: b"u1".to_vec(),
                    value: b"user".to_vec(),
                },
                BatchOp::Put {
                    cf: CF_EMAIL_INDEX,
                    key: b"a@x.com".to_vec(),
                    value: b"u1".to_vec(),
                },
            ])
            .unwrap();

        assert_eq!(backend.get(CF_USERS, b"u1").unwrap(), Some(b"user".to_vec()));
        assert_eq!(
            backend.get(CF_EMAIL_INDEX, b"a@x.com").unwrap(),
            Some(b"u1".to_vec())
        );
    }

    #[test]
    fn test_get_nonexistent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = RocksBackend::open(dir.path()).unwrap();
        assert!(backend.get(CF_USERS, b"missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_and_scan() {
        let dir = tempfile::tempdir().unwrap();
        let backend = RocksBackend::open(dir.path()).unwrap();

        backend
            .write_batch(vec![
                BatchOp::Put {
                    cf: CF_USERS,
                    key: b"a".to_vec(),
                    value: b"1".to_vec(),
                },
                BatchOp::Put {
                    cf: CF_USERS,
                    key: b"b".to_vec(),
                    value: b"2".to_vec(),
                },
            ])
            .unwrap();
        backend
            .write_batch(vec![BatchOp::Delete {
                cf: CF_USERS,
                key: b"a".to_vec(),
            }])
            .unwrap();

        let entries = backend.scan(CF_USERS).unwrap();
        assert_eq!(entries, vec![(b"b".to_vec(), b"2".to_vec())]);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = RocksBackend::open(dir.path()).unwrap();
            backend
                .write_batch(vec![BatchOp::Put {
                    cf: CF_USERS,
                    key: b"u1".to_vec(),
                    value: b"user".to_vec(),
                }])
                .unwrap();
            backend.flush().unwrap();
        }
        let backend = RocksBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get(CF_USERS, b"u1").unwrap(), Some(b"user".to_vec()));
    }

    fn active_memtable_entries(backend: &RocksBackend, cf: &str) -> u64 {
        backend
            .db
            .property_int_value_cf(backend.cf(cf).unwrap(), "rocksdb.num-entries-active-mem-table")
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_flush_persists_every_column_family() {
        let dir = tempfile::tempdir().unwrap();
        let backend = RocksBackend::open(dir.path()).unwrap();
        let ops = ALL_COLUMN_FAMILIES
            .into_iter()
            .map(|cf| BatchOp::Put {
                cf,
                key: b"k".to_vec(),
                value: cf.as_bytes().to_vec(),
            })
            .collect();
        backend.write_batch(ops).unwrap();
        for cf in ALL_COLUMN_FAMILIES {
            assert_eq!(active_memtable_entries(&backend, cf), 1, "{}", cf);
        }

        backend.flush().unwrap();
        for cf in ALL_COLUMN_FAMILIES {
            assert_eq!(active_memtable_entries(&backend, cf), 0, "{}", cf);
        }
    }
}
