//! In-memory backend for tests and single-process development.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::backend::{BatchOp, KvBackend, ALL_COLUMN_FAMILIES};
use crate::error::StoreError;

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// Column families held in ordered maps behind one lock, so a batch is
/// applied under a single write guard.
pub struct MemoryBackend {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let tables = ALL_COLUMN_FAMILIES
            .iter()
            .map(|cf| (*cf, Table::new()))
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("memory backend lock poisoned".into())
}

fn unknown_cf(cf: &str) -> StoreError {
    StoreError::Backend(format!("column family '{}' not found", cf))
}

impl KvBackend for MemoryBackend {
    fn get(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        let table = tables.get(cf).ok_or_else(|| unknown_cf(cf))?;
        Ok(table.get(key).cloned())
    }

    fn scan(&self, cf: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        let table = tables.get(cf).ok_or_else(|| unknown_cf(cf))?;
        Ok(table.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(poisoned)?;

        // Validate before mutating so a bad op cannot leave half a batch behind.
        for op in &ops {
            let cf = match op {
                BatchOp::Put { cf, .. } | BatchOp::Delete { cf, .. } => cf,
            };
            if !tables.contains_key(cf) {
                return Err(unknown_cf(cf));
            }
        }

        for op in ops {
            match op {
                BatchOp::Put { cf, key, value } => {
                    if let Some(table) = tables.get_mut(cf) {
                        table.insert(key, value);
                    }
                }
                BatchOp::Delete { cf, key } => {
                    if let Some(table) = tables.get_mut(cf) {
                        table.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
