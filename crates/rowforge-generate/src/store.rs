use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use rowforge_core::Value;

use crate::handle::ValueHandle;
use crate::row::Row;

/// Handle -> value map shared by a row producer and its materializers.
///
/// `put` overwrites and `get` returns `None` for handles never written. Two
/// writers sharing one handle race and the last write wins; handles are only
/// shared on purpose, by copy-from-column fields within one pass.
#[derive(Debug, Default)]
pub struct ValueStore {
    entries: RwLock<HashMap<ValueHandle, Value>>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, handle: ValueHandle, value: Value) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, value);
    }

    pub fn get(&self, handle: ValueHandle) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
    }

    pub fn contains(&self, handle: ValueHandle) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the entries behind `handles`.
    pub fn discard(&self, handles: &[ValueHandle]) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for handle in handles {
            entries.remove(handle);
        }
    }

    /// Drop the entries behind every field of `rows`.
    ///
    /// Used once a task has materialized its rows so long runs keep a bounded
    /// store.
    pub fn release(&self, rows: &[Row]) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for field in rows.iter().flat_map(|row| row.fields.iter()) {
            entries.remove(&field.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_put_wins() {
        let store = ValueStore::new();
        let handle = ValueHandle::mint();
        store.put(handle, Value::Int(1));
        store.put(handle, Value::Int(2));
        assert_eq!(store.get(handle), Some(Value::Int(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_handle_is_absent() {
        let store = ValueStore::new();
        assert_eq!(store.get(ValueHandle::mint()), None);
        assert!(store.is_empty());
    }
}
