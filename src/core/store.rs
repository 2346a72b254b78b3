use crate::core::loader::{self, TableSource};
use crate::domain::model::ReferenceTable;
use std::sync::{Arc, PoisonError, RwLock};

/// Holds the currently published reference table.
///
/// Readers clone the inner `Arc` and work on that snapshot; a reload builds the
/// new table off to the side and swaps the pointer, so no reader ever sees a
/// half-built table.
#[derive(Debug)]
pub struct TableStore {
    current: RwLock<Arc<ReferenceTable>>,
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new(ReferenceTable::empty())
    }
}

impl TableStore {
    pub fn new(table: ReferenceTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    pub fn from_source(source: &TableSource) -> Self {
        Self::new(loader::load(source))
    }

    pub fn snapshot(&self) -> Arc<ReferenceTable> {
        // the guarded value is a plain pointer, so a poisoned lock still holds a usable one
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publish `table`, returning the snapshot it replaced.
    pub fn replace(&self, table: ReferenceTable) -> Arc<ReferenceTable> {
        let next = Arc::new(table);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Reload from `source` and return the size of the published table.
    ///
    /// An empty result never replaces a populated table.
    pub fn reload(&self, source: &TableSource) -> usize {
        let fresh = loader::load(source);
        let current_len = self.len();

        if fresh.is_empty() && current_len > 0 {
            tracing::warn!(
                "Reload of {} produced no codes; keeping the current table ({} codes)",
                source.path.display(),
                current_len
            );
            return current_len;
        }

        let len = fresh.len();
        self.replace(fresh);
        tracing::info!("Published reference table with {} codes", len);
        len
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ReferenceEntry;
    use std::io::Write;

    fn table(code: &str, description: &str) -> ReferenceTable {
        ReferenceTable::from_entries(vec![ReferenceEntry {
            code: code.to_string(),
            description: description.to_string(),
        }])
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let store = TableStore::new(table("0101", "Live horses"));
        let before = store.snapshot();

        let previous = store.replace(table("0102", "Live bovine animals"));

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.get("0101"), Some("Live horses"));
        assert_eq!(store.snapshot().get("0101"), None);
        assert_eq!(store.snapshot().get("0102"), Some("Live bovine animals"));
    }

    #[test]
    fn test_default_store_is_empty() {
        let store = TableStore::default();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_reload_replaces_table() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"HSNCode,Description\n0101,Live horses\n0102,Live bovine animals\n")
            .unwrap();

        let store = TableStore::new(table("01", "Live animals"));
        let len = store.reload(&TableSource::new(file.path()));

        assert_eq!(len, 2);
        assert_eq!(store.snapshot().get("01"), None);
        assert_eq!(store.snapshot().get("0102"), Some("Live bovine animals"));
    }

    #[test]
    fn test_failed_reload_keeps_current_table() {
        let store = TableStore::new(table("0101", "Live horses"));
        let len = store.reload(&TableSource::new("/missing/HSN_SAC.csv"));

        assert_eq!(len, 1);
        assert_eq!(store.snapshot().get("0101"), Some("Live horses"));
    }

    #[test]
    fn test_reload_can_recover_from_empty_start() {
        let store = TableStore::from_source(&TableSource::new("/missing/HSN_SAC.csv"));
        assert!(store.is_empty());

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"HSNCode,Description\n0101,Live horses\n").unwrap();

        assert_eq!(store.reload(&TableSource::new(file.path())), 1);
        assert!(!store.is_empty());
    }
}
