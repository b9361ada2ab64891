//! Browser-local save-list
//!
//! A single storage key holds a JSON array of records. Each save reads the
//! whole array (defaulting to empty when absent or unreadable), appends one
//! record and writes the array back. There is no eviction.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// String key/value storage (localStorage in the browser).
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAnalysisRecord {
    pub id: String,
    /// ISO-8601, millisecond precision, UTC
    pub timestamp: String,
    pub location: String,
}

impl SavedAnalysisRecord {
    pub fn new(id: impl Into<String>, location: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            location: location.into(),
        }
    }
}

/// Append-only list of saved analyses under one storage key.
pub struct SaveList<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
    key: &'a str,
}

impl<'a, S: KeyValueStore + ?Sized> SaveList<'a, S> {
    pub fn new(store: &'a S, key: &'a str) -> Self {
        Self { store, key }
    }

    /// All records in save order; unreadable data reads as empty.
    pub fn records(&self) -> Vec<SavedAnalysisRecord> {
        let raw = match self.store.get_item(self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("could not read save-list: {}", e);
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("save-list under '{}' is not a record list: {}", self.key, e);
            Vec::new()
        })
    }

    pub fn append(&self, record: SavedAnalysisRecord) -> Result<usize, StoreError> {
        let mut records = self.records();
        records.push(record);

        let json =
            serde_json::to_string(&records).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set_item(self.key, &json)?;

        tracing::debug!("save-list now holds {} analyses", records.len());
        Ok(records.len())
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        let record = SavedAnalysisRecord::new("a1", "Downtown Plaza", at(1_700_000_000));
        assert_eq!(record.timestamp, "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn test_empty_when_absent() {
        let store = MemoryStore::default();
        assert!(SaveList::new(&store, "savedAnalyses").records().is_empty());
    }

    #[test]
    fn test_garbage_resets_to_empty_then_appends() {
        let store = MemoryStore::default();
        store
            .items
            .borrow_mut()
            .insert("savedAnalyses".into(), "{not a list".into());
        let list = SaveList::new(&store, "savedAnalyses");
        assert!(list.records().is_empty());
        assert_eq!(
            list.append(SavedAnalysisRecord::new("a1", "Main St", at(0)))
                .unwrap(),
            1
        );
        assert_eq!(list.records()[0].id, "a1");
    }

    #[test]
    fn test_write_failure_is_reported() {
        let store = MemoryStore {
            fail_writes: true,
            ..Default::default()
        };
        let list = SaveList::new(&store, "savedAnalyses");
        let err = list
            .append(SavedAnalysisRecord::new("a1", "Main St", at(0)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Write(_)));
    }

    #[test]
    fn test_wire_format() {
        let store = MemoryStore::default();
        let list = SaveList::new(&store, "k");
        list.append(SavedAnalysisRecord::new("a1", "Main St", at(0)))
            .unwrap();
        assert_eq!(
            store.items.borrow()["k"],
            r#"[{"id":"a1","timestamp":"1970-01-01T00:00:00.000Z","location":"Main St"}]"#
        );
    }

    proptest! {
        /// Saving N analyses yields N records in save order
        #[test]
        fn saves_round_trip_in_order(
            entries in prop::collection::vec(("[a-z0-9_]{1,12}", ".{0,20}"), 0..20)
        ) {
            let store = MemoryStore::default();
            let list = SaveList::new(&store, "savedAnalyses");
            for (i, (id, location)) in entries.iter().enumerate() {
                list.append(SavedAnalysisRecord::new(id.clone(), location.clone(), at(i as i64)))
                    .unwrap();
            }
            let records = list.records();
            prop_assert_eq!(records.len(), entries.len());
            for (record, (id, location)) in records.iter().zip(&entries) {
                prop_assert_eq!(&record.id, id);
                prop_assert_eq!(&record.location, location);
            }
        }
    }
}
