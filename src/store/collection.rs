use crate::error::{PortalError, PortalResult};
use crate::store::SharedStore;
use crate::utils::now_utc_iso;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Record identifier. Some collections use small sequential integers (users,
/// replies), others use time-based strings (threads); both shapes appear in
/// the persisted format and must stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

/// How a collection assigns ids to appended records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// `max existing numeric id + 1`, starting at 1.
    Sequential,
    /// Millisecond-clock string, bumped on collision.
    Timestamped,
}

/// A stored record: a unique id assigned once by the collection and a
/// creation timestamp set once on insert.
pub trait Record: Clone + Serialize + DeserializeOwned {
    fn id(&self) -> Option<&RecordId>;
    fn assign_id(&mut self, id: RecordId);
    fn created_at(&self) -> &str;
    fn set_created_at(&mut self, timestamp: String);
}

/// Typed CRUD over one named collection. Every mutation reads the whole
/// collection, mutates in memory, and writes the whole collection back; the
/// backing store has no partial-update operation, so this shape is load
/// bearing, not a convenience.
pub struct Collection<R: Record> {
    store: SharedStore,
    name: String,
    ids: IdStrategy,
    _marker: PhantomData<R>,
}

impl<R: Record> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            name: self.name.clone(),
            ids: self.ids,
            _marker: PhantomData,
        }
    }
}

impl<R: Record> Collection<R> {
    pub fn new(store: SharedStore, name: impl Into<String>, ids: IdStrategy) -> Self {
        Self {
            store,
            name: name.into(),
            ids,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads and deserializes the collection. A missing key, unreadable
    /// store, or parse failure all degrade to an empty sequence; the caller
    /// never sees an error from a read.
    pub fn load(&self) -> Vec<R> {
        let raw = match self.store.get(&self.name) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(collection = %self.name, error = ?err, "store read failed");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(collection = %self.name, error = ?err, "corrupt collection, treating as empty");
                Vec::new()
            }
        }
    }

    /// Serializes and writes the full sequence back.
    pub fn save(&self, records: &[R]) -> PortalResult<()> {
        let raw = serde_json::to_string(records)
            .map_err(|err| PortalError::Store(anyhow::Error::from(err)))?;
        self.store
            .set(&self.name, &raw)
            .map_err(PortalError::Store)
    }

    pub fn find_by_id(&self, id: &RecordId) -> Option<R> {
        self.load().into_iter().find(|r| r.id() == Some(id))
    }

    pub fn exists<F>(&self, predicate: F) -> bool
    where
        F: Fn(&R) -> bool,
    {
        self.load().iter().any(|r| predicate(r))
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }

    /// Replaces the record in place if its id is already present, otherwise
    /// appends it, assigning a fresh id when the record has none and stamping
    /// the creation time once.
    pub fn upsert(&self, mut record: R) -> PortalResult<R> {
        let mut records = self.load();
        let existing = record
            .id()
            .and_then(|id| records.iter().position(|r| r.id() == Some(id)));
        match existing {
            Some(index) => {
                records[index] = record.clone();
            }
            None => {
                if record.id().is_none() {
                    record.assign_id(self.next_id(&records));
                }
                if record.created_at().is_empty() {
                    record.set_created_at(now_utc_iso());
                }
                records.push(record.clone());
            }
        }
        self.save(&records)?;
        Ok(record)
    }

    fn next_id(&self, records: &[R]) -> RecordId {
        match self.ids {
            IdStrategy::Sequential => {
                let max = records
                    .iter()
                    .filter_map(|r| match r.id() {
                        Some(RecordId::Number(n)) => Some(*n),
                        _ => None,
                    })
                    .max()
                    .unwrap_or(0);
                RecordId::Number(max + 1)
            }
            IdStrategy::Timestamped => {
                let mut candidate = chrono::Utc::now().timestamp_millis();
                let taken = |id: &RecordId| records.iter().any(|r| r.id() == Some(id));
                let mut id = RecordId::Text(candidate.to_string());
                while taken(&id) {
                    candidate += 1;
                    id = RecordId::Text(candidate.to_string());
                }
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use anyhow::anyhow;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<RecordId>,
        body: String,
        #[serde(default)]
        date: String,
    }

    impl Note {
        fn new(body: &str) -> Self {
            Self {
                id: None,
                body: body.to_string(),
                date: String::new(),
            }
        }
    }

    impl Record for Note {
        fn id(&self) -> Option<&RecordId> {
            self.id.as_ref()
        }
        fn assign_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }
        fn created_at(&self) -> &str {
            &self.date
        }
        fn set_created_at(&mut self, timestamp: String) {
            self.date = timestamp;
        }
    }

    struct BrokenStore;

    impl crate::store::KvStore for BrokenStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow!("quota exhausted"))
        }
        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow!("quota exhausted"))
        }
        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow!("quota exhausted"))
        }
    }

    fn notes(ids: IdStrategy) -> Collection<Note> {
        Collection::new(MemoryStore::shared(), "notes", ids)
    }

    #[test]
    fn load_on_never_written_collection_is_empty() {
        assert!(notes(IdStrategy::Sequential).load().is_empty());
    }

    #[test]
    fn upsert_round_trips_through_find_by_id() {
        let notes = notes(IdStrategy::Sequential);
        let stored = notes.upsert(Note::new("hello")).unwrap();
        let id = stored.id.clone().expect("assigned id");
        let found = notes.find_by_id(&id).expect("found");
        assert_eq!(found, stored);
        assert!(!found.date.is_empty());
    }

    #[test]
    fn sequential_ids_start_at_one_and_increment() {
        let notes = notes(IdStrategy::Sequential);
        let a = notes.upsert(Note::new("a")).unwrap();
        let b = notes.upsert(Note::new("b")).unwrap();
        assert_eq!(a.id, Some(RecordId::Number(1)));
        assert_eq!(b.id, Some(RecordId::Number(2)));
    }

    #[test]
    fn timestamped_ids_are_unique_under_rapid_inserts() {
        let notes = notes(IdStrategy::Timestamped);
        let mut seen = std::collections::HashSet::new();
        for i in 0..10 {
            let stored = notes.upsert(Note::new(&format!("n{i}"))).unwrap();
            let id = stored.id.expect("assigned id");
            assert!(matches!(id, RecordId::Text(_)));
            assert!(seen.insert(id));
        }
    }

    #[test]
    fn upsert_with_known_id_replaces_in_place() {
        let notes = notes(IdStrategy::Sequential);
        notes.upsert(Note::new("first")).unwrap();
        let mut second = notes.upsert(Note::new("second")).unwrap();
        notes.upsert(Note::new("third")).unwrap();

        second.body = "revised".to_string();
        notes.upsert(second.clone()).unwrap();

        let all = notes.load();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].body, "revised");
        assert_eq!(all[1].id, second.id);
    }

    #[test]
    fn exists_checks_predicate_across_collection() {
        let notes = notes(IdStrategy::Sequential);
        notes.upsert(Note::new("unique")).unwrap();
        assert!(notes.exists(|n| n.body == "unique"));
        assert!(!notes.exists(|n| n.body == "absent"));
    }

    #[test]
    fn corrupt_payload_degrades_to_empty() {
        let store = MemoryStore::shared();
        store.set("notes", "not json").unwrap();
        let notes: Collection<Note> = Collection::new(store, "notes", IdStrategy::Sequential);
        assert!(notes.load().is_empty());
    }

    #[test]
    fn unreadable_store_degrades_reads_and_surfaces_writes() {
        let notes: Collection<Note> = Collection::new(
            std::sync::Arc::new(BrokenStore),
            "notes",
            IdStrategy::Sequential,
        );
        assert!(notes.load().is_empty());
        let err = notes.upsert(Note::new("x")).unwrap_err();
        assert!(matches!(err, PortalError::Store(_)));
    }

    #[test]
    fn ids_survive_serialization_in_both_shapes() {
        let numeric: RecordId = serde_json::from_str("7").unwrap();
        assert_eq!(numeric, RecordId::Number(7));
        let text: RecordId = serde_json::from_str("\"1719922133000\"").unwrap();
        assert_eq!(text, RecordId::Text("1719922133000".to_string()));
    }
}
