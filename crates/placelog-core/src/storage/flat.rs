//! Flat storage adapter: serialized collections under named slots.
//!
//! Used where the relational engine is unavailable. Each entity type is
//! stored as one whole JSON collection under a fixed slot name, plus one
//! auxiliary slot per place for its tag membership. Every query is an
//! in-memory filter/sort over the full deserialized collection, and every
//! write rewrites the entire collection back to its slot.
//!
//! There are no native transactions here and no compare-and-swap around
//! the read-modify-write cycle: concurrent writers to the same collection
//! race and the last writer wins. The store assumes a single logical
//! caller per instance, so this is an accepted limitation rather than a
//! bug to engineer away. Logical writes that touch multiple collections
//! are ordered children-before-parents by the integrity controller so an
//! interruption never leaves a dangling foreign reference.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::storage::traits::StorageBackend;
use crate::storage::types::{compare_values, ColumnDef, EntityKind, Filter, OrderBy, Row};

/// Named-slot primitive the flat adapter persists through. The slots are
/// owned exclusively by the adapter; repositories never touch them.
pub trait SlotStore: Send + Sync {
    fn get(&self, slot: &str) -> Result<Option<String>>;
    fn set(&self, slot: &str, payload: &str) -> Result<()>;
    fn remove(&self, slot: &str) -> Result<()>;
}

/// Slot store keeping one JSON file per slot in a directory.
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        // ':' appears in per-place tag slots and is not portable in
        // file names.
        self.dir.join(format!("{}.json", slot.replace(':', "-")))
    }
}

impl SlotStore for FileSlotStore {
    fn get(&self, slot: &str) -> Result<Option<String>> {
        let path = self.slot_path(slot);
        match fs::read_to_string(&path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, slot: &str, payload: &str) -> Result<()> {
        // Write-then-rename so a crash mid-write never truncates a slot.
        let path = self.slot_path(slot);
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, payload)?;
        if let Err(initial_err) = fs::rename(&temp, &path) {
            // Some platforms refuse to rename over an existing file.
            let _ = fs::remove_file(&path);
            fs::rename(&temp, &path).map_err(|retry_err| {
                let _ = fs::remove_file(&temp);
                StoreError::Storage(format!(
                    "Slot replace failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ))
            })?;
        }
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<()> {
        match fs::remove_file(self.slot_path(slot)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory slot store for tests.
#[derive(Default)]
pub struct MemorySlotStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn get(&self, slot: &str) -> Result<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| StoreError::Storage("Slot store poisoned".to_string()))?;
        Ok(slots.get(slot).cloned())
    }

    fn set(&self, slot: &str, payload: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| StoreError::Storage("Slot store poisoned".to_string()))?;
        slots.insert(slot.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| StoreError::Storage("Slot store poisoned".to_string()))?;
        slots.remove(slot);
        Ok(())
    }
}

/// Flat storage adapter over a [`SlotStore`].
pub struct FlatBackend {
    slots: Box<dyn SlotStore>,
}

impl FlatBackend {
    pub fn new(slots: Box<dyn SlotStore>) -> Self {
        Self { slots }
    }

    /// Flat adapter over in-memory slots (tests).
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySlotStore::new()))
    }

    /// Flat adapter persisting JSON files under `dir`.
    pub fn on_disk(dir: &Path) -> Result<Self> {
        Ok(Self::new(Box::new(FileSlotStore::new(dir)?)))
    }

    fn read_collection(&self, kind: EntityKind) -> Result<Vec<Row>> {
        match self.slots.get(kind.table())? {
            None => Ok(Vec::new()),
            Some(payload) => Ok(serde_json::from_str(&payload)?),
        }
    }

    fn write_collection(&self, kind: EntityKind, rows: &[Row]) -> Result<()> {
        self.slots.set(kind.table(), &serde_json::to_string(rows)?)
    }

    fn tag_slot(place_id: &str) -> String {
        format!("place_tags:{}", place_id)
    }

    fn read_tag_slot(&self, place_id: &str) -> Result<Vec<String>> {
        match self.slots.get(&Self::tag_slot(place_id))? {
            None => Ok(Vec::new()),
            Some(payload) => Ok(serde_json::from_str(&payload)?),
        }
    }

    fn write_tag_slot(&self, place_id: &str, tag_ids: &[String]) -> Result<()> {
        self.slots
            .set(&Self::tag_slot(place_id), &serde_json::to_string(tag_ids)?)
    }

    fn row_id(row: &Row) -> Option<&str> {
        row.get("id").and_then(Value::as_str)
    }
}

impl StorageBackend for FlatBackend {
    fn enforces_foreign_keys(&self) -> bool {
        false
    }

    fn create_schema(&self) -> Result<()> {
        // Slots are created lazily on first write; nothing to declare.
        Ok(())
    }

    fn insert(&self, kind: EntityKind, row: Row) -> Result<()> {
        let mut rows = self.read_collection(kind)?;
        rows.push(row);
        self.write_collection(kind, &rows)
    }

    fn update(&self, kind: EntityKind, id: &str, fields: Row) -> Result<()> {
        let mut rows = self.read_collection(kind)?;
        let target = rows
            .iter_mut()
            .find(|row| Self::row_id(row) == Some(id))
            .ok_or_else(|| {
                StoreError::NotFound(format!("{} with id {}", kind.table(), id))
            })?;
        for (key, value) in fields {
            target.insert(key, value);
        }
        self.write_collection(kind, &rows)
    }

    fn delete(&self, kind: EntityKind, id: &str) -> Result<()> {
        let mut rows = self.read_collection(kind)?;
        let before = rows.len();
        rows.retain(|row| Self::row_id(row) != Some(id));
        if rows.len() != before {
            self.write_collection(kind, &rows)?;
        }
        Ok(())
    }

    fn get_one(&self, kind: EntityKind, filter: &Filter) -> Result<Option<Row>> {
        Ok(self
            .read_collection(kind)?
            .into_iter()
            .find(|row| filter.matches(row)))
    }

    fn get_many(
        &self,
        kind: EntityKind,
        filter: &Filter,
        order: Option<OrderBy>,
    ) -> Result<Vec<Row>> {
        let mut rows: Vec<Row> = self
            .read_collection(kind)?
            .into_iter()
            .filter(|row| filter.matches(row))
            .collect();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(order.column).unwrap_or(&Value::Null),
                    b.get(order.column).unwrap_or(&Value::Null),
                );
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        Ok(rows)
    }

    fn set_null(&self, kind: EntityKind, column: &'static str, value: &str) -> Result<()> {
        let mut rows = self.read_collection(kind)?;
        let mut changed = false;
        for row in &mut rows {
            if row.get(column).and_then(Value::as_str) == Some(value) {
                row.insert(column.to_string(), Value::Null);
                changed = true;
            }
        }
        if changed {
            self.write_collection(kind, &rows)?;
        }
        Ok(())
    }

    fn tags_for_place(&self, place_id: &str) -> Result<Vec<String>> {
        let mut tag_ids = self.read_tag_slot(place_id)?;
        tag_ids.sort();
        Ok(tag_ids)
    }

    fn attach_tag(&self, place_id: &str, tag_id: &str) -> Result<()> {
        let mut tag_ids = self.read_tag_slot(place_id)?;
        if !tag_ids.iter().any(|t| t == tag_id) {
            tag_ids.push(tag_id.to_string());
            self.write_tag_slot(place_id, &tag_ids)?;
        }
        Ok(())
    }

    fn detach_tag(&self, place_id: &str, tag_id: &str) -> Result<()> {
        let mut tag_ids = self.read_tag_slot(place_id)?;
        let before = tag_ids.len();
        tag_ids.retain(|t| t != tag_id);
        if tag_ids.len() != before {
            self.write_tag_slot(place_id, &tag_ids)?;
        }
        Ok(())
    }

    fn clear_place_tags(&self, place_id: &str) -> Result<()> {
        self.slots.remove(&Self::tag_slot(place_id))
    }

    fn detach_tag_everywhere(&self, tag_id: &str) -> Result<()> {
        for row in self.read_collection(EntityKind::Place)? {
            if let Some(place_id) = Self::row_id(&row) {
                self.detach_tag(place_id, tag_id)?;
            }
        }
        Ok(())
    }

    fn add_column(&self, _kind: EntityKind, _column: &ColumnDef) -> Result<()> {
        // Rows are schemaless JSON maps; absent keys read as null.
        Ok(())
    }

    fn drop_column(&self, _kind: EntityKind, _name: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place_row(id: &str, name: &str) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(id));
        row.insert("name".to_string(), json!(name));
        row.insert("created_at".to_string(), json!(1));
        row
    }

    #[test]
    fn test_insert_get_round_trip() {
        let backend = FlatBackend::in_memory();
        backend
            .insert(EntityKind::Place, place_row("p1", "Bar Luce"))
            .unwrap();

        let found = backend
            .get_one(EntityKind::Place, &Filter::by_id("p1"))
            .unwrap()
            .expect("row should exist");
        assert_eq!(found.get("name"), Some(&json!("Bar Luce")));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let backend = FlatBackend::in_memory();
        let err = backend
            .update(EntityKind::Place, "missing", Row::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let backend = FlatBackend::in_memory();
        backend
            .insert(EntityKind::Place, place_row("p1", "Bar Luce"))
            .unwrap();
        backend.delete(EntityKind::Place, "p1").unwrap();
        backend.delete(EntityKind::Place, "p1").unwrap();
    }

    #[test]
    fn test_get_many_sorts_and_filters() {
        let backend = FlatBackend::in_memory();
        backend
            .insert(EntityKind::Place, place_row("p2", "Osteria"))
            .unwrap();
        backend
            .insert(EntityKind::Place, place_row("p1", "Bar Luce"))
            .unwrap();

        let rows = backend
            .get_many(EntityKind::Place, &Filter::new(), Some(OrderBy::asc("name")))
            .unwrap();
        assert_eq!(rows[0].get("id"), Some(&json!("p1")));
        assert_eq!(rows[1].get("id"), Some(&json!("p2")));
    }

    #[test]
    fn test_set_null_clears_matching_rows_only() {
        let backend = FlatBackend::in_memory();
        let mut child = place_row("c1", "Child");
        child.insert("parent_id".to_string(), json!("root"));
        let mut other = place_row("c2", "Other");
        other.insert("parent_id".to_string(), json!("elsewhere"));
        backend.insert(EntityKind::Category, child).unwrap();
        backend.insert(EntityKind::Category, other).unwrap();

        backend
            .set_null(EntityKind::Category, "parent_id", "root")
            .unwrap();

        let rows = backend
            .get_many(EntityKind::Category, &Filter::new(), None)
            .unwrap();
        assert_eq!(rows[0].get("parent_id"), Some(&Value::Null));
        assert_eq!(rows[1].get("parent_id"), Some(&json!("elsewhere")));
    }

    #[test]
    fn test_tag_slots() {
        let backend = FlatBackend::in_memory();
        backend.attach_tag("p1", "t2").unwrap();
        backend.attach_tag("p1", "t1").unwrap();
        backend.attach_tag("p1", "t1").unwrap();

        assert_eq!(backend.tags_for_place("p1").unwrap(), vec!["t1", "t2"]);

        backend.detach_tag_everywhere("t1").unwrap();
        // No place rows exist, so the slot is untouched by the sweep.
        assert_eq!(backend.tags_for_place("p1").unwrap(), vec!["t1", "t2"]);

        backend
            .insert(EntityKind::Place, place_row("p1", "Bar Luce"))
            .unwrap();
        backend.detach_tag_everywhere("t1").unwrap();
        assert_eq!(backend.tags_for_place("p1").unwrap(), vec!["t2"]);

        backend.clear_place_tags("p1").unwrap();
        assert!(backend.tags_for_place("p1").unwrap().is_empty());
    }

    #[test]
    fn test_file_slot_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSlotStore::new(dir.path()).unwrap();

        assert!(store.get("places").unwrap().is_none());
        store.set("places", "[]").unwrap();
        store.set("places", "[{\"id\":\"p1\"}]").unwrap();
        assert_eq!(store.get("places").unwrap().unwrap(), "[{\"id\":\"p1\"}]");

        store.set("place_tags:p1", "[\"t1\"]").unwrap();
        assert!(dir.path().join("place_tags-p1.json").exists());

        store.remove("places").unwrap();
        store.remove("places").unwrap();
        assert!(store.get("places").unwrap().is_none());
    }
}
