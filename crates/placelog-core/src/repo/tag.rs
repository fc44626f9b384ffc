//! Tag repository. Tag names are unique, compared case-insensitively.

use serde_json::Value;

use super::{from_row, to_row};
use crate::error::{Result, StoreError};
use crate::id::{new_id, now_ms};
use crate::integrity;
use crate::model::{NewTag, Tag, TagPatch};
use crate::storage::types::{EntityKind, Filter, Row};
use crate::store::Store;

pub struct TagRepo<'a> {
    pub(crate) store: &'a Store,
}

impl TagRepo<'_> {
    pub fn create(&self, new: NewTag) -> Result<Tag> {
        let backend = self.store.backend()?;
        self.check_name_free(&new.name, None)?;

        let tag = Tag {
            id: new_id(),
            name: new.name,
            color: new.color,
            created_at: now_ms(),
        };
        backend.insert(EntityKind::Tag, to_row(&tag)?)?;
        Ok(tag)
    }

    pub fn get(&self, id: &str) -> Result<Option<Tag>> {
        let backend = self.store.backend()?;
        match backend.get_one(EntityKind::Tag, &Filter::by_id(id))? {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }

    /// All tags, sorted by name case-insensitively.
    pub fn all(&self) -> Result<Vec<Tag>> {
        let backend = self.store.backend()?;
        let rows = backend.get_many(EntityKind::Tag, &Filter::new(), None)?;
        let mut tags: Vec<Tag> = rows.into_iter().map(from_row).collect::<Result<_>>()?;
        tags.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(tags)
    }

    pub fn update(&self, id: &str, patch: TagPatch) -> Result<Tag> {
        let backend = self.store.backend()?;
        if self.get(id)?.is_none() {
            return Err(StoreError::NotFound(format!("tags with id {}", id)));
        }

        let mut fields = Row::new();
        if let Some(name) = patch.name {
            self.check_name_free(&name, Some(id))?;
            fields.insert("name".to_string(), Value::from(name));
        }
        if let Some(color) = patch.color {
            fields.insert("color".to_string(), Value::from(color));
        }

        if !fields.is_empty() {
            backend.update(EntityKind::Tag, id, fields)?;
        }
        self.get(id)?
            .ok_or_else(|| StoreError::Storage("Tag row vanished during update".to_string()))
    }

    /// Delete a tag and remove it from every place. Idempotent.
    pub fn delete(&self, id: &str) -> Result<()> {
        let backend = self.store.backend()?;
        integrity::delete_with_cascades(backend, EntityKind::Tag, id)
    }

    /// Reject a name already used by another tag, ignoring case.
    fn check_name_free(&self, name: &str, exclude_id: Option<&str>) -> Result<()> {
        let backend = self.store.backend()?;
        let wanted = name.to_lowercase();
        let rows = backend.get_many(EntityKind::Tag, &Filter::new(), None)?;
        for row in rows {
            let existing: Tag = from_row(row)?;
            if exclude_id == Some(existing.id.as_str()) {
                continue;
            }
            if existing.name.to_lowercase() == wanted {
                return Err(StoreError::Duplicate(format!(
                    "Tag named '{}' already exists",
                    existing.name
                )));
            }
        }
        Ok(())
    }
}
