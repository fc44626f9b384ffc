//! Category repository: hierarchical classifications for places and dishes.

use serde_json::Value;

use super::{from_row, to_row};
use crate::error::{Result, StoreError};
use crate::id::{new_id, now_ms};
use crate::integrity;
use crate::model::{Category, CategoryKind, CategoryPatch, NewCategory};
use crate::storage::types::{EntityKind, Filter, Row};
use crate::store::Store;

pub struct CategoryRepo<'a> {
    pub(crate) store: &'a Store,
}

impl CategoryRepo<'_> {
    pub fn create(&self, new: NewCategory) -> Result<Category> {
        let backend = self.store.backend()?;
        let category = Category {
            id: new_id(),
            name: new.name,
            kind: new.kind,
            parent_id: new.parent_id,
            order: new.order,
            created_at: now_ms(),
        };
        backend.insert(EntityKind::Category, to_row(&category)?)?;
        Ok(category)
    }

    pub fn get(&self, id: &str) -> Result<Option<Category>> {
        let backend = self.store.backend()?;
        match backend.get_one(EntityKind::Category, &Filter::by_id(id))? {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }

    /// All categories of one kind, sorted by `(order, name)`.
    ///
    /// Sorted in memory because the kind lives under the `type` key and
    /// the secondary name sort has no single-column equivalent.
    pub fn list_by_kind(&self, kind: CategoryKind) -> Result<Vec<Category>> {
        let backend = self.store.backend()?;
        let kind_value = serde_json::to_value(kind)?;
        let rows = backend.get_many(
            EntityKind::Category,
            &Filter::new().eq("type", kind_value),
            None,
        )?;
        let mut categories: Vec<Category> =
            rows.into_iter().map(from_row).collect::<Result<_>>()?;
        categories.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    pub fn update(&self, id: &str, patch: CategoryPatch) -> Result<Category> {
        let backend = self.store.backend()?;
        if self.get(id)?.is_none() {
            return Err(StoreError::NotFound(format!("categories with id {}", id)));
        }

        let mut fields = Row::new();
        if let Some(name) = patch.name {
            fields.insert("name".to_string(), Value::from(name));
        }
        if let Some(parent_id) = patch.parent_id {
            fields.insert("parent_id".to_string(), Value::from(parent_id));
        }
        if let Some(order) = patch.order {
            fields.insert("order".to_string(), Value::from(order));
        }

        if !fields.is_empty() {
            backend.update(EntityKind::Category, id, fields)?;
        }
        self.get(id)?
            .ok_or_else(|| StoreError::Storage("Category row vanished during update".to_string()))
    }

    /// Delete a category. Child categories become roots; places and
    /// dishes keep their now-dangling `category_id`. Idempotent.
    pub fn delete(&self, id: &str) -> Result<()> {
        let backend = self.store.backend()?;
        integrity::delete_with_cascades(backend, EntityKind::Category, id)
    }
}
