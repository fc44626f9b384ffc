//! Dish repository: items ordered and rated during a visit.

use serde_json::Value;

use super::{from_row, to_row};
use crate::error::{Result, StoreError};
use crate::id::{bump, new_id, now_ms};
use crate::integrity;
use crate::model::{Dish, DishPatch, NewDish};
use crate::storage::types::{EntityKind, Filter, OrderBy, Row};
use crate::store::Store;

pub struct DishRepo<'a> {
    pub(crate) store: &'a Store,
}

fn validate_rating(rating: i64) -> Result<()> {
    if !(1..=5).contains(&rating) {
        return Err(StoreError::Validation(format!(
            "Dish rating must be between 1 and 5, got {}",
            rating
        )));
    }
    Ok(())
}

impl DishRepo<'_> {
    pub fn create(&self, new: NewDish) -> Result<Dish> {
        let backend = self.store.backend()?;
        validate_rating(new.rating)?;
        if backend
            .get_one(EntityKind::Visit, &Filter::by_id(&new.visit_id))?
            .is_none()
        {
            return Err(StoreError::NotFound(format!(
                "visits with id {}",
                new.visit_id
            )));
        }

        let now = now_ms();
        let dish = Dish {
            id: new_id(),
            visit_id: new.visit_id,
            name: new.name,
            category_id: new.category_id,
            rating: new.rating,
            notes: new.notes,
            photo_uri: new.photo_uri,
            created_at: now,
            updated_at: now,
        };
        backend.insert(EntityKind::Dish, to_row(&dish)?)?;
        Ok(dish)
    }

    pub fn get(&self, id: &str) -> Result<Option<Dish>> {
        let backend = self.store.backend()?;
        match backend.get_one(EntityKind::Dish, &Filter::by_id(id))? {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Dishes of a visit, in logging order.
    pub fn for_visit(&self, visit_id: &str) -> Result<Vec<Dish>> {
        let backend = self.store.backend()?;
        let rows = backend.get_many(
            EntityKind::Dish,
            &Filter::new().eq("visit_id", visit_id),
            Some(OrderBy::asc("created_at")),
        )?;
        rows.into_iter().map(from_row).collect()
    }

    pub fn update(&self, id: &str, patch: DishPatch) -> Result<Dish> {
        let backend = self.store.backend()?;
        let current = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(format!("dishes with id {}", id)))?;

        let mut fields = Row::new();
        if let Some(name) = patch.name {
            fields.insert("name".to_string(), Value::from(name));
        }
        if let Some(category_id) = patch.category_id {
            fields.insert("category_id".to_string(), Value::from(category_id));
        }
        if let Some(rating) = patch.rating {
            validate_rating(rating)?;
            fields.insert("rating".to_string(), Value::from(rating));
        }
        if let Some(notes) = patch.notes {
            fields.insert("notes".to_string(), Value::from(notes));
        }
        if let Some(uri) = patch.photo_uri {
            fields.insert("photo_uri".to_string(), Value::from(uri));
        }
        fields.insert(
            "updated_at".to_string(),
            Value::from(bump(current.updated_at)),
        );

        backend.update(EntityKind::Dish, id, fields)?;
        self.get(id)?
            .ok_or_else(|| StoreError::Storage("Dish row vanished during update".to_string()))
    }

    /// Idempotent delete.
    pub fn delete(&self, id: &str) -> Result<()> {
        let backend = self.store.backend()?;
        integrity::delete_with_cascades(backend, EntityKind::Dish, id)
    }
}
