//! Visit repository: logged occasions of visiting a place.

use serde_json::Value;

use super::{from_row, to_row};
use crate::error::{Result, StoreError};
use crate::id::{bump, new_id, now_ms};
use crate::integrity;
use crate::model::{NewVisit, Visit, VisitPatch};
use crate::storage::types::{EntityKind, Filter, OrderBy, Row};
use crate::store::Store;

pub struct VisitRepo<'a> {
    pub(crate) store: &'a Store,
}

impl VisitRepo<'_> {
    pub fn create(&self, new: NewVisit) -> Result<Visit> {
        let backend = self.store.backend()?;
        if backend
            .get_one(EntityKind::Place, &Filter::by_id(&new.place_id))?
            .is_none()
        {
            return Err(StoreError::NotFound(format!(
                "places with id {}",
                new.place_id
            )));
        }

        let now = now_ms();
        let visit = Visit {
            id: new_id(),
            place_id: new.place_id,
            notes: new.notes,
            photo_uri: new.photo_uri,
            created_at: now,
            updated_at: now,
        };
        backend.insert(EntityKind::Visit, to_row(&visit)?)?;
        Ok(visit)
    }

    pub fn get(&self, id: &str) -> Result<Option<Visit>> {
        let backend = self.store.backend()?;
        match backend.get_one(EntityKind::Visit, &Filter::by_id(id))? {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Visits of a place, newest first.
    pub fn for_place(&self, place_id: &str) -> Result<Vec<Visit>> {
        let backend = self.store.backend()?;
        let rows = backend.get_many(
            EntityKind::Visit,
            &Filter::new().eq("place_id", place_id),
            Some(OrderBy::desc("created_at")),
        )?;
        rows.into_iter().map(from_row).collect()
    }

    pub fn update(&self, id: &str, patch: VisitPatch) -> Result<Visit> {
        let backend = self.store.backend()?;
        let current = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(format!("visits with id {}", id)))?;

        let mut fields = Row::new();
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

        backend.update(EntityKind::Visit, id, fields)?;
        self.get(id)?
            .ok_or_else(|| StoreError::Storage("Visit row vanished during update".to_string()))
    }

    /// Delete a visit and its dishes. Idempotent.
    pub fn delete(&self, id: &str) -> Result<()> {
        let backend = self.store.backend()?;
        integrity::delete_with_cascades(backend, EntityKind::Visit, id)
    }
}
