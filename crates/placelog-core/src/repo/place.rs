//! Place repository.

use serde_json::Value;

use super::{from_row, to_row};
use crate::aggregate;
use crate::error::{Result, StoreError};
use crate::id::{bump, new_id, now_ms};
use crate::integrity;
use crate::model::{NewPlace, Place, PlacePatch};
use crate::storage::types::{EntityKind, Filter, OrderBy, Row};
use crate::store::Store;

pub struct PlaceRepo<'a> {
    pub(crate) store: &'a Store,
}

impl PlaceRepo<'_> {
    pub fn create(&self, new: NewPlace) -> Result<Place> {
        let backend = self.store.backend()?;
        let now = now_ms();
        let mut place = Place {
            id: new_id(),
            name: new.name,
            address: new.address,
            latitude: new.latitude,
            longitude: new.longitude,
            category_id: new.category_id,
            notes: new.notes,
            overall_rating_manual: new.overall_rating_manual,
            rating_mode: new.rating_mode,
            cover_image_uri: new.cover_image_uri,
            created_at: now,
            updated_at: now,
            tag_ids: Vec::new(),
            overall_rating: None,
        };
        backend.insert(EntityKind::Place, to_row(&place)?)?;
        place.overall_rating =
            aggregate::place_rating(place.rating_mode, place.overall_rating_manual);
        Ok(place)
    }

    pub fn get(&self, id: &str) -> Result<Option<Place>> {
        let backend = self.store.backend()?;
        match backend.get_one(EntityKind::Place, &Filter::by_id(id))? {
            Some(row) => Ok(Some(self.hydrate(from_row(row)?)?)),
            None => Ok(None),
        }
    }

    pub fn all(&self) -> Result<Vec<Place>> {
        let backend = self.store.backend()?;
        let rows = backend.get_many(EntityKind::Place, &Filter::new(), Some(OrderBy::asc("name")))?;
        let mut places = Vec::with_capacity(rows.len());
        for row in rows {
            places.push(self.hydrate(from_row(row)?)?);
        }
        Ok(places)
    }

    pub fn update(&self, id: &str, patch: PlacePatch) -> Result<Place> {
        let backend = self.store.backend()?;
        let current = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(format!("places with id {}", id)))?;

        let mut fields = Row::new();
        if let Some(name) = patch.name {
            fields.insert("name".to_string(), Value::from(name));
        }
        if let Some(address) = patch.address {
            fields.insert("address".to_string(), Value::from(address));
        }
        if let Some(latitude) = patch.latitude {
            fields.insert("latitude".to_string(), Value::from(latitude));
        }
        if let Some(longitude) = patch.longitude {
            fields.insert("longitude".to_string(), Value::from(longitude));
        }
        if let Some(category_id) = patch.category_id {
            fields.insert("category_id".to_string(), Value::from(category_id));
        }
        if let Some(notes) = patch.notes {
            fields.insert("notes".to_string(), Value::from(notes));
        }
        if let Some(manual) = patch.overall_rating_manual {
            fields.insert("overall_rating_manual".to_string(), Value::from(manual));
        }
        if let Some(mode) = patch.rating_mode {
            fields.insert("rating_mode".to_string(), serde_json::to_value(mode)?);
        }
        if let Some(uri) = patch.cover_image_uri {
            fields.insert("cover_image_uri".to_string(), Value::from(uri));
        }
        fields.insert(
            "updated_at".to_string(),
            Value::from(bump(current.updated_at)),
        );

        backend.update(EntityKind::Place, id, fields)?;
        self.get(id)?
            .ok_or_else(|| StoreError::Storage("Place row vanished during update".to_string()))
    }

    /// Delete a place and everything that references it: list items,
    /// visits (and their dishes), tag links. Idempotent.
    pub fn delete(&self, id: &str) -> Result<()> {
        let backend = self.store.backend()?;
        integrity::delete_with_cascades(backend, EntityKind::Place, id)
    }

    /// Attach a tag to the place. Both sides must exist; re-attaching is
    /// a no-op.
    pub fn attach_tag(&self, place_id: &str, tag_id: &str) -> Result<()> {
        let backend = self.store.backend()?;
        if backend
            .get_one(EntityKind::Place, &Filter::by_id(place_id))?
            .is_none()
        {
            return Err(StoreError::NotFound(format!("places with id {}", place_id)));
        }
        if backend
            .get_one(EntityKind::Tag, &Filter::by_id(tag_id))?
            .is_none()
        {
            return Err(StoreError::NotFound(format!("tags with id {}", tag_id)));
        }
        backend.attach_tag(place_id, tag_id)
    }

    /// Detach a tag from the place. Idempotent.
    pub fn detach_tag(&self, place_id: &str, tag_id: &str) -> Result<()> {
        let backend = self.store.backend()?;
        backend.detach_tag(place_id, tag_id)
    }

    fn hydrate(&self, mut place: Place) -> Result<Place> {
        let backend = self.store.backend()?;
        place.tag_ids = backend.tags_for_place(&place.id)?;
        place.overall_rating =
            aggregate::place_rating(place.rating_mode, place.overall_rating_manual);
        Ok(place)
    }
}
