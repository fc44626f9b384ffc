//! List repository: curated, ordered collections of places.

use serde_json::Value;

use super::{from_row, to_row};
use crate::aggregate;
use crate::error::{Result, StoreError};
use crate::id::{bump, new_id, now_ms};
use crate::integrity;
use crate::model::{List, ListItem, ListPatch, NewList, Place};
use crate::storage::types::{EntityKind, Filter, OrderBy, Row};
use crate::store::Store;

pub struct ListRepo<'a> {
    pub(crate) store: &'a Store,
}

impl ListRepo<'_> {
    pub fn create(&self, new: NewList) -> Result<List> {
        let backend = self.store.backend()?;
        let now = now_ms();
        let list = List {
            id: new_id(),
            name: new.name,
            description: new.description,
            category: new.category,
            city: new.city,
            created_at: now,
            updated_at: now,
            overall_rating: None,
        };
        backend.insert(EntityKind::List, to_row(&list)?)?;
        Ok(list)
    }

    pub fn get(&self, id: &str) -> Result<Option<List>> {
        let backend = self.store.backend()?;
        match backend.get_one(EntityKind::List, &Filter::by_id(id))? {
            Some(row) => Ok(Some(self.hydrate(from_row(row)?)?)),
            None => Ok(None),
        }
    }

    pub fn all(&self) -> Result<Vec<List>> {
        let backend = self.store.backend()?;
        let rows = backend.get_many(EntityKind::List, &Filter::new(), Some(OrderBy::asc("name")))?;
        let mut lists = Vec::with_capacity(rows.len());
        for row in rows {
            lists.push(self.hydrate(from_row(row)?)?);
        }
        Ok(lists)
    }

    pub fn update(&self, id: &str, patch: ListPatch) -> Result<List> {
        let backend = self.store.backend()?;
        let current = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(format!("lists with id {}", id)))?;

        let mut fields = Row::new();
        if let Some(name) = patch.name {
            fields.insert("name".to_string(), Value::from(name));
        }
        if let Some(description) = patch.description {
            fields.insert("description".to_string(), Value::from(description));
        }
        if let Some(category) = patch.category {
            fields.insert("category".to_string(), Value::from(category));
        }
        if let Some(city) = patch.city {
            fields.insert("city".to_string(), Value::from(city));
        }
        fields.insert(
            "updated_at".to_string(),
            Value::from(bump(current.updated_at)),
        );

        backend.update(EntityKind::List, id, fields)?;
        self.get(id)?
            .ok_or_else(|| StoreError::Storage("List row vanished during update".to_string()))
    }

    /// Delete a list and its membership rows. Idempotent.
    pub fn delete(&self, id: &str) -> Result<()> {
        let backend = self.store.backend()?;
        integrity::delete_with_cascades(backend, EntityKind::List, id)
    }

    /// Membership rows of a list, sorted by their order key.
    pub fn items(&self, list_id: &str) -> Result<Vec<ListItem>> {
        let backend = self.store.backend()?;
        let rows = backend.get_many(
            EntityKind::ListItem,
            &Filter::new().eq("list_id", list_id),
            Some(OrderBy::asc("order")),
        )?;
        rows.into_iter().map(from_row).collect()
    }

    /// Append a place to the list at `max(order) + 1` (0 when empty).
    /// Orders are never reused: a freshly appended item always sorts after
    /// every item the list has ever held.
    pub fn add_place(&self, list_id: &str, place_id: &str) -> Result<ListItem> {
        let backend = self.store.backend()?;
        let list = self
            .get(list_id)?
            .ok_or_else(|| StoreError::NotFound(format!("lists with id {}", list_id)))?;
        if backend
            .get_one(EntityKind::Place, &Filter::by_id(place_id))?
            .is_none()
        {
            return Err(StoreError::NotFound(format!("places with id {}", place_id)));
        }

        let next_order = self
            .items(list_id)?
            .iter()
            .map(|item| item.order)
            .max()
            .map_or(0, |max| max + 1);

        let item = ListItem {
            id: new_id(),
            list_id: list_id.to_string(),
            place_id: place_id.to_string(),
            order: next_order,
            created_at: now_ms(),
        };
        backend.insert(EntityKind::ListItem, to_row(&item)?)?;
        self.touch(list_id, list.updated_at)?;
        Ok(item)
    }

    /// Remove every membership row matching (list, place). Remaining
    /// orders are NOT renumbered; gaps are expected and `order` stays a
    /// sort key, not a dense index. Removing an absent pair is a no-op.
    pub fn remove_place(&self, list_id: &str, place_id: &str) -> Result<()> {
        let backend = self.store.backend()?;
        let matching = backend.get_many(
            EntityKind::ListItem,
            &Filter::new().eq("list_id", list_id).eq("place_id", place_id),
            None,
        )?;
        if matching.is_empty() {
            return Ok(());
        }
        for row in &matching {
            let item_id = row
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| StoreError::Storage("list_items row without id".to_string()))?;
            backend.delete(EntityKind::ListItem, item_id)?;
        }
        if let Some(list) = self.get(list_id)? {
            self.touch(list_id, list.updated_at)?;
        }
        Ok(())
    }

    /// Renumber the list's items densely (0..n) to match `place_ids`,
    /// which must be a permutation of the current membership.
    pub fn reorder(&self, list_id: &str, place_ids: &[String]) -> Result<()> {
        let backend = self.store.backend()?;
        let list = self
            .get(list_id)?
            .ok_or_else(|| StoreError::NotFound(format!("lists with id {}", list_id)))?;

        let mut remaining: Vec<Option<ListItem>> =
            self.items(list_id)?.into_iter().map(Some).collect();
        if place_ids.len() != remaining.len() {
            return Err(StoreError::Validation(format!(
                "Reorder must name all {} items of the list",
                remaining.len()
            )));
        }

        for (position, place_id) in place_ids.iter().enumerate() {
            let slot = remaining
                .iter_mut()
                .find(|slot| {
                    slot.as_ref()
                        .is_some_and(|item| &item.place_id == place_id)
                })
                .ok_or_else(|| {
                    StoreError::Validation(format!(
                        "Place {} is not a member of list {}",
                        place_id, list_id
                    ))
                })?;
            let item = slot
                .take()
                .ok_or_else(|| StoreError::Storage("Reorder slot vanished".to_string()))?;
            let mut fields = Row::new();
            fields.insert("order".to_string(), Value::from(position as i64));
            backend.update(EntityKind::ListItem, &item.id, fields)?;
        }

        self.touch(list_id, list.updated_at)
    }

    /// Bump the list's `updated_at` after a membership change.
    fn touch(&self, list_id: &str, prev_updated_at: i64) -> Result<()> {
        let backend = self.store.backend()?;
        let mut fields = Row::new();
        fields.insert("updated_at".to_string(), Value::from(bump(prev_updated_at)));
        backend.update(EntityKind::List, list_id, fields)
    }

    /// Fill the derived rating: mean of the attached places' ratings,
    /// skipping places with none.
    fn hydrate(&self, mut list: List) -> Result<List> {
        let backend = self.store.backend()?;
        let items = self.items(&list.id)?;
        let mut ratings = Vec::with_capacity(items.len());
        for item in &items {
            if let Some(row) =
                backend.get_one(EntityKind::Place, &Filter::by_id(&item.place_id))?
            {
                let place: Place = from_row(row)?;
                ratings.push(aggregate::place_rating(
                    place.rating_mode,
                    place.overall_rating_manual,
                ));
            }
        }
        list.overall_rating = aggregate::list_rating(&ratings);
        Ok(list)
    }
}
