//! Author repository: the device owner's singleton profile.

use serde_json::Value;

use super::{from_row, to_row};
use crate::error::{Result, StoreError};
use crate::id::{new_id, now_ms};
use crate::model::{Author, NewAuthor};
use crate::storage::types::{EntityKind, Filter, Row};
use crate::store::Store;

/// At most one author row exists per store; `save` is an upsert.
pub struct AuthorRepo<'a> {
    pub(crate) store: &'a Store,
}

impl AuthorRepo<'_> {
    pub fn get(&self) -> Result<Option<Author>> {
        let backend = self.store.backend()?;
        match backend.get_one(EntityKind::Author, &Filter::new())? {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Create the profile, or update the existing one in place.
    pub fn save(&self, new: NewAuthor) -> Result<Author> {
        let backend = self.store.backend()?;
        if let Some(existing) = self.get()? {
            let mut fields = Row::new();
            fields.insert("display_name".to_string(), Value::from(new.display_name));
            if let Some(uri) = new.avatar_uri {
                fields.insert("avatar_uri".to_string(), Value::from(uri));
            }
            backend.update(EntityKind::Author, &existing.id, fields)?;
            self.get()?.ok_or_else(|| {
                StoreError::Storage("Author row vanished during save".to_string())
            })
        } else {
            let author = Author {
                id: new_id(),
                display_name: new.display_name,
                avatar_uri: new.avatar_uri,
                created_at: now_ms(),
            };
            backend.insert(EntityKind::Author, to_row(&author)?)?;
            Ok(author)
        }
    }

    /// Remove the profile. Idempotent.
    pub fn delete(&self) -> Result<()> {
        let backend = self.store.backend()?;
        if let Some(author) = self.get()? {
            backend.delete(EntityKind::Author, &author.id)?;
        }
        Ok(())
    }
}
