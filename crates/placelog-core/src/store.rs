//! Store lifecycle and repository access.
//!
//! A [`Store`] owns its backend exclusively and fails closed: every
//! repository call made before [`Store::initialize`] completes is rejected
//! with [`StoreError::Uninitialized`]. Repositories are lightweight handles
//! borrowed from the store; no caller ever reaches the backend or raw
//! storage directly.

use std::path::Path;

use crate::error::{Result, StoreError};
use crate::repo::{
    AuthorRepo, CategoryRepo, DishRepo, ListRepo, PlaceRepo, TagRepo, VisitRepo,
};
use crate::schema;
use crate::storage::{self, StorageBackend};

/// The local-first place/visit/dish store.
pub struct Store {
    backend: Box<dyn StorageBackend>,
    initialized: bool,
}

impl Store {
    /// Wrap a backend without initializing it. Repository calls fail with
    /// [`StoreError::Uninitialized`] until [`Store::initialize`] runs.
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            initialized: false,
        }
    }

    /// Run the schema manager: create tables, apply migrations, seed the
    /// default taxonomy. Must complete before any repository call.
    pub fn initialize(&mut self) -> Result<()> {
        schema::initialize(self.backend.as_ref())?;
        self.initialized = true;
        Ok(())
    }

    /// Open a ready-to-use store in `dir`, selecting the backend by
    /// capability probing (relational preferred, flat fallback).
    pub fn open(dir: &Path) -> Result<Self> {
        let backend = storage::detect_backend(dir)?;
        let mut store = Self::new(backend);
        store.initialize()?;
        Ok(store)
    }

    pub(crate) fn backend(&self) -> Result<&dyn StorageBackend> {
        if !self.initialized {
            return Err(StoreError::Uninitialized);
        }
        Ok(self.backend.as_ref())
    }

    pub fn author(&self) -> AuthorRepo<'_> {
        AuthorRepo { store: self }
    }

    pub fn places(&self) -> PlaceRepo<'_> {
        PlaceRepo { store: self }
    }

    pub fn lists(&self) -> ListRepo<'_> {
        ListRepo { store: self }
    }

    pub fn visits(&self) -> VisitRepo<'_> {
        VisitRepo { store: self }
    }

    pub fn dishes(&self) -> DishRepo<'_> {
        DishRepo { store: self }
    }

    pub fn categories(&self) -> CategoryRepo<'_> {
        CategoryRepo { store: self }
    }

    pub fn tags(&self) -> TagRepo<'_> {
        TagRepo { store: self }
    }
}
