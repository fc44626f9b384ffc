//! # Placelog Core
//!
//! Core library for Placelog - a local-first journal of places, visits and
//! dishes.
//!
//! This crate provides the persistence layer and domain logic independent
//! of the CLI interface.
//!
//! ## Architecture
//!
//! - **model**: Domain entities, creation builders and update patches
//! - **storage**: Backend contract plus the relational and flat adapters
//! - **schema**: Table creation, idempotent migrations, default taxonomy
//! - **repo**: Entity repositories, the public contract callers use
//! - **integrity**: Declarative cascade rules applied on delete
//! - **aggregate**: Read-time rating derivation for places and lists
//!
//! Open a ready store with [`Store::open`]; it probes for a relational
//! engine and falls back to flat file collections, so callers never branch
//! on the backend in use.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod integrity;
pub mod model;
pub mod repo;
pub mod schema;
pub mod storage;
pub mod store;

pub use error::{Result, StoreError};
pub use model::{
    Author, Category, CategoryKind, CategoryPatch, Dish, DishPatch, List, ListItem, ListPatch,
    NewAuthor, NewCategory, NewDish, NewList, NewPlace, NewTag, NewVisit, Place, PlacePatch,
    RatingMode, Tag, TagPatch, Visit, VisitPatch,
};
pub use storage::{FlatBackend, SqliteBackend, StorageBackend};
pub use store::Store;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
