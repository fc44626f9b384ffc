//! Storage backends and the uniform contract repositories run against.
//!
//! Two interchangeable adapters implement [`StorageBackend`]: the
//! relational adapter (SQLite) and the flat adapter (serialized JSON
//! collections under named slots). The adapter is selected once at startup
//! by [`detect_backend`].

pub mod flat;
pub mod sqlite;
pub mod traits;
pub mod types;

use std::path::Path;

use crate::error::Result;

pub use flat::{FileSlotStore, FlatBackend, MemorySlotStore, SlotStore};
pub use sqlite::SqliteBackend;
pub use traits::StorageBackend;
pub use types::{ColumnDef, ColumnType, EntityKind, Filter, OrderBy, Row};

/// Name of the relational database file inside the data directory.
pub const DB_FILE: &str = "placelog.db";

/// Select a backend for `dir` by capability probing: prefer the relational
/// engine, fall back to flat JSON slots in the same directory when it is
/// unavailable.
pub fn detect_backend(dir: &Path) -> Result<Box<dyn StorageBackend>> {
    std::fs::create_dir_all(dir)?;
    match SqliteBackend::open(&dir.join(DB_FILE)) {
        Ok(backend) => Ok(Box::new(backend)),
        Err(err) => {
            tracing::warn!(error = %err, "relational engine unavailable; using flat storage");
            Ok(Box::new(FlatBackend::on_disk(dir)?))
        }
    }
}
