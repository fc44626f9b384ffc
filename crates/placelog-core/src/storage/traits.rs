//! Storage backend trait definition.
//!
//! The `StorageBackend` trait is the uniform execute/query contract the
//! repositories run against. Two implementations exist: the relational
//! adapter (SQLite) and the flat adapter (serialized collections under
//! named slots). Repositories never branch on which one is active; the
//! referential integrity controller is the only consumer of the
//! `enforces_foreign_keys` capability flag.

use crate::error::Result;
use crate::storage::types::{ColumnDef, EntityKind, Filter, OrderBy, Row};

/// Uniform storage contract over the relational and flat adapters.
///
/// All implementations must ensure:
/// - `delete` is idempotent (deleting a missing id is not an error)
/// - `update` fails with `StoreError::NotFound` for a missing id
/// - `get_many` honors the same predicate and ordering semantics in both
///   adapters
pub trait StorageBackend: Send + Sync {
    /// Whether the underlying engine enforces the declared foreign-key
    /// actions itself. When false, the integrity controller replays the
    /// cascade rules manually.
    fn enforces_foreign_keys(&self) -> bool;

    /// Create tables/slots for every entity kind, if absent.
    fn create_schema(&self) -> Result<()>;

    /// Insert a full row. The row must carry every non-nullable column.
    fn insert(&self, kind: EntityKind, row: Row) -> Result<()>;

    /// Overwrite the given columns of the row with the given id.
    fn update(&self, kind: EntityKind, id: &str, fields: Row) -> Result<()>;

    /// Delete the row with the given id, if it exists.
    fn delete(&self, kind: EntityKind, id: &str) -> Result<()>;

    /// First row matching the predicate, if any.
    fn get_one(&self, kind: EntityKind, filter: &Filter) -> Result<Option<Row>>;

    /// All rows matching the predicate, optionally sorted.
    fn get_many(
        &self,
        kind: EntityKind,
        filter: &Filter,
        order: Option<OrderBy>,
    ) -> Result<Vec<Row>>;

    /// Set `column` to null on every row where it currently equals `value`.
    /// Used for set-null referential actions on the flat path.
    fn set_null(&self, kind: EntityKind, column: &'static str, value: &str) -> Result<()>;

    // --- Tag membership (places <-> tags) ---
    //
    // The relational adapter backs these with a join table; the flat
    // adapter keeps one serialized set per place, keyed by place id.

    /// Tag ids attached to a place, sorted ascending.
    fn tags_for_place(&self, place_id: &str) -> Result<Vec<String>>;

    /// Attach a tag to a place. Attaching an already-attached tag is a
    /// no-op.
    fn attach_tag(&self, place_id: &str, tag_id: &str) -> Result<()>;

    /// Detach a tag from a place, if attached.
    fn detach_tag(&self, place_id: &str, tag_id: &str) -> Result<()>;

    /// Remove every tag link of a place (place deletion).
    fn clear_place_tags(&self, place_id: &str) -> Result<()>;

    /// Remove a tag from every place's membership set (tag deletion).
    fn detach_tag_everywhere(&self, tag_id: &str) -> Result<()>;

    // --- Schema evolution hooks ---
    //
    // The flat adapter stores schemaless JSON maps, so both hooks are
    // no-ops there; missing keys deserialize as null.

    /// Add a nullable column. Surfaces the engine's "column already
    /// exists" error verbatim; the schema manager decides to swallow it.
    fn add_column(&self, kind: EntityKind, column: &ColumnDef) -> Result<()>;

    /// Drop a column. Surfaces "no such column" verbatim, as above.
    fn drop_column(&self, kind: EntityKind, name: &str) -> Result<()>;
}
