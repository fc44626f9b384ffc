//! Entity repositories: the sole public contract other layers call.
//!
//! One repository per entity type, each implementing create/read/update/
//! delete plus the entity-specific helpers, built atop the backend
//! contract. Repositories validate and shape calls, delegate reads and
//! writes to whichever adapter is active, fire cascades through the
//! integrity controller on deletes, and recompute derived fields through
//! the aggregation engine on reads.

mod author;
mod category;
mod dish;
mod list;
mod place;
mod tag;
mod visit;

pub use author::AuthorRepo;
pub use category::CategoryRepo;
pub use dish::DishRepo;
pub use list::ListRepo;
pub use place::PlaceRepo;
pub use tag::TagRepo;
pub use visit::VisitRepo;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::storage::types::Row;

/// Serialize an entity into a backend row.
pub(crate) fn to_row<T: Serialize>(entity: &T) -> Result<Row> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Storage(format!(
            "Entity did not serialize to an object: {}",
            other
        ))),
    }
}

/// Deserialize a backend row into an entity. Derived (`#[serde(skip)]`)
/// fields come back defaulted; hydration fills them afterwards.
pub(crate) fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}
