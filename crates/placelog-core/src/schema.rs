//! Schema manager: table creation, additive migrations, default taxonomy.
//!
//! Runs once at store initialization, before any repository call is
//! accepted. Migrations are additive and idempotent: "column already
//! exists" / "no such column" failures are expected on stores that are
//! already up to date and are swallowed (logged at debug level); any other
//! failure is logged and surfaced.

use std::collections::HashSet;

use crate::error::{Result, StoreError};
use crate::id::{new_id, now_ms};
use crate::model::{Category, CategoryKind};
use crate::storage::traits::StorageBackend;
use crate::storage::types::{ColumnDef, ColumnType, EntityKind, Filter, Row};

/// Place categories seeded into every fresh store. Custom categories the
/// user added are never touched: seeding only inserts names not already
/// present for type=place.
pub const DEFAULT_PLACE_CATEGORIES: &[&str] = &[
    "Restaurant",
    "Café",
    "Bar",
    "Bakery",
    "Street Food",
    "Dessert",
];

enum MigrationStep {
    AddColumn(EntityKind, ColumnDef),
    DropColumn(EntityKind, &'static str),
}

struct Migration {
    name: &'static str,
    step: MigrationStep,
}

/// Ordered migration history. New entries are appended, never edited:
/// every step must stay safe to re-run against a store of any age.
const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "places_add_cover_image_uri",
        step: MigrationStep::AddColumn(
            EntityKind::Place,
            ColumnDef {
                name: "cover_image_uri",
                ty: ColumnType::Text,
                nullable: true,
            },
        ),
    },
    Migration {
        name: "lists_add_city",
        step: MigrationStep::AddColumn(
            EntityKind::List,
            ColumnDef {
                name: "city",
                ty: ColumnType::Text,
                nullable: true,
            },
        ),
    },
    Migration {
        // Ratings are derived on read now; the stored column is legacy.
        name: "places_drop_rating",
        step: MigrationStep::DropColumn(EntityKind::Place, "rating"),
    },
];

/// Bring the backend fully up to date: create tables, apply migrations,
/// seed the default taxonomy.
pub fn initialize(backend: &dyn StorageBackend) -> Result<()> {
    backend.create_schema()?;
    run_migrations(backend)?;
    seed_default_categories(backend)?;
    Ok(())
}

fn is_already_applied(err: &StoreError) -> bool {
    match err {
        StoreError::Storage(message) => {
            message.contains("duplicate column name") || message.contains("no such column")
        }
        _ => false,
    }
}

fn run_migrations(backend: &dyn StorageBackend) -> Result<()> {
    for migration in MIGRATIONS {
        let outcome = match &migration.step {
            MigrationStep::AddColumn(kind, column) => backend.add_column(*kind, column),
            MigrationStep::DropColumn(kind, name) => backend.drop_column(*kind, name),
        };
        match outcome {
            Ok(()) => {}
            Err(err) if is_already_applied(&err) => {
                tracing::debug!(migration = migration.name, "already applied; skipping");
            }
            Err(err) => {
                tracing::error!(migration = migration.name, error = %err, "migration failed");
                return Err(err);
            }
        }
    }
    Ok(())
}

fn seed_default_categories(backend: &dyn StorageBackend) -> Result<()> {
    let existing: HashSet<String> = backend
        .get_many(
            EntityKind::Category,
            &Filter::new().eq("type", "place"),
            None,
        )?
        .iter()
        .filter_map(|row| row.get("name").and_then(serde_json::Value::as_str))
        .map(str::to_string)
        .collect();

    for (i, name) in DEFAULT_PLACE_CATEGORIES.iter().enumerate() {
        if existing.contains(*name) {
            continue;
        }
        let category = Category {
            id: new_id(),
            name: (*name).to_string(),
            kind: CategoryKind::Place,
            parent_id: None,
            order: ((i + 1) * 10) as i64,
            created_at: now_ms(),
        };
        let value = serde_json::to_value(&category)?;
        let row: Row = match value {
            serde_json::Value::Object(map) => map,
            _ => return Err(StoreError::Storage("Category did not serialize to an object".to_string())),
        };
        backend.insert(EntityKind::Category, row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::flat::FlatBackend;
    use crate::storage::sqlite::SqliteBackend;

    fn place_category_names(backend: &dyn StorageBackend) -> Vec<String> {
        backend
            .get_many(
                EntityKind::Category,
                &Filter::new().eq("type", "place"),
                None,
            )
            .unwrap()
            .iter()
            .filter_map(|row| row.get("name").and_then(serde_json::Value::as_str))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_seeding_is_idempotent_on_flat() {
        let backend = FlatBackend::in_memory();
        initialize(&backend).unwrap();
        initialize(&backend).unwrap();

        let names = place_category_names(&backend);
        assert_eq!(names.len(), DEFAULT_PLACE_CATEGORIES.len());
    }

    #[test]
    fn test_seeding_preserves_custom_categories() {
        let backend = FlatBackend::in_memory();
        initialize(&backend).unwrap();

        let custom = Category {
            id: new_id(),
            name: "Izakaya".to_string(),
            kind: CategoryKind::Place,
            parent_id: None,
            order: 99,
            created_at: now_ms(),
        };
        let row = match serde_json::to_value(&custom).unwrap() {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        backend.insert(EntityKind::Category, row).unwrap();

        initialize(&backend).unwrap();
        let names = place_category_names(&backend);
        assert_eq!(names.len(), DEFAULT_PLACE_CATEGORIES.len() + 1);
        assert_eq!(
            names.iter().filter(|n| *n == "Izakaya").count(),
            1
        );
    }

    #[test]
    fn test_initialize_twice_swallows_migration_errors_on_sqlite() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        // Second run hits "duplicate column name" / "no such column" for
        // every migration and must still succeed.
        initialize(&backend).unwrap();
        initialize(&backend).unwrap();

        let names = place_category_names(&backend);
        assert_eq!(names.len(), DEFAULT_PLACE_CATEGORIES.len());
    }
}
