//! Referential integrity controller.
//!
//! The relational engine enforces foreign-key actions declared in its
//! schema; the flat adapter gets nothing for free. Instead of duplicating
//! the rules ad hoc per delete function, they live in one declarative
//! table consumed from both sides: the relational adapter generates its
//! `FOREIGN KEY ... ON DELETE` clauses from it, and the flat path walks it
//! depth-first, removing children before parents so an interrupted cascade
//! never leaves a dangling reference.
//!
//! Deliberately absent: rules from `Category` to `places.category_id` /
//! `dishes.category_id`. Deleting a category leaves those references
//! dangling; only child categories have their `parent_id` set to null.

use crate::error::{Result, StoreError};
use crate::storage::traits::StorageBackend;
use crate::storage::types::{EntityKind, Filter, Row};

/// What happens to a child row when its parent is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    /// Remove the child row (and its own dependents, recursively).
    Delete,
    /// Null out the child's foreign-key column.
    SetNull,
}

/// One parent-to-child referential rule.
#[derive(Debug, Clone, Copy)]
pub struct CascadeRule {
    pub parent: EntityKind,
    pub child: EntityKind,
    pub foreign_key: &'static str,
    pub action: ReferentialAction,
}

const fn rule(
    parent: EntityKind,
    child: EntityKind,
    foreign_key: &'static str,
    action: ReferentialAction,
) -> CascadeRule {
    CascadeRule {
        parent,
        child,
        foreign_key,
        action,
    }
}

/// The single source of truth for referential actions across backends.
pub const CASCADE_RULES: &[CascadeRule] = &[
    rule(
        EntityKind::List,
        EntityKind::ListItem,
        "list_id",
        ReferentialAction::Delete,
    ),
    rule(
        EntityKind::Place,
        EntityKind::ListItem,
        "place_id",
        ReferentialAction::Delete,
    ),
    rule(
        EntityKind::Place,
        EntityKind::Visit,
        "place_id",
        ReferentialAction::Delete,
    ),
    rule(
        EntityKind::Visit,
        EntityKind::Dish,
        "visit_id",
        ReferentialAction::Delete,
    ),
    rule(
        EntityKind::Category,
        EntityKind::Category,
        "parent_id",
        ReferentialAction::SetNull,
    ),
];

/// Rules where `kind` is the child, used for schema generation.
pub fn rules_for_child(kind: EntityKind) -> impl Iterator<Item = &'static CascadeRule> {
    CASCADE_RULES.iter().filter(move |r| r.child == kind)
}

/// Rules where `kind` is the parent, used by the flat-path walker.
pub fn rules_for_parent(kind: EntityKind) -> impl Iterator<Item = &'static CascadeRule> {
    CASCADE_RULES.iter().filter(move |r| r.parent == kind)
}

/// Delete an entity and apply every referential action it implies.
///
/// On an engine that enforces foreign keys the parent delete is enough;
/// the declared actions (including tag-membership join rows) fire inside
/// the engine. Otherwise the cascade table is replayed manually,
/// children first.
pub fn delete_with_cascades(
    backend: &dyn StorageBackend,
    kind: EntityKind,
    id: &str,
) -> Result<()> {
    if backend.enforces_foreign_keys() {
        backend.delete(kind, id)
    } else {
        cascade(backend, kind, id)
    }
}

fn row_id(kind: EntityKind, row: &Row) -> Result<String> {
    row.get("id")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::Storage(format!("{} row without id", kind.table())))
}

fn cascade(backend: &dyn StorageBackend, kind: EntityKind, id: &str) -> Result<()> {
    for rule in rules_for_parent(kind) {
        match rule.action {
            ReferentialAction::Delete => {
                let children = backend.get_many(
                    rule.child,
                    &Filter::new().eq(rule.foreign_key, id),
                    None,
                )?;
                for child in children {
                    cascade(backend, rule.child, &row_id(rule.child, &child)?)?;
                }
            }
            ReferentialAction::SetNull => {
                backend.set_null(rule.child, rule.foreign_key, id)?;
            }
        }
    }

    // Tag membership is kept in per-place slots on this path, not rows.
    match kind {
        EntityKind::Place => backend.clear_place_tags(id)?,
        EntityKind::Tag => backend.detach_tag_everywhere(id)?,
        _ => {}
    }

    backend.delete(kind, id)
}
