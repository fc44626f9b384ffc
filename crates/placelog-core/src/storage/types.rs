//! Core data types for the storage layer.
//!
//! `EntityKind` is the single declaration of the persisted shape: table and
//! slot names plus column definitions. The relational adapter generates its
//! DDL and parameterized statements from these declarations; the flat
//! adapter uses the same names for its collection slots. Rows travel
//! between repositories and adapters as JSON maps keyed by column name.

use std::cmp::Ordering;

use serde_json::Value;

/// A row as seen by the backend contract: column name to JSON value.
pub type Row = serde_json::Map<String, Value>;

/// The entity types the store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Author,
    Place,
    List,
    ListItem,
    Visit,
    Dish,
    Category,
    Tag,
}

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
}

/// Declaration of a single persisted column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
}

const fn col(name: &'static str, ty: ColumnType) -> ColumnDef {
    ColumnDef {
        name,
        ty,
        nullable: false,
    }
}

const fn nullable(name: &'static str, ty: ColumnType) -> ColumnDef {
    ColumnDef {
        name,
        ty,
        nullable: true,
    }
}

use ColumnType::{Integer, Real, Text};

const AUTHOR_COLUMNS: &[ColumnDef] = &[
    col("id", Text),
    col("display_name", Text),
    nullable("avatar_uri", Text),
    col("created_at", Integer),
];

const PLACE_COLUMNS: &[ColumnDef] = &[
    col("id", Text),
    col("name", Text),
    nullable("address", Text),
    col("latitude", Real),
    col("longitude", Real),
    nullable("category_id", Text),
    nullable("notes", Text),
    nullable("overall_rating_manual", Real),
    col("rating_mode", Text),
    nullable("cover_image_uri", Text),
    col("created_at", Integer),
    col("updated_at", Integer),
];

const LIST_COLUMNS: &[ColumnDef] = &[
    col("id", Text),
    col("name", Text),
    nullable("description", Text),
    nullable("category", Text),
    nullable("city", Text),
    col("created_at", Integer),
    col("updated_at", Integer),
];

const LIST_ITEM_COLUMNS: &[ColumnDef] = &[
    col("id", Text),
    col("list_id", Text),
    col("place_id", Text),
    // Collides with an SQL keyword; the relational adapter always quotes
    // identifiers.
    col("order", Integer),
    col("created_at", Integer),
];

const VISIT_COLUMNS: &[ColumnDef] = &[
    col("id", Text),
    col("place_id", Text),
    nullable("notes", Text),
    nullable("photo_uri", Text),
    col("created_at", Integer),
    col("updated_at", Integer),
];

const DISH_COLUMNS: &[ColumnDef] = &[
    col("id", Text),
    col("visit_id", Text),
    col("name", Text),
    nullable("category_id", Text),
    col("rating", Integer),
    nullable("notes", Text),
    nullable("photo_uri", Text),
    col("created_at", Integer),
    col("updated_at", Integer),
];

const CATEGORY_COLUMNS: &[ColumnDef] = &[
    col("id", Text),
    col("name", Text),
    col("type", Text),
    nullable("parent_id", Text),
    col("order", Integer),
    col("created_at", Integer),
];

const TAG_COLUMNS: &[ColumnDef] = &[
    col("id", Text),
    col("name", Text),
    nullable("color", Text),
    col("created_at", Integer),
];

impl EntityKind {
    /// All persisted entity kinds.
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Author,
        EntityKind::Place,
        EntityKind::List,
        EntityKind::ListItem,
        EntityKind::Visit,
        EntityKind::Dish,
        EntityKind::Category,
        EntityKind::Tag,
    ];

    /// Table name (relational adapter) and slot name (flat adapter).
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Author => "author",
            EntityKind::Place => "places",
            EntityKind::List => "lists",
            EntityKind::ListItem => "list_items",
            EntityKind::Visit => "visits",
            EntityKind::Dish => "dishes",
            EntityKind::Category => "categories",
            EntityKind::Tag => "tags",
        }
    }

    /// Persisted column declarations, in table order. The first column is
    /// always the `id` primary key.
    pub fn columns(self) -> &'static [ColumnDef] {
        match self {
            EntityKind::Author => AUTHOR_COLUMNS,
            EntityKind::Place => PLACE_COLUMNS,
            EntityKind::List => LIST_COLUMNS,
            EntityKind::ListItem => LIST_ITEM_COLUMNS,
            EntityKind::Visit => VISIT_COLUMNS,
            EntityKind::Dish => DISH_COLUMNS,
            EntityKind::Category => CATEGORY_COLUMNS,
            EntityKind::Tag => TAG_COLUMNS,
        }
    }
}

/// Conjunctive equality predicate over row columns.
///
/// Both adapters honor the same semantics: a row matches when every clause
/// column equals the clause value. A `Value::Null` clause matches rows where
/// the column is null or absent.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(&'static str, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for the common lookup-by-id filter.
    pub fn by_id(id: &str) -> Self {
        Self::new().eq("id", id)
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.clauses.push((column, value.into()));
        self
    }

    pub fn clauses(&self) -> &[(&'static str, Value)] {
        &self.clauses
    }

    /// In-memory evaluation, used by the flat adapter.
    pub fn matches(&self, row: &Row) -> bool {
        self.clauses.iter().all(|(column, expected)| {
            let actual = row.get(*column).unwrap_or(&Value::Null);
            actual == expected
        })
    }
}

/// Single-column sort order.
#[derive(Debug, Clone, Copy)]
pub struct OrderBy {
    pub column: &'static str,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// Total order over the JSON values the store persists. Nulls sort first,
/// matching SQLite's default ordering.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
