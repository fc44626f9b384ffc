//! Relational storage adapter backed by SQLite.
//!
//! Executes parameterized statements built from the shared column
//! declarations. Foreign-key cascade and set-null behavior is declared in
//! the generated schema and enforced by the engine itself; the integrity
//! controller issues only the parent delete on this adapter.
//!
//! Identifiers are always double-quoted in generated SQL because the
//! `order` column collides with a reserved keyword.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::integrity::{self, ReferentialAction};
use crate::storage::traits::StorageBackend;
use crate::storage::types::{ColumnDef, ColumnType, EntityKind, Filter, OrderBy, Row};

/// SQLite-backed storage adapter. The single connection handle is owned
/// here exclusively and never exposed to repositories.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

fn sqlite_error(err: rusqlite::Error) -> StoreError {
    StoreError::Storage(format!("SQLite error: {}", err))
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident)
}

fn sql_type(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::Text => "TEXT",
        ColumnType::Integer => "INTEGER",
        ColumnType::Real => "REAL",
    }
}

fn to_sql_value(value: &Value) -> Result<rusqlite::types::Value> {
    use rusqlite::types::Value as Sql;
    match value {
        Value::Null => Ok(Sql::Null),
        Value::Bool(b) => Ok(Sql::Integer(i64::from(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Sql::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Sql::Real(f))
            } else {
                Err(StoreError::Storage(format!(
                    "Unsupported numeric parameter: {}",
                    n
                )))
            }
        }
        Value::String(s) => Ok(Sql::Text(s.clone())),
        other => Err(StoreError::Storage(format!(
            "Unsupported parameter value: {}",
            other
        ))),
    }
}

fn from_sql_value(value: rusqlite::types::Value) -> Value {
    use rusqlite::types::Value as Sql;
    match value {
        Sql::Null => Value::Null,
        Sql::Integer(i) => Value::from(i),
        Sql::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Sql::Text(s) => Value::String(s),
        Sql::Blob(_) => Value::Null,
    }
}

impl SqliteBackend {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(sqlite_error)?;
        Self::configure(conn)
    }

    /// Open an in-memory database (tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sqlite_error)?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(sqlite_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Storage("SQLite connection poisoned".to_string()))
    }

    fn create_table_sql(kind: EntityKind) -> String {
        let mut parts: Vec<String> = Vec::new();
        for (i, column) in kind.columns().iter().enumerate() {
            let mut part = format!("{} {}", quote(column.name), sql_type(column.ty));
            if i == 0 {
                part.push_str(" PRIMARY KEY");
            } else if !column.nullable {
                part.push_str(" NOT NULL");
            }
            parts.push(part);
        }
        // Foreign keys come from the one declarative cascade table, so the
        // engine-enforced actions and the flat-path walker cannot diverge.
        for rule in integrity::rules_for_child(kind) {
            let action = match rule.action {
                ReferentialAction::Delete => "CASCADE",
                ReferentialAction::SetNull => "SET NULL",
            };
            parts.push(format!(
                "FOREIGN KEY({}) REFERENCES {}(\"id\") ON DELETE {}",
                quote(rule.foreign_key),
                quote(rule.parent.table()),
                action
            ));
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote(kind.table()),
            parts.join(", ")
        )
    }

    fn select_clauses(filter: &Filter) -> Result<(String, Vec<rusqlite::types::Value>)> {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<rusqlite::types::Value> = Vec::new();
        for (column, value) in filter.clauses() {
            if value.is_null() {
                conditions.push(format!("{} IS NULL", quote(column)));
            } else {
                conditions.push(format!("{} = ?", quote(column)));
                params.push(to_sql_value(value)?);
            }
        }
        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        Ok((clause, params))
    }

    fn query_rows(
        &self,
        kind: EntityKind,
        filter: &Filter,
        order: Option<OrderBy>,
        limit: Option<usize>,
    ) -> Result<Vec<Row>> {
        let columns = kind.columns();
        let projection = columns
            .iter()
            .map(|c| quote(c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let (where_clause, params) = Self::select_clauses(filter)?;

        let mut sql = format!(
            "SELECT {} FROM {}{}",
            projection,
            quote(kind.table()),
            where_clause
        );
        if let Some(order) = order {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                quote(order.column),
                if order.descending { "DESC" } else { "ASC" }
            ));
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(sqlite_error)?;
        let raw_rows = stmt
            .query_map(params_from_iter(params), |row| {
                let mut values = Vec::with_capacity(columns.len());
                for i in 0..columns.len() {
                    values.push(row.get::<_, rusqlite::types::Value>(i)?);
                }
                Ok(values)
            })
            .map_err(sqlite_error)?;

        let mut rows = Vec::new();
        for raw in raw_rows {
            let values = raw.map_err(sqlite_error)?;
            let mut row = Row::new();
            for (column, value) in columns.iter().zip(values) {
                row.insert(column.name.to_string(), from_sql_value(value));
            }
            rows.push(row);
        }
        Ok(rows)
    }

    fn exists(&self, kind: EntityKind, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let found: Option<i64> = conn
            .query_row(
                &format!(
                    "SELECT 1 FROM {} WHERE \"id\" = ?",
                    quote(kind.table())
                ),
                [id],
                |row| row.get(0),
            )
            .optional()
            .map_err(sqlite_error)?;
        Ok(found.is_some())
    }
}

impl StorageBackend for SqliteBackend {
    fn enforces_foreign_keys(&self) -> bool {
        true
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        for kind in EntityKind::ALL {
            conn.execute_batch(&Self::create_table_sql(kind))
                .map_err(sqlite_error)?;
        }
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS "place_tags" (
                "place_id" TEXT NOT NULL,
                "tag_id" TEXT NOT NULL,
                PRIMARY KEY("place_id", "tag_id"),
                FOREIGN KEY("place_id") REFERENCES "places"("id") ON DELETE CASCADE,
                FOREIGN KEY("tag_id") REFERENCES "tags"("id") ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS "idx_list_items_list_id" ON "list_items"("list_id");
            CREATE INDEX IF NOT EXISTS "idx_list_items_place_id" ON "list_items"("place_id");
            CREATE INDEX IF NOT EXISTS "idx_visits_place_id" ON "visits"("place_id");
            CREATE INDEX IF NOT EXISTS "idx_dishes_visit_id" ON "dishes"("visit_id");
            CREATE INDEX IF NOT EXISTS "idx_place_tags_tag_id" ON "place_tags"("tag_id");
            "#,
        )
        .map_err(sqlite_error)?;
        Ok(())
    }

    fn insert(&self, kind: EntityKind, row: Row) -> Result<()> {
        let columns = kind.columns();
        let mut params: Vec<rusqlite::types::Value> = Vec::with_capacity(columns.len());
        for column in columns {
            let value = row.get(column.name).unwrap_or(&Value::Null);
            params.push(to_sql_value(value)?);
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(kind.table()),
            columns
                .iter()
                .map(|c| quote(c.name))
                .collect::<Vec<_>>()
                .join(", "),
            vec!["?"; columns.len()].join(", ")
        );
        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(params))
            .map_err(sqlite_error)?;
        Ok(())
    }

    fn update(&self, kind: EntityKind, id: &str, fields: Row) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        for key in fields.keys() {
            if !kind.columns().iter().any(|c| c.name == key) {
                return Err(StoreError::Storage(format!(
                    "Unknown column {} for table {}",
                    key,
                    kind.table()
                )));
            }
        }
        if !self.exists(kind, id)? {
            return Err(StoreError::NotFound(format!(
                "{} with id {}",
                kind.table(),
                id
            )));
        }

        let mut assignments: Vec<String> = Vec::new();
        let mut params: Vec<rusqlite::types::Value> = Vec::new();
        for (key, value) in &fields {
            assignments.push(format!("{} = ?", quote(key)));
            params.push(to_sql_value(value)?);
        }
        params.push(rusqlite::types::Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE \"id\" = ?",
            quote(kind.table()),
            assignments.join(", ")
        );
        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(params))
            .map_err(sqlite_error)?;
        Ok(())
    }

    fn delete(&self, kind: EntityKind, id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!("DELETE FROM {} WHERE \"id\" = ?", quote(kind.table())),
            [id],
        )
        .map_err(sqlite_error)?;
        Ok(())
    }

    fn get_one(&self, kind: EntityKind, filter: &Filter) -> Result<Option<Row>> {
        Ok(self
            .query_rows(kind, filter, None, Some(1))?
            .into_iter()
            .next())
    }

    fn get_many(
        &self,
        kind: EntityKind,
        filter: &Filter,
        order: Option<OrderBy>,
    ) -> Result<Vec<Row>> {
        self.query_rows(kind, filter, order, None)
    }

    fn set_null(&self, kind: EntityKind, column: &'static str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "UPDATE {} SET {} = NULL WHERE {} = ?",
                quote(kind.table()),
                quote(column),
                quote(column)
            ),
            [value],
        )
        .map_err(sqlite_error)?;
        Ok(())
    }

    fn tags_for_place(&self, place_id: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT \"tag_id\" FROM \"place_tags\" WHERE \"place_id\" = ? ORDER BY \"tag_id\" ASC",
            )
            .map_err(sqlite_error)?;
        let rows = stmt
            .query_map([place_id], |row| row.get::<_, String>(0))
            .map_err(sqlite_error)?;
        let mut tag_ids = Vec::new();
        for row in rows {
            tag_ids.push(row.map_err(sqlite_error)?);
        }
        Ok(tag_ids)
    }

    fn attach_tag(&self, place_id: &str, tag_id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO \"place_tags\" (\"place_id\", \"tag_id\") VALUES (?, ?)",
            [place_id, tag_id],
        )
        .map_err(sqlite_error)?;
        Ok(())
    }

    fn detach_tag(&self, place_id: &str, tag_id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM \"place_tags\" WHERE \"place_id\" = ? AND \"tag_id\" = ?",
            [place_id, tag_id],
        )
        .map_err(sqlite_error)?;
        Ok(())
    }

    fn clear_place_tags(&self, place_id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM \"place_tags\" WHERE \"place_id\" = ?",
            [place_id],
        )
        .map_err(sqlite_error)?;
        Ok(())
    }

    fn detach_tag_everywhere(&self, tag_id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM \"place_tags\" WHERE \"tag_id\" = ?", [tag_id])
            .map_err(sqlite_error)?;
        Ok(())
    }

    fn add_column(&self, kind: EntityKind, column: &ColumnDef) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            quote(kind.table()),
            quote(column.name),
            sql_type(column.ty)
        ))
        .map_err(sqlite_error)?;
        Ok(())
    }

    fn drop_column(&self, kind: EntityKind, name: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(&format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote(kind.table()),
            quote(name)
        ))
        .map_err(sqlite_error)?;
        Ok(())
    }
}
