//! SQLite access to a Cyclus output database.
//!
//! RULE: Only the store talks to the database.
//! Metrics and filters ask the store for named tables; they never build SQL.

mod write;

use crate::{
    condition::Condition,
    error::{QueryError, QueryResult},
    frame::Frame,
    value::Value,
};
use rusqlite::{
    params_from_iter,
    types::{ToSql, ToSqlOutput, ValueRef},
    Connection, OpenFlags,
};

pub struct SimDatabase {
    conn: Connection,
    path: Option<String>, // None for :memory:
}

impl SimDatabase {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> QueryResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        Ok(Self { conn, path: Some(path.to_string()) })
    }

    /// Open an existing run for reading only.
    pub fn open_read_only(path: &str) -> QueryResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
        )?;
        Ok(Self { conn, path: Some(path.to_string()) })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> QueryResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    // ── Introspection ──────────────────────────────────────────

    /// Names of all tables in the run, sorted.
    pub fn tables(&self) -> QueryResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn has_table(&self, name: &str) -> QueryResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Column names of `name`, in declaration order.
    pub fn columns(&self, name: &str) -> QueryResult<Vec<String>> {
        let sql = format!("PRAGMA table_info({})", quote_ident(name)?);
        let mut stmt = self.conn.prepare(&sql)?;
        let cols = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cols)
    }

    // ── Query ──────────────────────────────────────────────────

    /// Read table `name`, keeping rows that satisfy every condition.
    pub fn query(&self, name: &str, conds: &[Condition]) -> QueryResult<Frame> {
        let mut sql = format!("SELECT * FROM {}", quote_ident(name)?);
        let mut clauses = Vec::new();
        let mut params: Vec<&Value> = Vec::new();
        for cond in conds {
            match cond {
                Condition::Compare { field, op, value } => {
                    clauses.push(format!("{} {} ?", quote_ident(field)?, op.sql()));
                    params.push(value);
                }
                Condition::In { values, .. } if values.is_empty() => {}
                Condition::In { field, values } => {
                    let marks = vec!["?"; values.len()].join(", ");
                    clauses.push(format!("{} IN ({marks})", quote_ident(field)?));
                    params.extend(values.iter());
                }
            }
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(Value::from))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("query {name}: {} conditions, {} rows", conds.len(), rows.len());
        Frame::from_rows(columns, rows)
    }
}

/// Double-quote an SQL identifier. Table and column names come from the
/// metric vocabulary and from users, so anything that could escape the
/// quotes is rejected.
pub(crate) fn quote_ident(ident: &str) -> QueryResult<String> {
    if ident.is_empty() || ident.contains('"') || ident.contains('\0') {
        return Err(QueryError::InvalidIdentifier { ident: ident.to_string() });
    }
    Ok(format!("\"{ident}\""))
}

impl From<ValueRef<'_>> for Value {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b.as_slice())),
        })
    }
}
