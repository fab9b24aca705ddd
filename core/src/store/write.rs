//! Writing tables. Only fixture builders and the synthetic-run generator
//! write; the query layer itself is read-only.

use super::{quote_ident, SimDatabase};
use crate::{error::QueryResult, frame::Frame};
use rusqlite::params_from_iter;

impl SimDatabase {
    /// Create the core Cyclus tables if they do not exist yet.
    pub fn create_schema(&self) -> QueryResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_cyclus_core.sql"))?;
        Ok(())
    }

    /// Append every row of `frame` to table `name`, creating the table
    /// (untyped columns) when it does not exist.
    pub fn write_frame(&self, name: &str, frame: &Frame) -> QueryResult<()> {
        let table = quote_ident(name)?;
        let cols = frame
            .columns()
            .iter()
            .map(|c| quote_ident(c))
            .collect::<QueryResult<Vec<_>>>()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} ({});",
            cols.join(", ")
        ))?;
        {
            let marks = vec!["?"; cols.len()].join(", ");
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} ({}) VALUES ({marks})",
                cols.join(", ")
            ))?;
            for row in frame.rows() {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;
        log::debug!("wrote {} rows to {name}", frame.len());
        Ok(())
    }
}
