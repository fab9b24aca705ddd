//! In-memory tables and the relational steps every filter is built from.
//!
//! A `Frame` is row-major: `columns` names the cells of every row in
//! `rows`. All operations are value-in/value-out so a filter reads as a
//! straight chain of reduce, merge and rename steps.

use crate::{
    error::{QueryError, QueryResult},
    value::Value,
};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// One set-membership condition: keep rows whose `column` is in `values`.
/// An empty `values` list places no restriction on the column.
#[derive(Debug, Clone)]
pub struct Membership {
    pub column: String,
    pub values: Vec<Value>,
}

impl Membership {
    pub fn new(column: &str, values: Vec<Value>) -> Self {
        Self { column: column.to_string(), values }
    }
}

impl Frame {
    /// An empty table with the given columns.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> QueryResult<Self> {
        let mut frame = Self::new(columns);
        let mut seen = HashSet::new();
        for c in &frame.columns {
            if !seen.insert(c.as_str()) {
                return Err(QueryError::DuplicateColumn { column: c.clone() });
            }
        }
        for row in rows {
            frame.push_row(row)?;
        }
        Ok(frame)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> QueryResult<()> {
        if row.len() != self.columns.len() {
            return Err(QueryError::MalformedTable {
                table: "<frame>".into(),
                reason: format!(
                    "row has {} cells, expected {}",
                    row.len(),
                    self.columns.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> QueryResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| QueryError::ColumnNotFound {
                column: name.to_string(),
                available: self.columns.join(", "),
            })
    }

    pub fn column(&self, name: &str) -> QueryResult<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Distinct values of a column, in first-seen order.
    pub fn distinct(&self, name: &str) -> QueryResult<Vec<Value>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for v in self.column(name)? {
            if seen.insert(v) {
                out.push(v.clone());
            }
        }
        Ok(out)
    }

    pub fn value(&self, row: usize, name: &str) -> QueryResult<&Value> {
        let idx = self.column_index(name)?;
        self.rows
            .get(row)
            .map(|r| &r[idx])
            .ok_or_else(|| QueryError::MalformedTable {
                table: "<frame>".into(),
                reason: format!("row {row} out of range ({} rows)", self.rows.len()),
            })
    }

    pub fn rename(mut self, from: &str, to: &str) -> QueryResult<Self> {
        let idx = self.column_index(from)?;
        if from != to && self.has_column(to) {
            return Err(QueryError::DuplicateColumn { column: to.to_string() });
        }
        self.columns[idx] = to.to_string();
        Ok(self)
    }

    /// Project onto `names`, in that order.
    pub fn select(&self, names: &[&str]) -> QueryResult<Self> {
        let idx = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<QueryResult<Vec<_>>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| idx.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Self::from_rows(names.iter().copied(), rows)
    }

    pub fn filter_rows(mut self, mut keep: impl FnMut(&[Value]) -> bool) -> Self {
        self.rows.retain(|row| keep(row));
        self
    }

    /// Keep rows whose `column` value is in `allowed`.
    /// An empty `allowed` slice means "no restriction", not "no rows".
    pub fn filter_in(self, column: &str, allowed: &[Value]) -> QueryResult<Self> {
        let idx = self.column_index(column)?;
        if allowed.is_empty() {
            return Ok(self);
        }
        let set: HashSet<&Value> = allowed.iter().collect();
        let rows = self
            .rows
            .into_iter()
            .filter(|row| set.contains(&row[idx]))
            .collect();
        Ok(Self { columns: self.columns, rows })
    }

    /// Apply each membership condition in turn.
    pub fn reduce(self, conditions: &[Membership]) -> QueryResult<Self> {
        conditions.iter().try_fold(self, |frame, cond| {
            if cond.values.is_empty() {
                log::debug!("reduce: empty selection for {}, key ignored", cond.column);
            }
            frame.filter_in(&cond.column, &cond.values)
        })
    }

    /// Left-outer join against `right` on the `on` key columns, pulling in
    /// the non-key columns listed in `added`.
    ///
    /// Every left row appears at least once. A left row with no match gets
    /// Null in the pulled-in columns; a left row with k > 1 matches is
    /// repeated k times. Null keys never match.
    pub fn merge_left(self, on: &[&str], right: &Frame, added: &[&str]) -> QueryResult<Self> {
        let left_keys = on
            .iter()
            .map(|c| self.column_index(c))
            .collect::<QueryResult<Vec<_>>>()?;
        let right_keys = on
            .iter()
            .map(|c| right.column_index(c))
            .collect::<QueryResult<Vec<_>>>()?;
        let extra: Vec<&str> = added.iter().copied().filter(|c| !on.contains(c)).collect();
        let extra_idx = extra
            .iter()
            .map(|c| right.column_index(c))
            .collect::<QueryResult<Vec<_>>>()?;
        for c in &extra {
            if self.has_column(c) {
                return Err(QueryError::DuplicateColumn { column: c.to_string() });
            }
        }

        let mut index: HashMap<Vec<&Value>, Vec<usize>> = HashMap::new();
        for (i, row) in right.rows.iter().enumerate() {
            let key: Vec<&Value> = right_keys.iter().map(|&k| &row[k]).collect();
            if key.iter().any(|v| v.is_null()) {
                continue;
            }
            index.entry(key).or_default().push(i);
        }

        let mut columns = self.columns.clone();
        columns.extend(extra.iter().map(|c| c.to_string()));
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let key: Vec<&Value> = left_keys.iter().map(|&k| &row[k]).collect();
            match index.get(&key) {
                Some(matches) => {
                    for &m in matches {
                        let mut out = row.clone();
                        out.extend(extra_idx.iter().map(|&e| right.rows[m][e].clone()));
                        rows.push(out);
                    }
                }
                None => {
                    let mut out = row.clone();
                    out.extend(std::iter::repeat(Value::Null).take(extra.len()));
                    rows.push(out);
                }
            }
        }
        Ok(Self { columns, rows })
    }

    /// Append (or replace) a column. `values` must have one cell per row.
    pub fn with_column(mut self, name: &str, values: Vec<Value>) -> QueryResult<Self> {
        if values.len() != self.rows.len() {
            return Err(QueryError::MalformedTable {
                table: "<frame>".into(),
                reason: format!(
                    "column {name} has {} cells for {} rows",
                    values.len(),
                    self.rows.len()
                ),
            });
        }
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        Ok(self)
    }

    /// Sum `value` per distinct `key`, sorted by key. Null values count as 0.
    pub fn group_sum(&self, key: &str, value: &str) -> QueryResult<Self> {
        let k = self.column_index(key)?;
        let v = self.column_index(value)?;
        let mut sums: HashMap<&Value, f64> = HashMap::new();
        for row in &self.rows {
            *sums.entry(&row[k]).or_insert(0.0) += row[v].as_f64().unwrap_or(0.0);
        }
        let mut groups: Vec<(&Value, f64)> = sums.into_iter().collect();
        groups.sort_by(|a, b| a.0.total_cmp(b.0));
        let rows = groups
            .into_iter()
            .map(|(key, sum)| vec![key.clone(), Value::Real(sum)])
            .collect();
        Self::from_rows([key, value], rows)
    }

    /// Stable sort on one column.
    pub fn sort_by(mut self, column: &str) -> QueryResult<Self> {
        let idx = self.column_index(column)?;
        self.rows.sort_by(|a, b| a[idx].total_cmp(&b[idx]));
        Ok(self)
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.rows.iter().map(move |row| Record { columns: &self.columns, row })
    }
}

/// A borrowed row, serialized as a `{column: value}` map.
pub struct Record<'a> {
    columns: &'a [String],
    row: &'a [Value],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (c, v) in self.columns.iter().zip(self.row) {
            map.serialize_entry(c, v)?;
        }
        map.end()
    }
}

impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}
