//! Analyst views built from several metrics.
//!
//! Every filter follows the same recipe:
//!   1. evaluate the base tables by name,
//!   2. reduce them by set membership (an empty set is no restriction),
//!   3. left-merge auxiliary views on shared key columns,
//!   4. rename merged columns that would collide,
//!   5. optionally add computed columns from nuclear data.
//!
//! A filter returns `Ok(None)` when the selection names a facility that
//! does not exist in the run. That is different from `Ok(Some(empty))`,
//! which means the facility exists but nothing matched.
//! Filters hold no state and cache nothing between calls.

pub mod inventory;
pub mod timeseries;
pub mod transactions;

pub use inventory::{inventory_activity_frame, inventory_decayheat_frame, inventory_frame};
pub use timeseries::{
    fill_missing_time_steps, inventory_timeseries, transaction_timeseries, with_calendar_dates,
};
pub use transactions::{
    transaction_activity_frame, transaction_decayheat_frame, transaction_frame,
    transaction_nuc_frame,
};

use crate::{error::QueryResult, nuclide::NuclearData, value::Value};

/// Which rows a filter keeps. Every list defaults to empty, which places
/// no restriction on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Prototype names of sending facilities.
    pub senders: Vec<String>,
    /// Prototype names of receiving facilities.
    pub receivers: Vec<String>,
    pub commodities: Vec<String>,
    /// Nuclides in any spelling `NuclearData::normalize_nuclide_id` accepts.
    pub nucs: Vec<String>,
    /// Prototype names of facilities whose inventory is wanted.
    pub facilities: Vec<String>,
}

fn owned<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Vec<String> {
    items.into_iter().map(|s| s.as_ref().to_string()).collect()
}

impl SelectionCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn senders<S: AsRef<str>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.senders = owned(items);
        self
    }

    pub fn receivers<S: AsRef<str>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.receivers = owned(items);
        self
    }

    pub fn commodities<S: AsRef<str>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.commodities = owned(items);
        self
    }

    pub fn nucs<S: AsRef<str>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.nucs = owned(items);
        self
    }

    pub fn facilities<S: AsRef<str>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.facilities = owned(items);
        self
    }
}

pub(crate) fn text_values(items: &[String]) -> Vec<Value> {
    items.iter().map(|s| Value::Text(s.clone())).collect()
}

/// Canonical ids of a nuclide selection. Unknown nuclides are an error.
pub(crate) fn nuclide_values(nd: &dyn NuclearData, nucs: &[String]) -> QueryResult<Vec<Value>> {
    nucs.iter()
        .map(|n| nd.normalize_nuclide_id(n).map(Value::Integer))
        .collect()
}
