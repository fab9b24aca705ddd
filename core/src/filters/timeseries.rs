//! Per-time-step aggregates of the transaction and inventory views.

use super::{inventory::inventory_frame, transactions::transaction_frame, SelectionCriteria};
use crate::{
    error::{QueryError, QueryResult},
    evaluator::{require, Evaluate},
    frame::Frame,
    types::TimeStep,
    value::Value,
};
use chrono::{Months, NaiveDate};
use std::collections::HashSet;

/// Quantity moved per time step between the selected facilities.
/// Columns: `Time`, `Quantity`.
pub fn transaction_timeseries<E: Evaluate + ?Sized>(
    evaler: &mut E,
    criteria: &SelectionCriteria,
) -> QueryResult<Option<Frame>> {
    let Some(trans) = transaction_frame(evaler, criteria)? else {
        return Ok(None);
    };
    let resources = require(evaler, "Resources")?;
    let summed = trans
        .merge_left(&["SimId", "ResourceId"], &resources, &["Quantity"])?
        .group_sum("Time", "Quantity")?;
    fill_missing_time_steps(evaler, summed, "Quantity").map(Some)
}

/// Inventory quantity per time step of the selected facilities.
/// Columns: `Time`, `Quantity`.
pub fn inventory_timeseries<E: Evaluate + ?Sized>(
    evaler: &mut E,
    criteria: &SelectionCriteria,
) -> QueryResult<Option<Frame>> {
    let Some(inventory) = inventory_frame(evaler, criteria)? else {
        return Ok(None);
    };
    let summed = inventory.group_sum("Time", "Quantity")?;
    fill_missing_time_steps(evaler, summed, "Quantity").map(Some)
}

/// Add a zero row for every time step in `[0, Info.Duration)` that `frame`
/// has no `Time` row for, then sort on `Time`. Without an `Info` table the
/// duration is unknown and the frame is only sorted.
pub fn fill_missing_time_steps<E: Evaluate + ?Sized>(
    evaler: &mut E,
    frame: Frame,
    value_col: &str,
) -> QueryResult<Frame> {
    let Some(info) = evaler.eval("Info")? else {
        log::debug!("timeseries: no Info table, leaving gaps");
        return frame.sort_by("Time");
    };
    let duration: TimeStep = info
        .column("Duration")?
        .filter_map(Value::as_i64)
        .max()
        .unwrap_or(0);

    let present: HashSet<TimeStep> = frame.column("Time")?.filter_map(Value::as_i64).collect();
    let t = frame.column_index("Time")?;
    let v = frame.column_index(value_col)?;
    let width = frame.columns().len();

    let mut frame = frame;
    for step in (0..duration).filter(|s| !present.contains(s)) {
        let mut row = vec![Value::Null; width];
        row[t] = Value::Integer(step);
        row[v] = Value::Real(0.0);
        frame.push_row(row)?;
    }
    frame.sort_by("Time")
}

/// Add a `Date` column (`YYYY-MM-01`) mapping each `Time` step to a month,
/// counted from `Info.InitialYear` / `Info.InitialMonth`.
pub fn with_calendar_dates<E: Evaluate + ?Sized>(evaler: &mut E, frame: Frame) -> QueryResult<Frame> {
    let info = require(evaler, "Info")?;
    let start = start_date(&info)?;

    let dates = frame
        .column("Time")?
        .map(|t| {
            t.as_i64()
                .and_then(|t| u32::try_from(t).ok())
                .and_then(|t| start.checked_add_months(Months::new(t)))
                .map_or(Value::Null, |d| Value::Text(d.format("%Y-%m-%d").to_string()))
        })
        .collect();
    frame.with_column("Date", dates)
}

fn start_date(info: &Frame) -> QueryResult<NaiveDate> {
    let malformed = |reason: String| QueryError::MalformedTable { table: "Info".into(), reason };
    if info.is_empty() {
        return Err(malformed("no rows".into()));
    }
    let year = info
        .value(0, "InitialYear")?
        .as_i64()
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| malformed("InitialYear is not an integer".into()))?;
    let month = info
        .value(0, "InitialMonth")?
        .as_i64()
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(|| malformed("InitialMonth is not an integer".into()))?;
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| malformed(format!("{year}-{month} is not a calendar month")))
}
