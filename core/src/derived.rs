//! Derived metrics and nuclide-keyed computed columns.
//!
//!   Materials = Resources ⋈ Compositions on (SimId, QualId),
//!               Mass = Quantity * MassFrac
//!   Activity  = N_A * 1000 * Mass / A * λ
//!   DecayHeat = MeV_per_MJ * Activity * Q
//!
//! Lookups against the nuclear data are batched: each distinct nuclide is
//! looked up once, then every row is a pure map over the lookup table.
//! An unknown nuclide fails the whole computation; it never becomes NaN.
//!
//! `OperationMaintenance` and `FuelCost` are priced cash flows; see
//! `economics`.

use crate::{
    economics,
    error::{QueryError, QueryResult},
    evaluator::Evaluate,
    frame::Frame,
    nuclide::{mass_number, NuclearData},
    types::NucId,
    value::Value,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedMetric {
    Materials,
    Activity,
    DecayHeat,
    OperationMaintenance,
    FuelCost,
}

impl DerivedMetric {
    pub const ALL: [DerivedMetric; 5] = [
        DerivedMetric::Materials,
        DerivedMetric::Activity,
        DerivedMetric::DecayHeat,
        DerivedMetric::OperationMaintenance,
        DerivedMetric::FuelCost,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DerivedMetric::Materials => "Materials",
            DerivedMetric::Activity => "Activity",
            DerivedMetric::DecayHeat => "DecayHeat",
            DerivedMetric::OperationMaintenance => "OperationMaintenance",
            DerivedMetric::FuelCost => "FuelCost",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Metrics this one is computed from.
    pub fn dependencies(self) -> &'static [&'static str] {
        match self {
            DerivedMetric::Materials => &["Resources", "Compositions"],
            DerivedMetric::Activity => &["Materials"],
            DerivedMetric::DecayHeat => &["Activity"],
            DerivedMetric::OperationMaintenance => &["TimeSeriesPower", "AgentEntry"],
            DerivedMetric::FuelCost => &["Transactions", "Resources", "AgentEntry"],
        }
    }

    /// Compute the metric. `Ok(None)` when a dependency is absent.
    pub fn compute<E: Evaluate + ?Sized>(self, evaler: &mut E) -> QueryResult<Option<Frame>> {
        let mut deps = Vec::with_capacity(3);
        for dep in self.dependencies() {
            match evaler.eval(dep)? {
                Some(frame) => deps.push(frame),
                None => {
                    log::debug!("{}: dependency {dep} absent", self.name());
                    return Ok(None);
                }
            }
        }
        let mut deps = deps.into_iter();
        let mut next = || {
            deps.next().ok_or_else(|| QueryError::MalformedTable {
                table: self.name().into(),
                reason: "missing dependency".into(),
            })
        };
        let frame = match self {
            DerivedMetric::Materials => {
                let resources = next()?;
                let compositions = next()?;
                materials(resources, &compositions)?
            }
            DerivedMetric::Activity => with_activity(evaler.nuclear_data(), next()?)?.select(&[
                "SimId", "QualId", "ResourceId", "ObjId", "TimeCreated", "NucId", "Activity",
            ])?,
            DerivedMetric::DecayHeat => {
                with_decay_heat(evaler.nuclear_data(), next()?)?.select(&[
                    "SimId", "QualId", "ResourceId", "ObjId", "TimeCreated", "NucId", "DecayHeat",
                ])?
            }
            DerivedMetric::OperationMaintenance => {
                let power = next()?;
                let agents = next()?;
                economics::operation_maintenance(&power, &agents, evaler.economics())?
            }
            DerivedMetric::FuelCost => {
                let transactions = next()?;
                let resources = next()?;
                let agents = next()?;
                economics::fuel_cost(&transactions, &resources, &agents, evaler.economics())?
            }
        };
        log::debug!("{}: {} rows", self.name(), frame.len());
        Ok(Some(frame))
    }
}

/// Append an `Activity` column to a frame of nuclide masses (`Mass`, kg).
pub fn with_activity(nd: &dyn NuclearData, materials: Frame) -> QueryResult<Frame> {
    let activity = activity_column(nd, &materials, "Mass", true)?;
    materials.with_column("Activity", activity)
}

/// Append a `DecayHeat` column to a frame that carries `Activity`.
pub fn with_decay_heat(nd: &dyn NuclearData, activity: Frame) -> QueryResult<Frame> {
    let heat = decay_heat_column(nd, &activity, "Activity")?;
    activity.with_column("DecayHeat", heat)
}

fn materials(resources: Frame, compositions: &Frame) -> QueryResult<Frame> {
    let joined = resources
        .merge_left(&["SimId", "QualId"], compositions, &["NucId", "MassFrac"])?;
    let nuc = joined.column_index("NucId")?;
    // resources without a composition are products, not materials
    let joined = joined.filter_rows(|row| !row[nuc].is_null());
    let q = joined.column_index("Quantity")?;
    let f = joined.column_index("MassFrac")?;
    let mass = joined
        .rows()
        .iter()
        .map(|row| match (row[q].as_f64(), row[f].as_f64()) {
            (Some(q), Some(f)) => Value::Real(q * f),
            _ => Value::Null,
        })
        .collect();
    joined.with_column("Mass", mass)?.select(&[
        "SimId", "QualId", "ResourceId", "ObjId", "TimeCreated", "NucId", "Units", "Mass",
    ])
}

fn nuc_id(v: &Value) -> QueryResult<Option<NucId>> {
    match v {
        Value::Null => Ok(None),
        Value::Integer(n) => Ok(Some(*n)),
        Value::Real(f) if f.fract() == 0.0 => Ok(Some(*f as NucId)),
        other => Err(QueryError::UnknownNuclide { nuclide: other.to_string() }),
    }
}

/// Look `lookup` up once per distinct nuclide of `frame[nuc_col]`.
pub fn per_nuclide(
    frame: &Frame,
    nuc_col: &str,
    mut lookup: impl FnMut(NucId) -> QueryResult<f64>,
) -> QueryResult<HashMap<NucId, f64>> {
    let mut table = HashMap::new();
    for v in frame.column(nuc_col)? {
        if let Some(nuc) = nuc_id(v)? {
            if !table.contains_key(&nuc) {
                table.insert(nuc, lookup(nuc)?);
            }
        }
    }
    Ok(table)
}

/// `scale * frame[source_col] * factors[frame[nuc_col]]` for every row.
/// Rows with a Null nuclide or source are Null.
fn scaled_column(
    frame: &Frame,
    nuc_col: &str,
    source_col: &str,
    factors: &HashMap<NucId, f64>,
    scale: f64,
) -> QueryResult<Vec<Value>> {
    let n = frame.column_index(nuc_col)?;
    let s = frame.column_index(source_col)?;
    frame
        .rows()
        .iter()
        .map(|row| -> QueryResult<Value> {
            let Some(nuc) = nuc_id(&row[n])? else {
                return Ok(Value::Null);
            };
            let factor = factors
                .get(&nuc)
                .ok_or_else(|| QueryError::UnknownNuclide { nuclide: nuc.to_string() })?;
            Ok(row[s].as_f64().map_or(Value::Null, |x| Value::Real(scale * x * factor)))
        })
        .collect()
}

/// Activity of every row from the mass in `mass_col` (kg) and `NucId`.
///
/// With `per_mass_number` the mass is converted to atoms through the mass
/// number (`N_A * 1000 * m / A * λ`); without it the plain
/// `N_A * 1000 * m * λ` form used for explicit inventories applies.
pub fn activity_column(
    nd: &dyn NuclearData,
    frame: &Frame,
    mass_col: &str,
    per_mass_number: bool,
) -> QueryResult<Vec<Value>> {
    let factors = per_nuclide(frame, "NucId", |nuc| {
        let lambda = nd.decay_constant(nuc)?;
        if !per_mass_number {
            return Ok(lambda);
        }
        match mass_number(nuc) {
            a if a > 0 => Ok(lambda / a as f64),
            _ => Err(QueryError::UnknownNuclide { nuclide: nuc.to_string() }),
        }
    })?;
    scaled_column(frame, "NucId", mass_col, &factors, nd.avogadro() * 1000.0)
}

/// Decay heat of every row from the activity in `activity_col`.
pub fn decay_heat_column(
    nd: &dyn NuclearData,
    frame: &Frame,
    activity_col: &str,
) -> QueryResult<Vec<Value>> {
    let factors = per_nuclide(frame, "NucId", |nuc| nd.q_value(nuc))?;
    scaled_column(frame, "NucId", activity_col, &factors, nd.mev_per_mj())
}
