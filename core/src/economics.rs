//! Facility cash flows priced from configured economic parameters.
//!
//!   OperationMaintenance = Power * HOURS_PER_STEP * variable + capacity * fixed
//!   FuelCost             = Quantity * (supply_cost + waste_fee)
//!
//! Power is in MWe and a time step is one month, so a step generates
//! `Power * HOURS_PER_STEP` MWh. Capacity is an agent's peak power over the
//! run. Prices resolve per prototype first, then fall back to the run-wide
//! values. An agent with no price pays nothing.

use crate::{error::QueryResult, frame::Frame, value::Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const HOURS_PER_STEP: f64 = 8760.0 / 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationCost {
    /// Per MWe of capacity per time step.
    pub fixed: f64,
    /// Per MWh generated.
    pub variable: f64,
}

/// Price of one kg of a commodity to the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelPrice {
    pub supply_cost: f64,
    pub waste_fee: f64,
}

impl FuelPrice {
    pub fn per_kg(&self) -> f64 {
        self.supply_cost + self.waste_fee
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrototypeEconomics {
    pub operation_maintenance: Option<OperationCost>,
    pub fuel: BTreeMap<String, FuelPrice>,
}

/// Economic parameters of a run, usually the `economics` section of the
/// query config:
///
/// ```json
/// {
///   "operation_maintenance": { "fixed": 10.0, "variable": 2.0 },
///   "fuel": { "uox": { "supply_cost": 2360.0 } },
///   "prototypes": {
///     "Storage": { "fuel": { "spentfuel": { "waste_fee": 150.0 } } }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicParams {
    pub operation_maintenance: Option<OperationCost>,
    /// Keyed by commodity.
    pub fuel: BTreeMap<String, FuelPrice>,
    /// Overrides keyed by prototype name.
    pub prototypes: BTreeMap<String, PrototypeEconomics>,
}

pub(crate) static NO_ECONOMICS: EconomicParams = EconomicParams {
    operation_maintenance: None,
    fuel: BTreeMap::new(),
    prototypes: BTreeMap::new(),
};

impl EconomicParams {
    pub fn operation_cost(&self, prototype: Option<&str>) -> Option<OperationCost> {
        prototype
            .and_then(|p| self.prototypes.get(p))
            .and_then(|p| p.operation_maintenance)
            .or(self.operation_maintenance)
    }

    pub fn fuel_price(&self, prototype: Option<&str>, commodity: &str) -> Option<FuelPrice> {
        prototype
            .and_then(|p| self.prototypes.get(p))
            .and_then(|p| p.fuel.get(commodity))
            .or_else(|| self.fuel.get(commodity))
            .copied()
    }
}

/// Per-step operation and maintenance payment of every agent in
/// `TimeSeriesPower`. Columns: SimId, AgentId, Time, Payment.
pub fn operation_maintenance(
    power: &Frame,
    agents: &Frame,
    params: &EconomicParams,
) -> QueryResult<Frame> {
    let power = power
        .clone()
        .merge_left(&["SimId", "AgentId"], agents, &["Prototype"])?;
    let sim = power.column_index("SimId")?;
    let agent = power.column_index("AgentId")?;
    let value = power.column_index("Value")?;
    let proto = power.column_index("Prototype")?;

    let mut capacity: HashMap<(Value, Value), f64> = HashMap::new();
    for row in power.rows() {
        let mwe = row[value].as_f64().unwrap_or(0.0);
        let peak = capacity.entry((row[sim].clone(), row[agent].clone())).or_insert(0.0);
        *peak = peak.max(mwe);
    }

    let payments = power
        .rows()
        .iter()
        .map(|row| {
            let Some(cost) = params.operation_cost(row[proto].as_str()) else {
                return Value::Real(0.0);
            };
            let mwh = row[value].as_f64().unwrap_or(0.0) * HOURS_PER_STEP;
            let peak = capacity
                .get(&(row[sim].clone(), row[agent].clone()))
                .copied()
                .unwrap_or(0.0);
            Value::Real(mwh * cost.variable + peak * cost.fixed)
        })
        .collect();
    power
        .with_column("Payment", payments)?
        .select(&["SimId", "AgentId", "Time", "Payment"])
}

/// Payment of the receiver of every transaction for the material it
/// received. Columns: SimId, TransactionId, AgentId, Commodity, Payment, Time.
pub fn fuel_cost(
    transactions: &Frame,
    resources: &Frame,
    agents: &Frame,
    params: &EconomicParams,
) -> QueryResult<Frame> {
    let receivers = agents.clone().rename("AgentId", "ReceiverId")?;
    let trans = transactions
        .clone()
        .merge_left(&["SimId", "ResourceId"], resources, &["Quantity"])?
        .merge_left(&["SimId", "ReceiverId"], &receivers, &["Prototype"])?;
    let qty = trans.column_index("Quantity")?;
    let commodity = trans.column_index("Commodity")?;
    let proto = trans.column_index("Prototype")?;

    let payments = trans
        .rows()
        .iter()
        .map(|row| {
            let price = row[commodity]
                .as_str()
                .and_then(|c| params.fuel_price(row[proto].as_str(), c));
            match (price, row[qty].as_f64()) {
                (Some(price), Some(kg)) => Value::Real(kg * price.per_kg()),
                _ => Value::Real(0.0),
            }
        })
        .collect();
    trans
        .with_column("Payment", payments)?
        .rename("ReceiverId", "AgentId")?
        .select(&["SimId", "TransactionId", "AgentId", "Commodity", "Payment", "Time"])
}
