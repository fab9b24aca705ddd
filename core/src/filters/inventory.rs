//! Facility inventories, optionally with activity and decay heat.

use super::{nuclide_values, text_values, SelectionCriteria};
use crate::{
    derived::{activity_column, decay_heat_column},
    error::QueryResult,
    evaluator::{require, Evaluate},
    frame::{Frame, Membership},
};

/// Explicit inventory of the selected facilities, with each agent's
/// `Prototype` merged in.
///
/// Uses `facilities` and `nucs` from the criteria. Without facilities the
/// inventory of every agent is returned and a warning is logged. Returns
/// `Ok(None)` when facilities are given but none exists in the run.
pub fn inventory_frame<E: Evaluate + ?Sized>(
    evaler: &mut E,
    criteria: &SelectionCriteria,
) -> QueryResult<Option<Frame>> {
    let nucs = nuclide_values(evaler.nuclear_data(), &criteria.nucs)?;
    let inventory = require(evaler, "ExplicitInventory")?;
    let mut agents = require(evaler, "AgentEntry")?;

    // nuclides first: they shrink the table the most
    let mut rdc = Vec::new();
    if !nucs.is_empty() {
        rdc.push(Membership::new("NucId", nucs));
    }

    if criteria.facilities.is_empty() {
        log::warn!("inventory: no facility provided, keeping the inventory of every agent");
    } else {
        agents = agents.filter_in("Prototype", &text_values(&criteria.facilities))?;
        if agents.is_empty() {
            log::info!("inventory: no agent matches facilities {:?}", criteria.facilities);
            return Ok(None);
        }
        rdc.push(Membership::new("AgentId", agents.distinct("AgentId")?));
    }

    let inventory = inventory
        .reduce(&rdc)?
        .merge_left(&["SimId", "AgentId"], &agents, &["SimId", "AgentId", "Prototype"])?;
    log::debug!("inventory: {} rows", inventory.len());
    Ok(Some(inventory))
}

/// `inventory_frame` plus an `Activity` column:
/// `1000 * N_A * Quantity * λ(NucId)`.
pub fn inventory_activity_frame<E: Evaluate + ?Sized>(
    evaler: &mut E,
    criteria: &SelectionCriteria,
) -> QueryResult<Option<Frame>> {
    let Some(inventory) = inventory_frame(evaler, criteria)? else {
        return Ok(None);
    };
    let activity = activity_column(evaler.nuclear_data(), &inventory, "Quantity", false)?;
    inventory.with_column("Activity", activity).map(Some)
}

/// `inventory_activity_frame` plus a `DecayHeat` column:
/// `MeV_per_MJ * Activity * Q(NucId)`.
pub fn inventory_decayheat_frame<E: Evaluate + ?Sized>(
    evaler: &mut E,
    criteria: &SelectionCriteria,
) -> QueryResult<Option<Frame>> {
    let Some(inventory) = inventory_activity_frame(evaler, criteria)? else {
        return Ok(None);
    };
    let heat = decay_heat_column(evaler.nuclear_data(), &inventory, "Activity")?;
    inventory.with_column("DecayHeat", heat).map(Some)
}
