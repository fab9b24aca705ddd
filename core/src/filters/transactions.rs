//! Transactions between facilities, optionally broken down by nuclide.

use super::{nuclide_values, text_values, SelectionCriteria};
use crate::{
    derived::{with_activity, with_decay_heat},
    error::QueryResult,
    evaluator::{require, Evaluate},
    frame::{Frame, Membership},
};

/// Per-nuclide quantity merged onto transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NuclideQuantity {
    Mass,
    Activity,
    DecayHeat,
}

impl NuclideQuantity {
    fn column(self) -> &'static str {
        match self {
            NuclideQuantity::Mass => "Mass",
            NuclideQuantity::Activity => "Activity",
            NuclideQuantity::DecayHeat => "DecayHeat",
        }
    }
}

/// Transactions between the selected senders and receivers, with the
/// prototype of each side merged in as `SenderPrototype` and
/// `ReceiverPrototype`.
///
/// Uses `senders`, `receivers` and `commodities` from the criteria.
/// Returns `Ok(None)` when no agent matches the sender or receiver set.
pub fn transaction_frame<E: Evaluate + ?Sized>(
    evaler: &mut E,
    criteria: &SelectionCriteria,
) -> QueryResult<Option<Frame>> {
    let trans = require(evaler, "Transactions")?;
    let agents = require(evaler, "AgentEntry")?;

    let receivers = agents
        .clone()
        .rename("AgentId", "ReceiverId")?
        .filter_in("Prototype", &text_values(&criteria.receivers))?;
    let senders = agents
        .rename("AgentId", "SenderId")?
        .filter_in("Prototype", &text_values(&criteria.senders))?;

    if receivers.is_empty() || senders.is_empty() {
        log::info!(
            "transactions: no agent matches senders {:?} / receivers {:?}",
            criteria.senders,
            criteria.receivers
        );
        return Ok(None);
    }

    let mut rdc = vec![
        Membership::new("ReceiverId", receivers.distinct("ReceiverId")?),
        Membership::new("SenderId", senders.distinct("SenderId")?),
    ];
    if !criteria.commodities.is_empty() {
        rdc.push(Membership::new("Commodity", text_values(&criteria.commodities)));
    }

    let trans = trans
        .reduce(&rdc)?
        .merge_left(&["SimId", "SenderId"], &senders, &["SimId", "SenderId", "Prototype"])?
        .rename("Prototype", "SenderPrototype")?
        .merge_left(&["SimId", "ReceiverId"], &receivers, &["SimId", "ReceiverId", "Prototype"])?
        .rename("Prototype", "ReceiverPrototype")?;

    log::debug!("transactions: {} rows", trans.len());
    Ok(Some(trans))
}

/// Transactions fanned out per nuclide with the nuclide mass (`Mass`).
pub fn transaction_nuc_frame<E: Evaluate + ?Sized>(
    evaler: &mut E,
    criteria: &SelectionCriteria,
) -> QueryResult<Option<Frame>> {
    with_nuclide_table(evaler, criteria, NuclideQuantity::Mass)
}

/// Transactions fanned out per nuclide with the nuclide activity.
pub fn transaction_activity_frame<E: Evaluate + ?Sized>(
    evaler: &mut E,
    criteria: &SelectionCriteria,
) -> QueryResult<Option<Frame>> {
    with_nuclide_table(evaler, criteria, NuclideQuantity::Activity)
}

/// Transactions fanned out per nuclide with the nuclide decay heat.
pub fn transaction_decayheat_frame<E: Evaluate + ?Sized>(
    evaler: &mut E,
    criteria: &SelectionCriteria,
) -> QueryResult<Option<Frame>> {
    with_nuclide_table(evaler, criteria, NuclideQuantity::DecayHeat)
}

/// Merge per-nuclide `quantity` onto the transactions on
/// `(SimId, ResourceId)`, pulling in `NucId` and the quantity column.
///
/// Materials are narrowed to the selected nuclides before any nuclear
/// data is looked up, so nuclides outside the selection never need data.
fn with_nuclide_table<E: Evaluate + ?Sized>(
    evaler: &mut E,
    criteria: &SelectionCriteria,
    quantity: NuclideQuantity,
) -> QueryResult<Option<Frame>> {
    // Normalise first so a bad nuclide fails before any table is read.
    let nucs = nuclide_values(evaler.nuclear_data(), &criteria.nucs)?;

    let Some(trans) = transaction_frame(evaler, criteria)? else {
        return Ok(None);
    };
    let materials = require(evaler, "Materials")?.filter_in("NucId", &nucs)?;
    let nd = evaler.nuclear_data();
    let per_nuc = match quantity {
        NuclideQuantity::Mass => materials,
        NuclideQuantity::Activity => with_activity(nd, materials)?,
        NuclideQuantity::DecayHeat => with_decay_heat(nd, with_activity(nd, materials)?)?,
    };

    let value_col = quantity.column();
    trans
        .merge_left(&["SimId", "ResourceId"], &per_nuc, &["SimId", "ResourceId", "NucId", value_col])
        .map(Some)
}
