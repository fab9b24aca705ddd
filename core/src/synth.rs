//! Synthetic Cyclus-like runs.
//!
//! A fuel source feeds `reactors` reactors with fresh UOX every refuelling
//! cycle; each reactor discharges the same mass of spent fuel to a single
//! storage facility, which reports its explicit inventory every step.
//! Output is a pure function of `SynthParams`: the same params always give
//! the same database contents.

use crate::{
    error::{QueryError, QueryResult},
    frame::Frame,
    nuclide::parse_nuclide,
    rng::{Stream, SynthRng},
    store::SimDatabase,
    types::{AgentId, NucId, TimeStep},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

const FRESH_QUAL: i64 = 1;
const SPENT_QUAL: i64 = 2;

const FRESH_UOX: &[(&str, f64)] = &[("U235", 0.04), ("U238", 0.96)];

const SPENT_UOX: &[(&str, f64)] = &[
    ("U235", 0.008),
    ("U236", 0.005),
    ("U238", 0.9727),
    ("Np237", 0.0007),
    ("Pu239", 0.006),
    ("Pu240", 0.0024),
    ("Pu241", 0.0013),
    ("Am241", 0.0001),
    ("Sr90", 0.0008),
    ("Tc99", 0.001),
    ("I129", 0.0002),
    ("Cs134", 0.0001),
    ("Cs137", 0.0017),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    pub seed: u64,
    /// Number of time steps; written as `Info.Duration`.
    pub duration: TimeStep,
    pub reactors: u32,
    /// Nominal mass of one fuel batch in kg.
    pub batch_mass: f64,
    /// Steps between two refuellings of the same reactor.
    pub cycle_length: TimeStep,
    pub initial_year: i32,
    pub initial_month: u32,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            seed: 42,
            duration: 24,
            reactors: 2,
            batch_mass: 33_000.0,
            cycle_length: 6,
            initial_year: 2000,
            initial_month: 1,
        }
    }
}

/// What `generate` wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthSummary {
    pub sim_id: Uuid,
    pub agents: usize,
    pub resources: usize,
    pub transactions: usize,
    pub inventory_rows: usize,
}

/// Prototype names of the generated facilities.
pub const SOURCE_PROTOTYPE: &str = "FuelSource";
pub const REACTOR_PROTOTYPE: &str = "Reactor";
pub const STORAGE_PROTOTYPE: &str = "Storage";

struct Recipe {
    qual: i64,
    fracs: Vec<(NucId, f64)>,
}

fn recipe(qual: i64, entries: &[(&str, f64)]) -> QueryResult<Recipe> {
    let fracs = entries
        .iter()
        .map(|(name, f)| Ok((parse_nuclide(name)?, *f)))
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(Recipe { qual, fracs })
}

/// Accumulates the rows of every output table.
struct RunBuilder {
    sim_id: Value,
    resources: Frame,
    transactions: Frame,
    next_obj: i64,
}

impl RunBuilder {
    fn new(sim_id: Uuid) -> Self {
        Self {
            sim_id: sim_id.into(),
            resources: Frame::new([
                "SimId", "ResourceId", "ObjId", "Type", "TimeCreated", "Quantity", "Units",
                "QualId", "Parent1", "Parent2",
            ]),
            transactions: Frame::new([
                "SimId", "TransactionId", "SenderId", "ReceiverId", "ResourceId", "Commodity", "Time",
            ]),
            next_obj: 1,
        }
    }

    fn trade(
        &mut self,
        time: TimeStep,
        sender: AgentId,
        receiver: AgentId,
        commodity: &str,
        mass: f64,
        qual: i64,
    ) -> QueryResult<()> {
        let res_id = self.next_obj;
        self.next_obj += 1;
        self.resources.push_row(vec![
            self.sim_id.clone(),
            res_id.into(),
            res_id.into(),
            "Material".into(),
            time.into(),
            mass.into(),
            "kg".into(),
            qual.into(),
            0.into(),
            0.into(),
        ])?;
        let tx_id = self.transactions.len() as i64;
        self.transactions.push_row(vec![
            self.sim_id.clone(),
            tx_id.into(),
            sender.into(),
            receiver.into(),
            res_id.into(),
            commodity.into(),
            time.into(),
        ])
    }
}

/// Write a synthetic run into `db`, creating the core tables first.
pub fn generate(db: &SimDatabase, params: &SynthParams) -> QueryResult<SynthSummary> {
    if params.duration <= 0 || params.cycle_length <= 0 || params.reactors == 0 {
        return Err(QueryError::Other(anyhow::anyhow!(
            "synthetic run needs a positive duration, cycle length and reactor count"
        )));
    }
    let fresh = recipe(FRESH_QUAL, FRESH_UOX)?;
    let spent = recipe(SPENT_QUAL, SPENT_UOX)?;

    let mut identity = SynthRng::new(params.seed, Stream::Identity);
    let mut fuel = SynthRng::new(params.seed, Stream::Fuel);
    let mut discharge = SynthRng::new(params.seed, Stream::Discharge);
    let mut power = SynthRng::new(params.seed, Stream::Power);

    let sim_id = identity.uuid();
    let sid: Value = sim_id.into();
    let mut run = RunBuilder::new(sim_id);

    // region 1, institution 2, source 3, reactors 4.., storage last
    let source: AgentId = 3;
    let reactors: Vec<AgentId> = (0..params.reactors as AgentId).map(|i| 4 + i).collect();
    let storage: AgentId = 4 + params.reactors as AgentId;

    let mut agents = Frame::new([
        "SimId", "AgentId", "Kind", "Spec", "Prototype", "ParentId", "Lifetime", "EnterTime",
    ]);
    let mut agent = |id: AgentId, kind: &str, archetype: &str, proto: &str, parent: Value| {
        agents.push_row(vec![
            sid.clone(),
            id.into(),
            kind.into(),
            archetype.into(),
            proto.into(),
            parent,
            (-1).into(),
            0.into(),
        ])
    };
    agent(1, "Region", ":agents:NullRegion", "SingleRegion", Value::Null)?;
    agent(2, "Inst", ":agents:NullInst", "SingleInstitution", 1.into())?;
    agent(source, "Facility", ":agents:Source", SOURCE_PROTOTYPE, 2.into())?;
    for &r in &reactors {
        agent(r, "Facility", ":cycamore:Reactor", REACTOR_PROTOTYPE, 2.into())?;
    }
    agent(storage, "Facility", ":cycamore:Storage", STORAGE_PROTOTYPE, 2.into())?;

    // reactors start their cycles staggered so refuellings interleave
    let offsets: Vec<TimeStep> = reactors
        .iter()
        .map(|_| identity.next_u64_below(params.cycle_length as u64) as TimeStep)
        .collect();

    let mut power_rows = Frame::new(["SimId", "AgentId", "Time", "Value"]);
    let mut inventory = Frame::new(["SimId", "AgentId", "Time", "InventoryName", "NucId", "Quantity"]);
    let mut stored: BTreeMap<NucId, f64> = BTreeMap::new();
    let mut loaded: Vec<Option<f64>> = vec![None; reactors.len()];

    for t in 0..params.duration {
        for (i, &r) in reactors.iter().enumerate() {
            if (t + offsets[i]) % params.cycle_length == 0 {
                if let Some(mass) = loaded[i] {
                    let burnt = mass * discharge.range_f64(0.995, 1.0);
                    run.trade(t, r, storage, "spentfuel", burnt, spent.qual)?;
                    for (nuc, frac) in &spent.fracs {
                        *stored.entry(*nuc).or_insert(0.0) += burnt * frac;
                    }
                }
                let mass = params.batch_mass * fuel.range_f64(0.95, 1.05);
                run.trade(t, source, r, "uox", mass, fresh.qual)?;
                loaded[i] = Some(mass);
            }
            let online = loaded[i].is_some() && !power.chance(0.02);
            let mwe = if online { 1000.0 * power.range_f64(0.9, 1.0) } else { 0.0 };
            power_rows.push_row(vec![sid.clone(), r.into(), t.into(), mwe.into()])?;
        }
        for (nuc, qty) in &stored {
            inventory.push_row(vec![
                sid.clone(),
                storage.into(),
                t.into(),
                "stored".into(),
                (*nuc).into(),
                (*qty).into(),
            ])?;
        }
    }

    let mut compositions = Frame::new(["SimId", "QualId", "NucId", "MassFrac"]);
    for rec in [&fresh, &spent] {
        for (nuc, frac) in &rec.fracs {
            compositions.push_row(vec![sid.clone(), rec.qual.into(), (*nuc).into(), (*frac).into()])?;
        }
    }

    let info = Frame::from_rows(
        [
            "SimId", "Handle", "InitialYear", "InitialMonth", "Duration", "ParentSimId",
            "ParentType", "BranchTime", "CyclusVersion",
        ],
        vec![vec![
            sid.clone(),
            "synthetic".into(),
            i64::from(params.initial_year).into(),
            i64::from(params.initial_month).into(),
            params.duration.into(),
            Value::from(Uuid::nil()),
            "init".into(),
            (-1).into(),
            "synthetic".into(),
        ]],
    )?;
    let finish = Frame::from_rows(
        ["SimId", "EarlyTerm", "EndTime"],
        vec![vec![sid.clone(), 0.into(), (params.duration - 1).into()]],
    )?;

    db.create_schema()?;
    db.write_frame("Info", &info)?;
    db.write_frame("Finish", &finish)?;
    db.write_frame("AgentEntry", &agents)?;
    db.write_frame("Resources", &run.resources)?;
    db.write_frame("Compositions", &compositions)?;
    db.write_frame("Transactions", &run.transactions)?;
    db.write_frame("ExplicitInventory", &inventory)?;
    db.write_frame("TimeSeriesPower", &power_rows)?;

    let summary = SynthSummary {
        sim_id,
        agents: agents.len(),
        resources: run.resources.len(),
        transactions: run.transactions.len(),
        inventory_rows: inventory.len(),
    };
    log::info!(
        "synth: run {sim_id} with {} agents, {} transactions over {} steps",
        summary.agents,
        summary.transactions,
        params.duration
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipes_sum_to_one() {
        for entries in [FRESH_UOX, SPENT_UOX] {
            let total: f64 = entries.iter().map(|(_, f)| f).sum();
            assert!((total - 1.0).abs() < 1e-9, "total {total}");
        }
    }

    #[test]
    fn rejects_degenerate_params() {
        let db = SimDatabase::in_memory().unwrap();
        let params = SynthParams { reactors: 0, ..SynthParams::default() };
        assert!(generate(&db, &params).is_err());
    }
}
