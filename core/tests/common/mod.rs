//! Fixture run shared by the integration tests.
//!
//! Agents: 1 region, 2 institution, 10 "Reactor", 11 "Storage",
//! 12 "Separations". Transactions:
//!   t=1  10 -> 11  spentfuel  resource 100 (2 kg, Cs137 25% / U238 75%)
//!   t=3  11 -> 12  spentfuel  resource 101 (4 kg, same composition)
//!   t=3  11 -> 10  uox        resource 102 (1 kg, no composition row)

#![allow(dead_code)]

use cyclus_metrics::{Frame, SimDatabase, Value};
use uuid::Uuid;

pub const CS137: i64 = 551370000;
pub const U238: i64 = 922380000;
pub const U235: i64 = 922350000;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn sim_id() -> Value {
    Uuid::from_u128(0x0123_4567_89ab_4cde_8f01_2345_6789_abcd).into()
}

fn frame(columns: &[&str], rows: Vec<Vec<Value>>) -> Frame {
    Frame::from_rows(columns.iter().copied(), rows).expect("fixture frame")
}

fn agent(id: i64, kind: &str, proto: &str) -> Vec<Value> {
    vec![sim_id(), id.into(), kind.into(), proto.into(), 0.into()]
}

pub fn scenario_db() -> SimDatabase {
    init_logging();
    let db = SimDatabase::in_memory().expect("in-memory db");
    db.create_schema().expect("schema");

    db.write_frame(
        "Info",
        &frame(
            &["SimId", "InitialYear", "InitialMonth", "Duration"],
            vec![vec![sim_id(), 2010.into(), 6.into(), 6.into()]],
        ),
    )
    .expect("Info");

    db.write_frame(
        "AgentEntry",
        &frame(
            &["SimId", "AgentId", "Kind", "Prototype", "EnterTime"],
            vec![
                agent(1, "Region", "SingleRegion"),
                agent(2, "Inst", "SingleInstitution"),
                agent(10, "Facility", "Reactor"),
                agent(11, "Facility", "Storage"),
                agent(12, "Facility", "Separations"),
            ],
        ),
    )
    .expect("AgentEntry");

    let resource = |id: i64, time: i64, qty: f64, qual: i64| -> Vec<Value> {
        vec![sim_id(), id.into(), id.into(), "Material".into(), time.into(), qty.into(),
             "kg".into(), qual.into()]
    };
    db.write_frame(
        "Resources",
        &frame(
            &["SimId", "ResourceId", "ObjId", "Type", "TimeCreated", "Quantity", "Units", "QualId"],
            vec![resource(100, 1, 2.0, 5), resource(101, 3, 4.0, 5), resource(102, 3, 1.0, 6)],
        ),
    )
    .expect("Resources");

    db.write_frame(
        "Compositions",
        &frame(
            &["SimId", "QualId", "NucId", "MassFrac"],
            vec![
                vec![sim_id(), 5.into(), CS137.into(), 0.25.into()],
                vec![sim_id(), 5.into(), U238.into(), 0.75.into()],
            ],
        ),
    )
    .expect("Compositions");

    let trade = |id: i64, from: i64, to: i64, res: i64, commod: &str, time: i64| -> Vec<Value> {
        vec![sim_id(), id.into(), from.into(), to.into(), res.into(), commod.into(), time.into()]
    };
    db.write_frame(
        "Transactions",
        &frame(
            &["SimId", "TransactionId", "SenderId", "ReceiverId", "ResourceId", "Commodity", "Time"],
            vec![
                trade(0, 10, 11, 100, "spentfuel", 1),
                trade(1, 11, 12, 101, "spentfuel", 3),
                trade(2, 11, 10, 102, "uox", 3),
            ],
        ),
    )
    .expect("Transactions");

    let held = |agent: i64, time: i64, nuc: i64, qty: f64| -> Vec<Value> {
        vec![sim_id(), agent.into(), time.into(), "core".into(), nuc.into(), qty.into()]
    };
    db.write_frame(
        "ExplicitInventory",
        &frame(
            &["SimId", "AgentId", "Time", "InventoryName", "NucId", "Quantity"],
            vec![
                held(11, 1, CS137, 0.5),
                held(11, 1, U238, 1.5),
                held(11, 3, CS137, 1.0),
                held(10, 0, U235, 1.0),
                held(10, 4, U235, 2.0),
            ],
        ),
    )
    .expect("ExplicitInventory");

    db
}

pub fn approx(actual: f64, expected: f64) -> bool {
    ((actual - expected) / expected).abs() < 1e-9
}
