//! Root metric access, derived metrics and evaluator caching.

mod common;

use common::{approx, init_logging, scenario_db, sim_id, CS137};
use cyclus_metrics::{
    CmpOp, Condition, Evaluate, Evaluator, Frame, MetricRegistry, NuclideTable, QueryError,
    SimDatabase, Value,
};

fn nuclides() -> NuclideTable {
    NuclideTable::builtin().expect("built-in nuclide data")
}

#[test]
fn absent_table_is_reported_absent() {
    let db = scenario_db();
    let snapshots = MetricRegistry::builtin().create_accessor("Snapshots").unwrap();
    assert!(snapshots.query(&db, &[]).unwrap().is_none());
    assert!(snapshots.columns(&db).unwrap().is_none());

    let mut ev = Evaluator::new(&db, nuclides());
    assert!(ev.eval("Snapshots").unwrap().is_none());
}

#[test]
fn unknown_metric_name_is_absent() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());
    assert!(ev.eval("NotAMetric").unwrap().is_none());
    assert!(ev.query("NotAMetric", &[]).unwrap().is_none());
    assert!(ev.query("NotAMetric", &[Condition::parse("Time>=3").unwrap()]).unwrap().is_none());
}

#[test]
fn derived_metrics_are_queryable_with_conditions() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());

    let materials = ev.query("Materials", &[]).unwrap().unwrap();
    assert_eq!(materials.len(), 4);

    let caesium = ev
        .query("Materials", &[Condition::eq("NucId", CS137), Condition::parse("Mass>0.6").unwrap()])
        .unwrap()
        .unwrap();
    assert_eq!(caesium.len(), 1);
    assert!(approx(caesium.value(0, "Mass").unwrap().as_f64().unwrap(), 1.0));

    let heat = ev.query("DecayHeat", &[Condition::eq("ResourceId", 100)]).unwrap().unwrap();
    assert_eq!(heat.len(), 2);

    let err = ev.query("Activity", &[Condition::eq("NoSuchColumn", 1)]).unwrap_err();
    assert!(matches!(err, QueryError::ColumnNotFound { .. }));
}

#[test]
fn root_metric_conditions() {
    let db = scenario_db();
    let trans = MetricRegistry::builtin().create_accessor("Transactions").unwrap();

    let uox = trans.query(&db, &[Condition::eq("Commodity", "uox")]).unwrap().unwrap();
    assert_eq!(uox.len(), 1);

    let late = trans
        .query(&db, &[Condition::parse("Time>=3").unwrap()])
        .unwrap()
        .unwrap();
    assert_eq!(late.len(), 2);

    let both = trans
        .query(
            &db,
            &[
                Condition::compare("Time", CmpOp::Lt, 3),
                Condition::is_in("SenderId", vec![10.into(), 12.into()]),
            ],
        )
        .unwrap()
        .unwrap();
    assert_eq!(both.len(), 1);

    // an empty membership list restricts nothing
    let all = trans
        .query(&db, &[Condition::is_in("SenderId", Vec::new())])
        .unwrap()
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn conditions_on_invalid_field_names_fail() {
    let db = scenario_db();
    let trans = MetricRegistry::builtin().create_accessor("Transactions").unwrap();
    assert!(trans.query(&db, &[Condition::eq("Nope\"", 1)]).is_err());
}

#[test]
fn materials_join_resources_and_compositions() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());
    let materials = ev.eval("Materials").unwrap().unwrap();
    // resource 102 has no composition and is not a material
    assert_eq!(materials.len(), 4);
    let total: f64 = materials.column("Mass").unwrap().filter_map(Value::as_f64).sum();
    assert!(approx(total, 6.0));

    let activity = ev.eval("Activity").unwrap().unwrap();
    assert_eq!(activity.len(), 4);
    assert!(activity.has_column("Activity"));
    assert!(!activity.has_column("Mass"));

    let heat = ev.eval("DecayHeat").unwrap().unwrap();
    assert!(heat.column("DecayHeat").unwrap().all(|h| h.as_f64().is_some_and(|h| h > 0.0)));
}

#[test]
fn derived_metric_is_absent_without_its_inputs() {
    init_logging();
    let db = SimDatabase::in_memory().unwrap();
    let resources = Frame::from_rows(
        ["SimId", "ResourceId", "QualId", "Quantity"],
        vec![vec![sim_id(), 1.into(), 1.into(), 1.0.into()]],
    )
    .unwrap();
    db.write_frame("Resources", &resources).unwrap();

    let mut ev = Evaluator::new(&db, nuclides());
    assert!(ev.eval("Materials").unwrap().is_none());
    assert!(ev.eval("DecayHeat").unwrap().is_none());
}

fn extra_transaction() -> Frame {
    Frame::from_rows(
        ["SimId", "TransactionId", "SenderId", "ReceiverId", "ResourceId", "Commodity", "Time"],
        vec![vec![sim_id(), 3.into(), 10.into(), 11.into(), 100.into(), "spentfuel".into(), 5.into()]],
    )
    .unwrap()
}

#[test]
fn evaluator_memoises_until_cleared() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());
    assert_eq!(ev.eval("Transactions").unwrap().unwrap().len(), 3);

    db.write_frame("Transactions", &extra_transaction()).unwrap();
    assert_eq!(ev.eval("Transactions").unwrap().unwrap().len(), 3);

    ev.clear_cache();
    assert_eq!(ev.eval("Transactions").unwrap().unwrap().len(), 4);
}

#[test]
fn uncached_evaluator_always_reads_the_database() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides()).with_cache(false);
    assert_eq!(ev.eval("Transactions").unwrap().unwrap().len(), 3);
    db.write_frame("Transactions", &extra_transaction()).unwrap();
    assert_eq!(ev.eval("Transactions").unwrap().unwrap().len(), 4);
}

#[test]
fn extra_root_metrics_are_queryable() {
    let db = scenario_db();
    let state = Frame::from_rows(
        ["SimId", "AgentId", "cycle_time"],
        vec![vec![sim_id(), 10.into(), 18.into()]],
    )
    .unwrap();
    db.write_frame("AgentState_cycamore_ReactorInfo", &state).unwrap();

    let mut plain = Evaluator::new(&db, nuclides());
    assert!(plain.eval("AgentState_cycamore_ReactorInfo").unwrap().is_none());

    let registry = MetricRegistry::with_extra(&["AgentState_cycamore_ReactorInfo"]).unwrap();
    let mut ev = Evaluator::new(&db, nuclides()).with_registry(&registry);
    let frame = ev.eval("AgentState_cycamore_ReactorInfo").unwrap().unwrap();
    assert_eq!(frame.value(0, "cycle_time").unwrap().as_i64(), Some(18));
}
