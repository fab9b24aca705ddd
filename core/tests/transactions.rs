//! Transaction filters against the fixture run in `common`.

mod common;

use common::{approx, scenario_db, sim_id, CS137, U238};
use cyclus_metrics::{
    filters::{
        transaction_activity_frame, transaction_decayheat_frame, transaction_frame,
        transaction_nuc_frame,
    },
    Evaluator, Frame, NuclideTable, QueryError, SelectionCriteria,
};

fn nuclides() -> NuclideTable {
    NuclideTable::builtin().expect("built-in nuclide data")
}

#[test]
fn reactor_to_storage_is_a_single_transaction() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());
    let criteria = SelectionCriteria::new().senders(["Reactor"]).receivers(["Storage"]);

    let trans = transaction_frame(&mut ev, &criteria).unwrap().expect("facilities exist");
    assert_eq!(trans.len(), 1);
    assert_eq!(trans.value(0, "SenderPrototype").unwrap().as_str(), Some("Reactor"));
    assert_eq!(trans.value(0, "ReceiverPrototype").unwrap().as_str(), Some("Storage"));
    assert_eq!(trans.value(0, "Commodity").unwrap().as_str(), Some("spentfuel"));
    assert!(!trans.has_column("Prototype"));
}

#[test]
fn unknown_sender_is_no_result() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());
    let criteria = SelectionCriteria::new().senders(["NoSuchFacility"]);
    assert!(transaction_frame(&mut ev, &criteria).unwrap().is_none());
}

#[test]
fn empty_selection_keeps_every_transaction() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());
    let trans = transaction_frame(&mut ev, &SelectionCriteria::default()).unwrap().unwrap();
    assert_eq!(trans.len(), 3);
}

#[test]
fn commodity_selection() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());

    let uox = transaction_frame(&mut ev, &SelectionCriteria::new().commodities(["uox"]))
        .unwrap()
        .unwrap();
    assert_eq!(uox.len(), 1);
    assert_eq!(uox.value(0, "SenderPrototype").unwrap().as_str(), Some("Storage"));

    // facilities exist, nothing matches: empty frame, not "no result"
    let none = transaction_frame(&mut ev, &SelectionCriteria::new().commodities(["mox"]))
        .unwrap()
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn nuclide_breakdown_fans_out_per_composition_entry() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());

    // two 2-nuclide materials plus one resource without a composition:
    // max(1, 2) + max(1, 2) + max(1, 0)
    let all = transaction_nuc_frame(&mut ev, &SelectionCriteria::default()).unwrap().unwrap();
    assert_eq!(all.len(), 5);

    let first = transaction_nuc_frame(
        &mut ev,
        &SelectionCriteria::new().senders(["Reactor"]).receivers(["Storage"]),
    )
    .unwrap()
    .unwrap();
    assert_eq!(first.len(), 2);
    for row in 0..2 {
        let nuc = first.value(row, "NucId").unwrap().as_i64().unwrap();
        let mass = first.value(row, "Mass").unwrap().as_f64().unwrap();
        match nuc {
            CS137 => assert!(approx(mass, 0.5)),
            U238 => assert!(approx(mass, 1.5)),
            other => panic!("unexpected nuclide {other}"),
        }
    }
}

#[test]
fn nuclide_selection_accepts_any_spelling() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());
    for spelling in ["Cs137", "cs-137", "551370000"] {
        let trans = transaction_nuc_frame(
            &mut ev,
            &SelectionCriteria::new().commodities(["spentfuel"]).nucs([spelling]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(trans.len(), 2, "spelling {spelling}");
        assert!(trans.column("NucId").unwrap().all(|v| v.as_i64() == Some(CS137)));
    }
}

#[test]
fn unknown_nuclide_is_an_error() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());
    let err = transaction_nuc_frame(&mut ev, &SelectionCriteria::new().nucs(["Qq137"]))
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownNuclide { .. }));
}

#[test]
fn activity_and_decay_heat_of_transferred_cs137() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());
    let criteria = SelectionCriteria::new().senders(["Reactor"]).nucs(["Cs137"]);

    // 0.5 kg Cs-137: N_A * 1000 * 0.5 / 137 * λ
    let activity = transaction_activity_frame(&mut ev, &criteria).unwrap().unwrap();
    assert_eq!(activity.len(), 1);
    let a = activity.value(0, "Activity").unwrap().as_f64().unwrap();
    assert!(approx(a, 1604884843587475.2), "activity {a}");

    let heat = transaction_decayheat_frame(&mut ev, &criteria).unwrap().unwrap();
    let h = heat.value(0, "DecayHeat").unwrap().as_f64().unwrap();
    assert!(approx(h, 1.8801729246783553e33), "decay heat {h}");
}

#[test]
fn nuclides_outside_the_selection_need_no_nuclear_data() {
    let db = scenario_db();
    // Bi-209 has no entry in the built-in table
    let trace = Frame::from_rows(
        ["SimId", "QualId", "NucId", "MassFrac"],
        vec![vec![sim_id(), 5.into(), 832090000.into(), 0.0.into()]],
    )
    .unwrap();
    db.write_frame("Compositions", &trace).unwrap();

    let mut ev = Evaluator::new(&db, nuclides());
    let criteria = SelectionCriteria::new().senders(["Reactor"]).nucs(["Cs137"]);
    let activity = transaction_activity_frame(&mut ev, &criteria).unwrap().unwrap();
    assert_eq!(activity.len(), 1);
    let a = activity.value(0, "Activity").unwrap().as_f64().unwrap();
    assert!(approx(a, 1604884843587475.2), "activity {a}");

    let heat = transaction_decayheat_frame(&mut ev, &criteria).unwrap().unwrap();
    assert_eq!(heat.len(), 1);

    // selecting every nuclide still needs data for Bi-209
    let err = transaction_activity_frame(&mut ev, &SelectionCriteria::new().senders(["Reactor"]))
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownNuclide { .. }));
}

#[test]
fn missing_base_table_is_an_error() {
    let db = cyclus_metrics::SimDatabase::in_memory().unwrap();
    let mut ev = Evaluator::new(&db, nuclides());
    let err = transaction_frame(&mut ev, &SelectionCriteria::default()).unwrap_err();
    assert!(matches!(err, QueryError::TableAbsent { ref name } if name == "Transactions"));
}
