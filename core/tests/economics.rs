//! Operation and maintenance payments and fuel costs.

mod common;

use common::{scenario_db, sim_id};
use cyclus_metrics::{
    economics::{FuelPrice, OperationCost, PrototypeEconomics, HOURS_PER_STEP},
    synth::{generate, SynthParams},
    Condition, EconomicParams, Evaluate, Evaluator, Frame, NuclideTable, SimDatabase, Value,
};

fn nuclides() -> NuclideTable {
    NuclideTable::builtin().expect("built-in nuclide data")
}

fn params() -> EconomicParams {
    let mut params = EconomicParams::default();
    params.fuel.insert("uox".into(), FuelPrice { supply_cost: 2360.0, waste_fee: 0.0 });
    params.prototypes.insert(
        "Reactor".into(),
        PrototypeEconomics {
            operation_maintenance: Some(OperationCost { fixed: 5.0, variable: 2.0 }),
            ..PrototypeEconomics::default()
        },
    );
    let mut storage = PrototypeEconomics::default();
    storage
        .fuel
        .insert("spentfuel".into(), FuelPrice { supply_cost: 10.0, waste_fee: 5.0 });
    params.prototypes.insert("Storage".into(), storage);
    params
}

fn write_power(db: &SimDatabase) {
    let row = |agent: i64, time: i64, mwe: f64| -> Vec<Value> {
        vec![sim_id(), agent.into(), time.into(), mwe.into()]
    };
    let power = Frame::from_rows(
        ["SimId", "AgentId", "Time", "Value"],
        vec![row(10, 0, 0.0), row(10, 1, 1000.0), row(10, 2, 800.0), row(11, 0, 5.0)],
    )
    .unwrap();
    db.write_frame("TimeSeriesPower", &power).unwrap();
}

fn payment(frame: &Frame, key: &str, id: i64) -> f64 {
    let row = (0..frame.len())
        .find(|&r| frame.value(r, key).unwrap().as_i64() == Some(id))
        .expect("row present");
    frame.value(row, "Payment").unwrap().as_f64().unwrap()
}

#[test]
fn reactor_pays_for_energy_and_capacity() {
    let db = scenario_db();
    write_power(&db);
    let mut ev = Evaluator::new(&db, nuclides()).with_economics(params());

    let om = ev.eval("OperationMaintenance").unwrap().unwrap();
    assert_eq!(om.len(), 4);

    let reactor = ev
        .query("OperationMaintenance", &[Condition::eq("AgentId", 10)])
        .unwrap()
        .unwrap();
    let pays: Vec<f64> = reactor.column("Payment").unwrap().filter_map(Value::as_f64).collect();
    assert_eq!(pays, [5000.0, 1000.0 * HOURS_PER_STEP * 2.0 + 5000.0, 800.0 * HOURS_PER_STEP * 2.0 + 5000.0]);

    // storage has no operation cost configured
    assert_eq!(payment(&om, "AgentId", 11), 0.0);
}

#[test]
fn receivers_pay_for_the_material_they_receive() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides()).with_economics(params());

    let cost = ev.eval("FuelCost").unwrap().unwrap();
    assert_eq!(cost.columns(), ["SimId", "TransactionId", "AgentId", "Commodity", "Payment", "Time"]);
    assert_eq!(cost.len(), 3);
    // 2 kg of spent fuel into storage at 10 + 5 per kg
    assert_eq!(payment(&cost, "TransactionId", 0), 30.0);
    // separations has no price for spent fuel
    assert_eq!(payment(&cost, "TransactionId", 1), 0.0);
    assert_eq!(payment(&cost, "TransactionId", 2), 2360.0);
}

#[test]
fn without_prices_nothing_is_paid() {
    let db = scenario_db();
    let mut ev = Evaluator::new(&db, nuclides());

    let cost = ev.eval("FuelCost").unwrap().unwrap();
    assert!(cost.column("Payment").unwrap().all(|p| p.as_f64() == Some(0.0)));

    // the fixture writes no power rows
    assert!(ev.eval("OperationMaintenance").unwrap().unwrap().is_empty());
}

#[test]
fn generated_power_series_is_priced() {
    let db = SimDatabase::in_memory().unwrap();
    let run = SynthParams::default();
    generate(&db, &run).unwrap();

    let economics = EconomicParams {
        operation_maintenance: Some(OperationCost { fixed: 1.0, variable: 1.0 }),
        ..EconomicParams::default()
    };
    let mut ev = Evaluator::new(&db, nuclides()).with_economics(economics);
    let om = ev.eval("OperationMaintenance").unwrap().unwrap();
    assert_eq!(om.len(), run.reactors as usize * run.duration as usize);
    let total: f64 = om.column("Payment").unwrap().filter_map(Value::as_f64).sum();
    assert!(total > 0.0);
}
