//! metric-query: query root metrics and filters of a Cyclus output database.
//!
//! Usage:
//!   metric-query --db run.sqlite --list
//!   metric-query --db run.sqlite --metric Transactions --where "Time>=12"
//!   metric-query --db run.sqlite --filter transactions --senders Reactor --receivers Storage
//!   metric-query --db run.sqlite --filter inventory-timeseries --facilities Storage --dates
//!   metric-query --db run.sqlite --synth --seed 7 --ticks 36
//!   metric-query --db run.sqlite --stdin-mode
//!
//! Results are printed as JSON records, one per line. An absent result
//! prints a single `null` line.

use anyhow::{bail, Context, Result};
use cyclus_metrics::{
    derived::DerivedMetric,
    filters::{self, SelectionCriteria},
    registry::MetricGroup,
    synth::{self, SynthParams},
    Condition, Evaluator, Frame, QueryConfig, SimDatabase,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StdinCommand {
    List,
    Metric {
        name: String,
        #[serde(default, rename = "where")]
        conditions: Vec<String>,
    },
    Filter {
        kind: String,
        #[serde(default)]
        criteria: CriteriaArgs,
        #[serde(default)]
        dates: bool,
    },
    Quit,
}

#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct CriteriaArgs {
    senders: Vec<String>,
    receivers: Vec<String>,
    commodities: Vec<String>,
    nucs: Vec<String>,
    facilities: Vec<String>,
}

impl From<CriteriaArgs> for SelectionCriteria {
    fn from(a: CriteriaArgs) -> Self {
        SelectionCriteria::new()
            .senders(a.senders)
            .receivers(a.receivers)
            .commodities(a.commodities)
            .nucs(a.nucs)
            .facilities(a.facilities)
    }
}

#[derive(serde::Serialize)]
struct MetricListing<'a> {
    name: &'a str,
    /// None for derived metrics.
    group: Option<MetricGroup>,
    present: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db_path = flag_value(&args, "--db").unwrap_or(":memory:");
    let config = match flag_value(&args, "--config") {
        Some(path) => QueryConfig::load(path)?,
        None => QueryConfig::default(),
    };

    let synth = has_flag(&args, "--synth");
    let db = open_database(db_path, synth)?;
    if synth {
        let params = SynthParams {
            seed: parse_arg(&args, "--seed", 42u64),
            duration: parse_arg(&args, "--ticks", 24i64),
            reactors: parse_arg(&args, "--reactors", 2u32),
            ..SynthParams::default()
        };
        let summary = synth::generate(&db, &params)?;
        println!("{}", serde_json::to_string(&summary)?);
    }

    let registry = config.registry()?;
    let mut evaler = Evaluator::new(&db, config.nuclear_table()?)
        .with_registry(&registry)
        .with_economics(config.economics.clone())
        .with_cache(config.cache_evaluations);

    let mut out = io::stdout().lock();
    if has_flag(&args, "--stdin-mode") {
        return run_stdin_loop(&mut evaler, &mut out);
    }

    if has_flag(&args, "--list") {
        list_metrics(&evaler, &mut out)?;
    }
    if let Some(name) = flag_value(&args, "--metric") {
        let frame = query_metric(&mut evaler, name, &flag_values(&args, "--where"))?;
        write_frame(&mut out, frame.as_ref())?;
    }
    if let Some(kind) = flag_value(&args, "--filter") {
        let criteria = SelectionCriteria::new()
            .senders(list_arg(&args, "--senders"))
            .receivers(list_arg(&args, "--receivers"))
            .commodities(list_arg(&args, "--commodities"))
            .nucs(list_arg(&args, "--nucs"))
            .facilities(list_arg(&args, "--facilities"));
        let frame = run_filter(&mut evaler, kind, &criteria, has_flag(&args, "--dates"))?;
        write_frame(&mut out, frame.as_ref())?;
    }
    Ok(())
}

/// Open the run at `path`. Without `writable` it is opened read-only and a
/// missing file is an error.
fn open_database(path: &str, writable: bool) -> Result<SimDatabase> {
    if path == ":memory:" {
        return Ok(SimDatabase::in_memory()?);
    }
    if writable {
        return SimDatabase::open(path).with_context(|| format!("cannot create {path}"));
    }
    SimDatabase::open_read_only(path).with_context(|| format!("cannot open {path}"))
}

fn run_stdin_loop(evaler: &mut Evaluator<'_>, out: &mut impl Write) -> Result<()> {
    let stdin = io::stdin();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: StdinCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(out, "{}", serde_json::json!({ "error": e.to_string() }))?;
                out.flush()?;
                continue;
            }
        };

        let result = match cmd {
            StdinCommand::Quit => break,
            cmd => handle_command(evaler, cmd, out),
        };
        if let Err(e) = result {
            log::warn!("request failed: {e:#}");
            writeln!(out, "{}", serde_json::json!({ "error": format!("{e:#}") }))?;
        }
        out.flush()?;
    }
    Ok(())
}

fn handle_command(
    evaler: &mut Evaluator<'_>,
    cmd: StdinCommand,
    out: &mut impl Write,
) -> Result<()> {
    match cmd {
        StdinCommand::List => list_metrics(evaler, out),
        StdinCommand::Metric { name, conditions } => {
            let frame = query_metric(evaler, &name, &conditions)?;
            write_frame(out, frame.as_ref())
        }
        StdinCommand::Filter { kind, criteria, dates } => {
            let frame = run_filter(evaler, &kind, &criteria.into(), dates)?;
            write_frame(out, frame.as_ref())
        }
        StdinCommand::Quit => Ok(()),
    }
}

fn list_metrics(evaler: &Evaluator<'_>, out: &mut impl Write) -> Result<()> {
    let db = evaler.database();
    for metric in evaler.registry().iter() {
        let listing = MetricListing {
            name: metric.name(),
            group: Some(metric.group()),
            present: db.has_table(metric.name())?,
        };
        writeln!(out, "{}", serde_json::to_string(&listing)?)?;
    }
    for derived in DerivedMetric::ALL {
        let listing = MetricListing {
            name: derived.name(),
            group: None,
            present: derived_present(db, derived)?,
        };
        writeln!(out, "{}", serde_json::to_string(&listing)?)?;
    }
    Ok(())
}

fn derived_present(db: &SimDatabase, metric: DerivedMetric) -> Result<bool> {
    for dep in metric.dependencies() {
        let present = match DerivedMetric::from_name(dep) {
            Some(inner) => derived_present(db, inner)?,
            None => db.has_table(dep)?,
        };
        if !present {
            return Ok(false);
        }
    }
    Ok(true)
}

fn query_metric(
    evaler: &mut Evaluator<'_>,
    name: &str,
    conditions: &[String],
) -> Result<Option<Frame>> {
    let conds = conditions
        .iter()
        .map(|c| Condition::parse(c))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(evaler.query(name, &conds)?)
}

fn run_filter(
    evaler: &mut Evaluator<'_>,
    kind: &str,
    criteria: &SelectionCriteria,
    dates: bool,
) -> Result<Option<Frame>> {
    let frame = match kind {
        "transactions" => filters::transaction_frame(evaler, criteria)?,
        "transaction-nuc" => filters::transaction_nuc_frame(evaler, criteria)?,
        "transaction-activity" => filters::transaction_activity_frame(evaler, criteria)?,
        "transaction-decayheat" => filters::transaction_decayheat_frame(evaler, criteria)?,
        "inventory" => filters::inventory_frame(evaler, criteria)?,
        "inventory-activity" => filters::inventory_activity_frame(evaler, criteria)?,
        "inventory-decayheat" => filters::inventory_decayheat_frame(evaler, criteria)?,
        "transaction-timeseries" => filters::transaction_timeseries(evaler, criteria)?,
        "inventory-timeseries" => filters::inventory_timeseries(evaler, criteria)?,
        other => bail!("unknown filter '{other}'"),
    };
    match frame {
        Some(frame) if dates => Ok(Some(filters::with_calendar_dates(evaler, frame)?)),
        frame => Ok(frame),
    }
}

fn write_frame(out: &mut impl Write, frame: Option<&Frame>) -> Result<()> {
    let Some(frame) = frame else {
        writeln!(out, "null")?;
        return Ok(());
    };
    for record in frame.records() {
        writeln!(out, "{}", serde_json::to_string(&record)?)?;
    }
    Ok(())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

/// Every value of a repeatable flag.
fn flag_values(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .collect()
}

/// Comma-separated list flag; absent means empty.
fn list_arg(args: &[String], flag: &str) -> Vec<String> {
    flag_value(args, flag)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
