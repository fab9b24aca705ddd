//! Root metrics and their registry.
//!
//! A root metric is a table Cyclus writes directly. Every root metric has
//! the same access pattern: if the table exists in this run, return it
//! (optionally filtered), otherwise report it absent. One generic
//! `RootMetric` parameterised by name covers all of them.
//!
//! RULES:
//!   - The builtin registry is built once and never mutated afterwards.
//!   - Registering a name twice is an error, never a silent overwrite.
//!   - An absent table is `Ok(None)`, not an error and not an empty frame.

use crate::{
    condition::Condition,
    error::{QueryError, QueryResult},
    frame::Frame,
    store::{quote_ident, SimDatabase},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricGroup {
    /// Tables every Cyclus run writes.
    Core,
    /// Bookkeeping tables written by the kernel.
    Auxiliary,
    /// Per-agent state.
    AgentState,
    /// Dynamic resource exchange solver diagnostics.
    Solver,
    /// State tables of the archetypes shipped with Cyclus.
    Archetype,
    /// Time series recorded through the Cyclus toolkit.
    Toolkit,
    /// Names added at runtime (third-party archetype tables).
    Custom,
}

/// The table vocabulary of a Cyclus output database.
pub const ROOT_METRICS: &[(&str, MetricGroup)] = &[
    ("Resources", MetricGroup::Core),
    ("Compositions", MetricGroup::Core),
    ("Recipes", MetricGroup::Core),
    ("Products", MetricGroup::Core),
    ("ResCreators", MetricGroup::Core),
    ("Transactions", MetricGroup::Core),
    ("Info", MetricGroup::Core),
    ("TimeStepDur", MetricGroup::Core),
    ("Finish", MetricGroup::Core),
    ("InputFiles", MetricGroup::Core),
    ("DecomSchedule", MetricGroup::Core),
    ("BuildSchedule", MetricGroup::Core),
    ("Snapshots", MetricGroup::Core),
    ("DebugRequests", MetricGroup::Core),
    ("DebugBids", MetricGroup::Core),
    ("ExplicitInventory", MetricGroup::Core),
    ("ExplicitInventoryCompact", MetricGroup::Core),
    ("CommodPriority", MetricGroup::Auxiliary),
    ("DecayMode", MetricGroup::Auxiliary),
    ("FieldTypes", MetricGroup::Auxiliary),
    ("MaterialInfo", MetricGroup::Auxiliary),
    ("NextIds", MetricGroup::Auxiliary),
    ("Prototypes", MetricGroup::Auxiliary),
    ("XMLPPInfo", MetricGroup::Auxiliary),
    ("AgentEntry", MetricGroup::AgentState),
    ("AgentExit", MetricGroup::AgentState),
    ("AgentVersions", MetricGroup::AgentState),
    ("AgentStateAgent", MetricGroup::AgentState),
    ("AgentStateInventories", MetricGroup::AgentState),
    ("GreedySolverInfo", MetricGroup::Solver),
    ("ExchangeSolverInfo", MetricGroup::Solver),
    ("ProgSolverInfo", MetricGroup::Solver),
    ("SolverInfo", MetricGroup::Solver),
    ("AgentState_agents_NullInstInfo", MetricGroup::Archetype),
    ("AgentState_agents_NullRegionInfo", MetricGroup::Archetype),
    ("AgentState_agents_SinkInfo", MetricGroup::Archetype),
    ("AgentState_agents_SourceInfo", MetricGroup::Archetype),
    ("TimeSeriesPower", MetricGroup::Toolkit),
    ("TimeSeriesDeployedInst", MetricGroup::Toolkit),
    ("TimeSeriesThroughput", MetricGroup::Toolkit),
    ("TimeSeriesEnrichmentFeed", MetricGroup::Toolkit),
    ("TimeSeriesEnrichmentSWU", MetricGroup::Toolkit),
    ("Metadata", MetricGroup::Toolkit),
];

/// Accessor for one raw table, bound to its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootMetric {
    name: String,
    group: MetricGroup,
}

impl RootMetric {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> MetricGroup {
        self.group
    }

    /// Read the table from `db`. `Ok(None)` when this run has no such table.
    pub fn query(&self, db: &SimDatabase, conds: &[Condition]) -> QueryResult<Option<Frame>> {
        if !db.has_table(&self.name)? {
            log::debug!("root metric {}: table absent in this run", self.name);
            return Ok(None);
        }
        db.query(&self.name, conds).map(Some)
    }

    /// Column names of the table, `None` when absent.
    pub fn columns(&self, db: &SimDatabase) -> QueryResult<Option<Vec<String>>> {
        if !db.has_table(&self.name)? {
            return Ok(None);
        }
        db.columns(&self.name).map(Some)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    metrics: BTreeMap<String, RootMetric>,
}

static BUILTIN: OnceLock<MetricRegistry> = OnceLock::new();

impl MetricRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry of every table in `ROOT_METRICS`.
    pub fn builtin() -> &'static MetricRegistry {
        BUILTIN.get_or_init(|| {
            let mut registry = Self::new();
            for (name, group) in ROOT_METRICS {
                registry.metrics.insert(
                    name.to_string(),
                    RootMetric { name: name.to_string(), group: *group },
                );
            }
            log::debug!("registry: {} root metrics registered", registry.len());
            registry
        })
    }

    /// The builtin vocabulary plus extra table names, e.g. the state tables
    /// of third-party archetypes.
    pub fn with_extra<S: AsRef<str>>(extra: &[S]) -> QueryResult<Self> {
        let mut registry = Self::builtin().clone();
        for name in extra {
            registry.register(name.as_ref(), MetricGroup::Custom)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, name: &str, group: MetricGroup) -> QueryResult<&RootMetric> {
        quote_ident(name)?;
        if self.metrics.contains_key(name) {
            return Err(QueryError::DuplicateMetric { name: name.to_string() });
        }
        let metric = RootMetric { name: name.to_string(), group };
        Ok(self.metrics.entry(name.to_string()).or_insert(metric))
    }

    pub fn get(&self, name: &str) -> Option<&RootMetric> {
        self.metrics.get(name)
    }

    /// Accessor bound to a registered name.
    pub fn create_accessor(&self, name: &str) -> QueryResult<RootMetric> {
        self.get(name)
            .cloned()
            .ok_or_else(|| QueryError::UnknownMetric { name: name.to_string() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RootMetric> {
        self.metrics.values()
    }
}
