//! Metric evaluation.
//!
//! Filters only see the `Evaluate` trait: "give me the table called X".
//! `Evaluator` is the concrete implementation over a `SimDatabase`. It
//! resolves derived metrics first, then root metrics, and memoises what it
//! has evaluated for its own lifetime. Nothing else in the crate caches.

use crate::{
    condition::Condition,
    derived::DerivedMetric,
    economics::{EconomicParams, NO_ECONOMICS},
    error::{QueryError, QueryResult},
    frame::Frame,
    nuclide::NuclearData,
    registry::MetricRegistry,
    store::SimDatabase,
};
use std::collections::HashMap;

pub trait Evaluate {
    /// Evaluate the metric called `name`. `Ok(None)` when the metric is
    /// unknown or its table is absent from this run.
    fn eval(&mut self, name: &str) -> QueryResult<Option<Frame>>;

    fn nuclear_data(&self) -> &dyn NuclearData;

    /// Prices for the cash-flow metrics. None configured by default.
    fn economics(&self) -> &EconomicParams {
        &NO_ECONOMICS
    }
}

/// Evaluate a metric the caller cannot do without.
pub fn require<E: Evaluate + ?Sized>(evaler: &mut E, name: &str) -> QueryResult<Frame> {
    evaler
        .eval(name)?
        .ok_or_else(|| QueryError::TableAbsent { name: name.to_string() })
}

pub struct Evaluator<'a> {
    db: &'a SimDatabase,
    registry: &'a MetricRegistry,
    nuclear: Box<dyn NuclearData + 'a>,
    economics: EconomicParams,
    cache: Option<HashMap<String, Option<Frame>>>,
}

impl<'a> Evaluator<'a> {
    /// Evaluator over the builtin registry, with caching enabled.
    pub fn new(db: &'a SimDatabase, nuclear: impl NuclearData + 'a) -> Self {
        Self {
            db,
            registry: MetricRegistry::builtin(),
            nuclear: Box::new(nuclear),
            economics: EconomicParams::default(),
            cache: Some(HashMap::new()),
        }
    }

    pub fn with_registry(mut self, registry: &'a MetricRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_economics(mut self, economics: EconomicParams) -> Self {
        self.economics = economics;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(HashMap::new);
        self
    }

    pub fn database(&self) -> &SimDatabase {
        self.db
    }

    pub fn registry(&self) -> &MetricRegistry {
        self.registry
    }

    /// Query a metric with conditions.
    ///
    /// Root metrics push the conditions down into the database and bypass
    /// the cache. Derived metrics are evaluated, then filtered in memory.
    /// An unknown name is absent, as with `eval`.
    pub fn query(&mut self, name: &str, conds: &[Condition]) -> QueryResult<Option<Frame>> {
        if DerivedMetric::from_name(name).is_some() {
            let Some(frame) = self.eval(name)? else {
                return Ok(None);
            };
            return conds
                .iter()
                .try_fold(frame, |frame, cond| -> QueryResult<Frame> {
                    let idx = frame.column_index(cond.field())?;
                    Ok(frame.filter_rows(|row| cond.holds(&row[idx])))
                })
                .map(Some);
        }
        match self.registry.get(name) {
            Some(metric) => metric.query(self.db, conds),
            None => {
                log::warn!("query: '{name}' is neither a registered nor a derived metric");
                Ok(None)
            }
        }
    }

    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    fn resolve(&mut self, name: &str) -> QueryResult<Option<Frame>> {
        if let Some(derived) = DerivedMetric::from_name(name) {
            return derived.compute(self);
        }
        match self.registry.get(name) {
            Some(metric) => metric.query(self.db, &[]),
            None => {
                log::warn!("eval: '{name}' is neither a registered nor a derived metric");
                Ok(None)
            }
        }
    }
}

impl Evaluate for Evaluator<'_> {
    fn eval(&mut self, name: &str) -> QueryResult<Option<Frame>> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(name)) {
            log::debug!("eval {name}: cached");
            return Ok(hit.clone());
        }
        let result = self.resolve(name)?;
        if let Some(cache) = self.cache.as_mut() {
            cache.insert(name.to_string(), result.clone());
        }
        Ok(result)
    }

    fn nuclear_data(&self) -> &dyn NuclearData {
        self.nuclear.as_ref()
    }

    fn economics(&self) -> &EconomicParams {
        &self.economics
    }
}
