use crate::{
    economics::EconomicParams, error::QueryResult, nuclide::NuclideTable,
    registry::MetricRegistry,
};
use serde::{Deserialize, Serialize};

/// Runtime options of the query layer, read from a JSON file.
///
/// ```json
/// {
///   "extra_root_metrics": ["MyArchetypeState"],
///   "nuclide_data": "data/nuclides-endf.json",
///   "cache_evaluations": true,
///   "economics": { "fuel": { "uox": { "supply_cost": 2360.0 } } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Table names registered on top of the builtin vocabulary, for
    /// archetypes that write their own tables.
    pub extra_root_metrics: Vec<String>,
    /// JSON file whose entries extend or override the built-in nuclide data.
    pub nuclide_data: Option<String>,
    /// Memoise evaluated tables for the lifetime of an evaluator.
    pub cache_evaluations: bool,
    /// Prices for the `OperationMaintenance` and `FuelCost` metrics.
    pub economics: EconomicParams,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            extra_root_metrics: Vec::new(),
            nuclide_data: None,
            cache_evaluations: true,
            economics: EconomicParams::default(),
        }
    }
}

impl QueryConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: QueryConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        log::info!(
            "config: {} extra root metrics, nuclide data {}",
            config.extra_root_metrics.len(),
            config.nuclide_data.as_deref().unwrap_or("built-in")
        );
        Ok(config)
    }

    /// Built-in nuclide data plus the configured overrides.
    pub fn nuclear_table(&self) -> anyhow::Result<NuclideTable> {
        let mut table = NuclideTable::builtin()?;
        if let Some(path) = &self.nuclide_data {
            table.extend_from_file(path)?;
        }
        Ok(table)
    }

    /// Builtin vocabulary plus `extra_root_metrics`. A name that collides
    /// with a builtin table is rejected.
    pub fn registry(&self) -> QueryResult<MetricRegistry> {
        MetricRegistry::with_extra(self.extra_root_metrics.as_slice())
    }
}
