//! Metrics over Cyclus fuel-cycle simulation output databases.
//!
//! Root metrics are the tables Cyclus writes; derived metrics and the
//! filters in [`filters`] are computed from them on demand. Everything is
//! read through the [`evaluator::Evaluate`] trait, so filters work the
//! same against a live database and against in-memory test tables.

pub mod condition;
pub mod config;
pub mod derived;
pub mod economics;
pub mod error;
pub mod evaluator;
pub mod filters;
pub mod frame;
pub mod nuclide;
pub mod registry;
pub mod rng;
pub mod store;
pub mod synth;
pub mod types;
pub mod value;

pub use condition::{CmpOp, Condition};
pub use config::QueryConfig;
pub use economics::EconomicParams;
pub use error::{QueryError, QueryResult};
pub use evaluator::{require, Evaluate, Evaluator};
pub use filters::SelectionCriteria;
pub use frame::{Frame, Membership};
pub use nuclide::{NuclearData, NuclideTable};
pub use registry::{MetricRegistry, RootMetric};
pub use store::SimDatabase;
pub use value::Value;
