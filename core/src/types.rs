//! Shared primitive types used across the query layer.

/// Canonical nuclide identifier in `ZZZAAASSSS` form (Cs-137 = 551370000).
pub type NucId = i64;

/// Identifier of an agent (facility, institution or region) within a run.
pub type AgentId = i64;

/// A simulation time step. One step = one month in a default Cyclus run.
pub type TimeStep = i64;
