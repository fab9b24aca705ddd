//! Nuclear data: nuclide identifiers, decay constants and decay Q-values.
//!
//! Filters never do nuclide physics themselves. They go through the
//! `NuclearData` trait, so a caller can plug in a full evaluated data
//! library. `NuclideTable` is the built-in implementation: a compact table
//! of the actinides and fission products that dominate fuel-cycle
//! inventories, extendable from a JSON file.
//!
//! Identifiers use the canonical `ZZZAAASSSS` form:
//! `Z * 10^7 + A * 10^4 + state` (Cs-137 = 551370000, Am-242m = 952420001).

use crate::{
    error::{QueryError, QueryResult},
    types::NucId,
};
use serde::Deserialize;
use std::collections::HashMap;

/// Avogadro's number, 1/mol.
pub const AVOGADRO: f64 = 6.0221415e23;

/// MeV per MJ.
pub const MEV_PER_MJ: f64 = 6.2415096471204e18;

const ELEMENTS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga",
    "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd",
    "Ag", "Cd", "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm",
    "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os",
    "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa",
    "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg",
    "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// The nuclear-data boundary used by the filters and derived metrics.
pub trait NuclearData {
    /// Turn a user-facing nuclide name or id into the canonical id.
    fn normalize_nuclide_id(&self, input: &str) -> QueryResult<NucId> {
        parse_nuclide(input)
    }

    /// Decay constant in 1/s. Zero for stable nuclides.
    fn decay_constant(&self, nuc: NucId) -> QueryResult<f64>;

    /// Recoverable energy per decay, in MeV.
    fn q_value(&self, nuc: NucId) -> QueryResult<f64>;

    fn avogadro(&self) -> f64 {
        AVOGADRO
    }

    fn mev_per_mj(&self) -> f64 {
        MEV_PER_MJ
    }
}

/// Atomic number of a canonical id.
pub fn atomic_number(nuc: NucId) -> i64 {
    nuc / 10_000_000
}

/// Mass number of a canonical id.
pub fn mass_number(nuc: NucId) -> i64 {
    (nuc / 10_000) % 1000
}

/// Excitation state of a canonical id (0 = ground state).
pub fn state(nuc: NucId) -> i64 {
    nuc % 10_000
}

/// Human-readable name of a canonical id, e.g. `Cs137` or `Am242M`.
pub fn nuclide_name(nuc: NucId) -> String {
    let z = atomic_number(nuc);
    let symbol = usize::try_from(z - 1)
        .ok()
        .and_then(|i| ELEMENTS.get(i))
        .copied()
        .unwrap_or("?");
    match state(nuc) {
        0 => format!("{symbol}{}", mass_number(nuc)),
        1 => format!("{symbol}{}M", mass_number(nuc)),
        s => format!("{symbol}{}M{s}", mass_number(nuc)),
    }
}

fn compose(z: i64, a: i64, s: i64) -> Option<NucId> {
    if !(1..=118).contains(&z) || a < z || a >= 1000 || !(0..10_000).contains(&s) {
        return None;
    }
    Some(z * 10_000_000 + a * 10_000 + s)
}

fn element_z(symbol: &str) -> Option<i64> {
    ELEMENTS
        .iter()
        .position(|e| e.eq_ignore_ascii_case(symbol))
        .map(|i| i as i64 + 1)
}

/// Parse a nuclide written as `Cs137`, `cs-137`, `137Cs`, `Am242m`,
/// a canonical id (`551370000`) or a short `zzaaam` id (`551370`).
pub fn parse_nuclide(input: &str) -> QueryResult<NucId> {
    let unknown = || QueryError::UnknownNuclide { nuclide: input.to_string() };
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .collect::<String>()
        .to_ascii_lowercase();
    if cleaned.is_empty() {
        return Err(unknown());
    }

    if cleaned.bytes().all(|b| b.is_ascii_digit()) {
        let n: i64 = cleaned.parse().map_err(|_| unknown())?;
        let (z, a, s) = if n >= 10_000_000 {
            (n / 10_000_000, (n / 10_000) % 1000, n % 10_000)
        } else {
            (n / 10_000, (n / 10) % 1000, n % 10)
        };
        return compose(z, a, s).ok_or_else(unknown);
    }

    let split_at = |s: &str, pred: fn(char) -> bool| {
        let end = s.find(|c: char| !pred(c)).unwrap_or(s.len());
        (s[..end].to_string(), s[end..].to_string())
    };

    let (symbol, mass, tail) = if cleaned.starts_with(|c: char| c.is_ascii_alphabetic()) {
        let (symbol, rest) = split_at(&cleaned, |c| c.is_ascii_alphabetic());
        let (mass, tail) = split_at(&rest, |c| c.is_ascii_digit());
        (symbol, mass, tail)
    } else {
        let (mass, rest) = split_at(&cleaned, |c| c.is_ascii_digit());
        (rest, mass, String::new())
    };

    let z = element_z(&symbol).ok_or_else(unknown)?;
    let a: i64 = mass.parse().map_err(|_| unknown())?;
    let s = match tail.as_str() {
        "" => 0,
        "m" => 1,
        t if t.starts_with('m') => t[1..].parse().map_err(|_| unknown())?,
        _ => return Err(unknown()),
    };
    compose(z, a, s).ok_or_else(unknown)
}

#[derive(Debug, Clone, Copy)]
struct NuclideRecord {
    /// Seconds; `None` for stable nuclides.
    half_life: Option<f64>,
    q_value: f64,
}

#[derive(Debug, Deserialize)]
struct NuclideEntry {
    nuclide: String,
    half_life: Option<f64>,
    q_value: f64,
}

#[derive(Debug, Deserialize)]
struct NuclideFile {
    nuclides: Vec<NuclideEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct NuclideTable {
    records: HashMap<NucId, NuclideRecord>,
}

impl NuclideTable {
    /// The table shipped with the crate.
    pub fn builtin() -> QueryResult<Self> {
        let mut table = Self::default();
        table.extend_from_json(include_str!("../data/nuclides.json"))?;
        Ok(table)
    }

    /// Add or override entries from a JSON document with the same layout
    /// as the built-in table.
    pub fn extend_from_json(&mut self, json: &str) -> QueryResult<()> {
        let file: NuclideFile = serde_json::from_str(json)?;
        for entry in file.nuclides {
            let id = parse_nuclide(&entry.nuclide)?;
            if let Some(h) = entry.half_life {
                if !(h.is_finite() && h > 0.0) {
                    return Err(QueryError::MalformedTable {
                        table: "nuclides".into(),
                        reason: format!("{}: half-life must be positive, got {h}", entry.nuclide),
                    });
                }
            }
            self.records.insert(
                id,
                NuclideRecord { half_life: entry.half_life, q_value: entry.q_value },
            );
        }
        Ok(())
    }

    pub fn extend_from_file(&mut self, path: &str) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        self.extend_from_json(&content)?;
        log::info!("nuclide data: loaded overrides from {path}");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, nuc: NucId) -> bool {
        self.records.contains_key(&nuc)
    }

    fn record(&self, nuc: NucId) -> QueryResult<NuclideRecord> {
        self.records
            .get(&nuc)
            .copied()
            .ok_or_else(|| QueryError::UnknownNuclide { nuclide: nuc.to_string() })
    }
}

impl NuclearData for NuclideTable {
    fn decay_constant(&self, nuc: NucId) -> QueryResult<f64> {
        Ok(self
            .record(nuc)?
            .half_life
            .map_or(0.0, |h| std::f64::consts::LN_2 / h))
    }

    fn q_value(&self, nuc: NucId) -> QueryResult<f64> {
        Ok(self.record(nuc)?.q_value)
    }
}
