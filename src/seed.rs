//! Default concept library.

use anyhow::Result;

use crate::db::Database;

/// Concepts a fresh install starts with.
pub const DEFAULT_CONCEPTS: &[&str] = &[
    "BOS",
    "CHoCH",
    "FVG",
    "iFVG",
    "Order Block (OB)",
    "Breaker Block",
    "Mitigation Block",
    "Liquidity Sweep",
    "Equal Highs (EQH)",
    "Equal Lows (EQL)",
    "Premium/Discount",
    "Daily High/Low",
    "Weekly High/Low",
    "Previous Day High (PDH)",
    "Previous Day Low (PDL)",
    "Overnight High",
    "Overnight Low",
    "Killzone Confluence",
    "Market Structure Shift (MSS)",
    "Displacement",
    "Imbalance",
    "Judas Swing",
    "OTE",
    "Round Number / Psychological Level",
];

/// Add any missing default concepts. Returns how many were created.
pub fn seed_default_concepts(db: &Database) -> Result<usize> {
    let created = db.seed_concepts(DEFAULT_CONCEPTS)?;
    tracing::info!(created, "Seeded default concepts");
    Ok(created)
}
