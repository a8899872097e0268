use serde::{Deserialize, Serialize};

/// Candidate symbol from the upstream signal pool. List order is priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateCoin {
    pub symbol: String,
    /// Provenance tags, e.g. "ranked_pool" and/or "oi_surge".
    pub sources: Vec<String>,
}

/// One entry from the ranked open-interest-growth feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OiRankEntry {
    pub symbol: String,
    pub rank: u32,
    pub oi_delta_pct: f64,
    pub oi_delta_value: f64,
    pub price_delta_pct: f64,
    pub net_long: f64,
    pub net_short: f64,
}
