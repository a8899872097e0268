//! Per-cycle input bundle. Built fresh every cycle and discarded afterward.

use std::collections::HashMap;

use ai_trade_core::{
    AccountState, CandidateCoin, LeverageConfig, OiRankEntry, PerformanceSummary, Position,
};
use ai_trade_market::MarketSnapshot;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub current_time: DateTime<Utc>,
    pub cycle_number: u64,
    pub runtime_minutes: i64,
    pub account: AccountState,
    pub positions: Vec<Position>,
    pub candidate_coins: Vec<CandidateCoin>,
    pub snapshots: HashMap<String, MarketSnapshot>,
    pub oi_ranks: HashMap<String, OiRankEntry>,
    pub performance: Option<PerformanceSummary>,
    pub leverage: LeverageConfig,
}

impl DecisionContext {
    #[must_use]
    pub fn new(
        current_time: DateTime<Utc>,
        cycle_number: u64,
        runtime_minutes: i64,
        account: AccountState,
        positions: Vec<Position>,
        candidate_coins: Vec<CandidateCoin>,
        leverage: LeverageConfig,
    ) -> Self {
        Self {
            current_time,
            cycle_number,
            runtime_minutes,
            account,
            positions,
            candidate_coins,
            snapshots: HashMap::new(),
            oi_ranks: HashMap::new(),
            performance: None,
            leverage,
        }
    }

    #[must_use]
    pub fn held_symbols(&self) -> Vec<String> {
        self.positions.iter().map(|p| p.symbol.clone()).collect()
    }

    /// How many candidates get analyzed this cycle. The upstream pool is
    /// already ranked and capped, so the whole list qualifies.
    #[must_use]
    pub fn max_candidates(&self) -> usize {
        self.candidate_coins.len()
    }

    /// Candidate symbols in priority order, bounded by [`Self::max_candidates`].
    #[must_use]
    pub fn candidate_symbols(&self) -> Vec<String> {
        self.candidate_coins
            .iter()
            .take(self.max_candidates())
            .map(|c| c.symbol.clone())
            .collect()
    }
}
