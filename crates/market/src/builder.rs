//! Concurrent per-symbol snapshot assembly.
//!
//! Candle fetches are mandatory; open interest and funding rate are
//! best-effort and fall back to defaults, matching the upstream data layer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ai_trade_core::{normalize_symbol, CandleSource, DerivativesSource, TraderConfig};
use anyhow::Result;
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::snapshot::MarketSnapshot;

pub struct SnapshotBuilder {
    candles: Arc<dyn CandleSource>,
    derivatives: Arc<dyn DerivativesSource>,
    intraday_interval: String,
    context_interval: String,
    candle_limit: usize,
    min_oi_value_usd: f64,
}

impl SnapshotBuilder {
    #[must_use]
    pub fn new(
        candles: Arc<dyn CandleSource>,
        derivatives: Arc<dyn DerivativesSource>,
        config: &TraderConfig,
    ) -> Self {
        Self {
            candles,
            derivatives,
            intraday_interval: config.intraday_interval.clone(),
            context_interval: config.context_interval.clone(),
            candle_limit: config.candle_limit,
            min_oi_value_usd: config.min_oi_value_usd,
        }
    }

    /// Builds snapshots for all held symbols plus the candidate list.
    ///
    /// Symbols fetch concurrently with no ordering guarantee. A failing
    /// symbol is skipped; the liquidity gate drops non-held symbols whose
    /// open-interest notional is under the configured floor. Held symbols
    /// are exempt from the gate because they still need an exit decision.
    pub async fn build(
        &self,
        held_symbols: &[String],
        candidate_symbols: &[String],
    ) -> HashMap<String, MarketSnapshot> {
        let held: HashSet<String> =
            held_symbols.iter().map(|s| normalize_symbol(s)).collect();

        let mut symbols = Vec::new();
        let mut seen = HashSet::new();
        for symbol in held_symbols.iter().chain(candidate_symbols.iter()) {
            let symbol = normalize_symbol(symbol);
            if seen.insert(symbol.clone()) {
                symbols.push(symbol);
            }
        }

        let mut handles = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let candles = Arc::clone(&self.candles);
            let derivatives = Arc::clone(&self.derivatives);
            let intraday_interval = self.intraday_interval.clone();
            let context_interval = self.context_interval.clone();
            let limit = self.candle_limit;

            handles.push(tokio::spawn(async move {
                let result = fetch_snapshot(
                    candles.as_ref(),
                    derivatives.as_ref(),
                    &symbol,
                    &intraday_interval,
                    &context_interval,
                    limit,
                )
                .await;
                (symbol, result)
            }));
        }

        let mut snapshots = HashMap::new();
        for joined in join_all(handles).await {
            let Ok((symbol, result)) = joined else {
                continue;
            };

            match result {
                Ok(snapshot) => {
                    if !held.contains(&symbol)
                        && snapshot.open_interest.latest > 0.0
                        && snapshot.current_price > 0.0
                        && snapshot.oi_value_usd() < self.min_oi_value_usd
                    {
                        info!(
                            "{} open-interest notional {:.2}M USD under the liquidity floor, dropping",
                            symbol,
                            snapshot.oi_value_usd() / 1_000_000.0
                        );
                        continue;
                    }
                    snapshots.insert(symbol, snapshot);
                }
                Err(err) => {
                    warn!("market data fetch for {symbol} failed, skipping: {err:#}");
                }
            }
        }

        snapshots
    }
}

async fn fetch_snapshot(
    candles: &dyn CandleSource,
    derivatives: &dyn DerivativesSource,
    symbol: &str,
    intraday_interval: &str,
    context_interval: &str,
    limit: usize,
) -> Result<MarketSnapshot> {
    let intraday = candles.fetch_candles(symbol, intraday_interval, limit).await?;
    let context = candles.fetch_candles(symbol, context_interval, limit).await?;

    // Open interest and funding are annotations, not prerequisites.
    let open_interest = derivatives.open_interest(symbol).await.unwrap_or_default();
    let funding_rate = derivatives.funding_rate(symbol).await.unwrap_or(0.0);

    Ok(MarketSnapshot::compute(
        symbol,
        &intraday,
        &context,
        open_interest,
        funding_rate,
    )?)
}
