//! Per-symbol computed market view, rebuilt every cycle.

use ai_trade_core::{Candle, OpenInterest};
use serde::Serialize;

use crate::error::MarketError;
use crate::fibonacci::FibonacciAnalysis;
use crate::indicators::{atr, ema, macd, rsi};
use crate::wyckoff::WyckoffAnalysis;

/// Points carried per indicator series in the prompt.
const SERIES_POINTS: usize = 10;

/// Rolling intraday indicator series, oldest to latest, at most
/// [`SERIES_POINTS`] entries each. A series stays shorter (or empty) until
/// its indicator has enough history at that point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntradaySeries {
    pub mid_prices: Vec<f64>,
    pub ema20_values: Vec<f64>,
    pub macd_values: Vec<f64>,
    pub rsi7_values: Vec<f64>,
    pub rsi14_values: Vec<f64>,
}

impl IntradaySeries {
    #[must_use]
    pub fn compute(candles: &[Candle]) -> Self {
        let mut series = Self::default();
        let start = candles.len().saturating_sub(SERIES_POINTS);

        for i in start..candles.len() {
            series.mid_prices.push(candles[i].close);

            let prefix = &candles[..=i];
            if i >= 19 {
                series.ema20_values.push(ema(prefix, 20));
            }
            if i >= 25 {
                series.macd_values.push(macd(prefix));
            }
            if i >= 7 {
                series.rsi7_values.push(rsi(prefix, 7));
            }
            if i >= 14 {
                series.rsi14_values.push(rsi(prefix, 14));
            }
        }

        series
    }
}

/// Long-horizon trend context from the slower candle resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LongerTermContext {
    pub ema20: f64,
    pub ema50: f64,
    pub atr3: f64,
    pub atr14: f64,
    pub current_volume: f64,
    pub average_volume: f64,
    pub macd_values: Vec<f64>,
    pub rsi14_values: Vec<f64>,
}

impl LongerTermContext {
    #[must_use]
    pub fn compute(candles: &[Candle]) -> Self {
        let mut context = Self {
            ema20: ema(candles, 20),
            ema50: ema(candles, 50),
            atr3: atr(candles, 3),
            atr14: atr(candles, 14),
            ..Self::default()
        };

        if let Some(last) = candles.last() {
            context.current_volume = last.volume;
            context.average_volume =
                candles.iter().map(|c| c.volume).sum::<f64>() / candles.len() as f64;
        }

        let start = candles.len().saturating_sub(SERIES_POINTS);
        for i in start..candles.len() {
            let prefix = &candles[..=i];
            if i >= 25 {
                context.macd_values.push(macd(prefix));
            }
            if i >= 14 {
                context.rsi14_values.push(rsi(prefix, 14));
            }
        }

        context
    }
}

/// One symbol's computed market view. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub current_price: f64,
    pub current_ema20: f64,
    pub current_macd: f64,
    pub current_rsi7: f64,
    pub price_change_1h: f64,
    pub price_change_4h: f64,
    pub open_interest: OpenInterest,
    pub funding_rate: f64,
    /// Latest intraday candle, kept for candle-shape annotation.
    pub latest_candle: Candle,
    pub intraday: IntradaySeries,
    pub longer_term: LongerTermContext,
    pub fibonacci: Option<FibonacciAnalysis>,
    pub wyckoff: Option<WyckoffAnalysis>,
}

impl MarketSnapshot {
    /// Computes the snapshot from both candle resolutions.
    ///
    /// Fibonacci and Wyckoff analyses run over the long-horizon candles and
    /// simply come back `None` when the history is too short.
    ///
    /// # Errors
    /// `NotEnoughData` when the intraday sequence is empty.
    pub fn compute(
        symbol: &str,
        intraday_candles: &[Candle],
        context_candles: &[Candle],
        open_interest: OpenInterest,
        funding_rate: f64,
    ) -> Result<Self, MarketError> {
        let latest_candle = *intraday_candles
            .last()
            .ok_or(MarketError::NotEnoughData { needed: 1, have: 0 })?;
        let current_price = latest_candle.close;

        // One hour back at the intraday resolution is 20 candles.
        let mut price_change_1h = 0.0;
        if intraday_candles.len() >= 21 {
            let price_1h_ago = intraday_candles[intraday_candles.len() - 21].close;
            if price_1h_ago > 0.0 {
                price_change_1h = (current_price - price_1h_ago) / price_1h_ago * 100.0;
            }
        }

        let mut price_change_4h = 0.0;
        if context_candles.len() >= 2 {
            let price_4h_ago = context_candles[context_candles.len() - 2].close;
            if price_4h_ago > 0.0 {
                price_change_4h = (current_price - price_4h_ago) / price_4h_ago * 100.0;
            }
        }

        Ok(Self {
            symbol: symbol.to_string(),
            current_price,
            current_ema20: ema(intraday_candles, 20),
            current_macd: macd(intraday_candles),
            current_rsi7: rsi(intraday_candles, 7),
            price_change_1h,
            price_change_4h,
            open_interest,
            funding_rate,
            latest_candle,
            intraday: IntradaySeries::compute(intraday_candles),
            longer_term: LongerTermContext::compute(context_candles),
            fibonacci: FibonacciAnalysis::analyze(context_candles).ok(),
            wyckoff: WyckoffAnalysis::analyze(context_candles).ok(),
        })
    }

    /// Open-interest notional in USD.
    #[must_use]
    pub fn oi_value_usd(&self) -> f64 {
        self.open_interest.latest * self.current_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .map(|&close| Candle {
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 5.0,
            })
            .collect()
    }

    #[test]
    fn series_are_bounded_to_ten_points() {
        let closes: Vec<f64> = (1..=40).map(f64::from).collect();
        let series = IntradaySeries::compute(&candles_from_closes(&closes));
        assert_eq!(series.mid_prices.len(), 10);
        assert_eq!(series.ema20_values.len(), 10);
        assert_eq!(series.macd_values.len(), 10);
        assert_eq!(series.rsi7_values.len(), 10);
        assert_eq!(series.rsi14_values.len(), 10);
    }

    #[test]
    fn short_history_leaves_slow_series_empty() {
        let closes: Vec<f64> = (1..=10).map(f64::from).collect();
        let series = IntradaySeries::compute(&candles_from_closes(&closes));
        assert_eq!(series.mid_prices.len(), 10);
        assert!(series.ema20_values.is_empty());
        assert!(series.macd_values.is_empty());
        // RSI7 needs index >= 7: points 8, 9, 10.
        assert_eq!(series.rsi7_values.len(), 3);
    }

    #[test]
    fn price_changes_use_the_fixed_offsets() {
        let mut closes = vec![100.0; 21];
        closes[0] = 80.0; // 21 candles back from the end is index 0
        let intraday = candles_from_closes(&closes);
        let context = candles_from_closes(&[90.0, 100.0]);

        let snapshot = MarketSnapshot::compute(
            "BTCUSDT",
            &intraday,
            &context,
            OpenInterest::default(),
            0.0001,
        )
        .unwrap();

        assert!((snapshot.price_change_1h - 25.0).abs() < 1e-9);
        // 4h-ago close is the previous context candle: 90 -> 100 is +11.1%.
        assert!((snapshot.price_change_4h - (100.0 - 90.0) / 90.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_intraday_input_is_an_error() {
        let err = MarketSnapshot::compute(
            "BTCUSDT",
            &[],
            &[],
            OpenInterest::default(),
            0.0,
        )
        .unwrap_err();
        assert_eq!(err, MarketError::NotEnoughData { needed: 1, have: 0 });
    }

    #[test]
    fn long_context_enables_fibonacci_and_wyckoff() {
        let closes: Vec<f64> = (1..=40).map(|i| 100.0 + f64::from(i)).collect();
        let intraday = candles_from_closes(&closes);
        let context = candles_from_closes(&closes);

        let snapshot = MarketSnapshot::compute(
            "ETHUSDT",
            &intraday,
            &context,
            OpenInterest { latest: 1000.0, average: 999.0 },
            0.0,
        )
        .unwrap();

        assert!(snapshot.fibonacci.is_some());
        assert!(snapshot.wyckoff.is_some());
        assert!((snapshot.oi_value_usd() - 1000.0 * snapshot.current_price).abs() < 1e-9);
    }
}
