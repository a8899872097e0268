//! Fibonacci retracement over the most recent swing.
//!
//! The swing is the max high / min low of the last 20 candles; retracement
//! levels are measured down from the swing high. The 61.8-70.5 band is the
//! "optimal entry" zone the prompt calls out to the model.

use ai_trade_core::Candle;
use serde::Serialize;
use std::fmt;

use crate::error::MarketError;

const MIN_CANDLES: usize = 30;
const SWING_WINDOW: usize = 20;

/// Retracement levels, one field per standard ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibLevels {
    pub l23_6: f64,
    pub l38_2: f64,
    pub l50_0: f64,
    pub l61_8: f64,
    pub l70_5: f64,
    pub l78_6: f64,
}

impl FibLevels {
    /// Levels measured down from `swing_high` toward `swing_low`.
    #[must_use]
    pub fn from_swing(swing_high: f64, swing_low: f64) -> Self {
        let diff = swing_high - swing_low;
        let level = |ratio: f64| swing_high - diff * ratio;
        Self {
            l23_6: level(0.236),
            l38_2: level(0.382),
            l50_0: level(0.500),
            l61_8: level(0.618),
            l70_5: level(0.705),
            l78_6: level(0.786),
        }
    }
}

/// Where the current price sits relative to the 61.8-70.5 optimal entry
/// band. The band's numeric bounds are `l70_5` (lower) and `l61_8` (upper)
/// since levels are measured down from the swing high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PricePosition {
    InOptimalEntry,
    AboveOptimalEntry,
    BelowOptimalEntry,
}

impl fmt::Display for PricePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InOptimalEntry => "inside the optimal entry zone",
            Self::AboveOptimalEntry => "above the optimal entry zone",
            Self::BelowOptimalEntry => "below the optimal entry zone",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibonacciAnalysis {
    pub swing_high: f64,
    pub swing_low: f64,
    pub levels: FibLevels,
    pub price_position: PricePosition,
}

impl FibonacciAnalysis {
    /// Runs the retracement analysis over `candles`.
    ///
    /// # Errors
    /// `NotEnoughData` below 30 candles; `FlatSwing` when the window has no
    /// price range to retrace.
    pub fn analyze(candles: &[Candle]) -> Result<Self, MarketError> {
        if candles.len() < MIN_CANDLES {
            return Err(MarketError::NotEnoughData {
                needed: MIN_CANDLES,
                have: candles.len(),
            });
        }

        let window = &candles[candles.len() - SWING_WINDOW..];
        let swing_high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let swing_low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);

        if swing_high <= swing_low {
            return Err(MarketError::FlatSwing {
                high: swing_high,
                low: swing_low,
            });
        }

        let levels = FibLevels::from_swing(swing_high, swing_low);
        let current_price = candles[candles.len() - 1].close;
        let price_position = classify_price(current_price, &levels);

        Ok(Self {
            swing_high,
            swing_low,
            levels,
            price_position,
        })
    }
}

fn classify_price(price: f64, levels: &FibLevels) -> PricePosition {
    if price > levels.l61_8 {
        PricePosition::AboveOptimalEntry
    } else if price < levels.l70_5 {
        PricePosition::BelowOptimalEntry
    } else {
        PricePosition::InOptimalEntry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rally_and_retrace_fixture() -> Vec<Candle> {
        // 11 rising candles to a 109500 close, then 20 falling ones whose
        // window bottoms at 93000, closing at 99500.
        let mut candles = Vec::new();
        for i in 0..11 {
            let step = f64::from(i) * 1000.0;
            candles.push(Candle {
                open: 99_000.0 + step,
                high: 100_000.0 + step,
                low: 98_000.0 + step,
                close: 99_500.0 + step,
                volume: 1.0,
            });
        }
        for i in 0..19 {
            let step = f64::from(i) * 500.0;
            candles.push(Candle {
                open: 108_500.0 - step,
                high: 109_500.0 - step,
                low: 102_000.0 - step,
                close: 108_000.0 - step,
                volume: 1.0,
            });
        }
        candles.push(Candle {
            open: 99_000.0,
            high: 101_000.0,
            low: 93_500.0,
            close: 99_500.0,
            volume: 1.0,
        });
        candles
    }

    #[test]
    fn fifty_percent_level_is_the_midpoint() {
        let levels = FibLevels::from_swing(110_000.0, 90_000.0);
        assert!((levels.l50_0 - 100_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn levels_decrease_as_the_ratio_increases() {
        let levels = FibLevels::from_swing(110_000.0, 90_000.0);
        assert!(levels.l23_6 > levels.l38_2);
        assert!(levels.l38_2 > levels.l50_0);
        assert!(levels.l50_0 > levels.l61_8);
        assert!(levels.l61_8 > levels.l70_5);
        assert!(levels.l70_5 > levels.l78_6);
    }

    #[test]
    fn analyze_finds_the_swing_and_classifies_the_close() {
        let candles = rally_and_retrace_fixture();
        let analysis = FibonacciAnalysis::analyze(&candles).unwrap();

        assert!((analysis.swing_high - 109_500.0).abs() < f64::EPSILON);
        assert!((analysis.swing_low - 93_000.0).abs() < f64::EPSILON);
        // 61.8% of the 16500 swing -> 99303; the 99500 close is above it.
        assert!((analysis.levels.l61_8 - 99_303.0).abs() < 1.0);
        assert_eq!(analysis.price_position, PricePosition::AboveOptimalEntry);
    }

    #[test]
    fn analyze_rejects_short_input() {
        let candles = rally_and_retrace_fixture()[..29].to_vec();
        let err = FibonacciAnalysis::analyze(&candles).unwrap_err();
        assert_eq!(err, MarketError::NotEnoughData { needed: 30, have: 29 });
    }

    #[test]
    fn classify_covers_all_three_zones() {
        let levels = FibLevels::from_swing(110_000.0, 90_000.0);
        // Band is [l70_5, l61_8] = [95900, 97640].
        assert_eq!(
            classify_price(96_500.0, &levels),
            PricePosition::InOptimalEntry
        );
        assert_eq!(
            classify_price(99_000.0, &levels),
            PricePosition::AboveOptimalEntry
        );
        assert_eq!(
            classify_price(95_000.0, &levels),
            PricePosition::BelowOptimalEntry
        );
    }
}
