//! Pure indicator math over ordered candle slices.
//!
//! Every function returns 0.0 when the input is shorter than its minimum
//! period, so callers can render "no reading" without a separate check.

use ai_trade_core::Candle;

/// Exponential moving average of closes.
///
/// Seeds with the simple moving average of the first `period` closes, then
/// applies the `2 / (period + 1)` multiplier forward.
#[must_use]
pub fn ema(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period {
        return 0.0;
    }

    let mut ema = candles[..period].iter().map(|c| c.close).sum::<f64>() / period as f64;

    let multiplier = 2.0 / (period as f64 + 1.0);
    for candle in &candles[period..] {
        ema = (candle.close - ema) * multiplier + ema;
    }

    ema
}

/// MACD line: EMA(12) minus EMA(26).
#[must_use]
pub fn macd(candles: &[Candle]) -> f64 {
    if candles.len() < 26 {
        return 0.0;
    }

    ema(candles, 12) - ema(candles, 26)
}

/// Relative strength index with Wilder smoothing.
///
/// Returns 100.0 when the smoothed average loss is zero.
#[must_use]
pub fn rsi(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() <= period {
        return 0.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in 1..=period {
        let change = candles[i].close - candles[i - 1].close;
        if change > 0.0 {
            gains += change;
        } else {
            losses += -change;
        }
    }

    let period_f = period as f64;
    let mut avg_gain = gains / period_f;
    let mut avg_loss = losses / period_f;

    for i in period + 1..candles.len() {
        let change = candles[i].close - candles[i - 1].close;
        if change > 0.0 {
            avg_gain = (avg_gain * (period_f - 1.0) + change) / period_f;
            avg_loss = (avg_loss * (period_f - 1.0)) / period_f;
        } else {
            avg_gain = (avg_gain * (period_f - 1.0)) / period_f;
            avg_loss = (avg_loss * (period_f - 1.0) + (-change)) / period_f;
        }
    }

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Average true range with Wilder smoothing.
#[must_use]
pub fn atr(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() <= period {
        return 0.0;
    }

    let mut trs = vec![0.0; candles.len()];
    for i in 1..candles.len() {
        trs[i] = candles[i].true_range(candles[i - 1].close);
    }

    let period_f = period as f64;
    let mut atr = trs[1..=period].iter().sum::<f64>() / period_f;

    for tr in &trs[period + 1..] {
        atr = (atr * (period_f - 1.0) + tr) / period_f;
    }

    atr
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .map(|&close| Candle {
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect()
    }

    // ============================================
    // ema Tests
    // ============================================

    #[test]
    fn ema_matches_hand_computed_reference() {
        // SMA(1,2,3) = 2; k = 0.5; step 4 -> 3; step 5 -> 4
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let value = ema(&candles, 3);
        assert!((value - 4.0).abs() < 1e-9, "ema was {value}");
    }

    #[test]
    fn ema_returns_zero_below_period() {
        let candles = candles_from_closes(&[1.0, 2.0]);
        assert!((ema(&candles, 3) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_of_constant_series_is_the_constant() {
        let candles = candles_from_closes(&[7.5; 40]);
        assert!((ema(&candles, 20) - 7.5).abs() < 1e-9);
    }

    // ============================================
    // macd Tests
    // ============================================

    #[test]
    fn macd_returns_zero_below_26_candles() {
        let candles = candles_from_closes(&[1.0; 25]);
        assert!((macd(&candles) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn macd_of_constant_series_is_zero() {
        let candles = candles_from_closes(&[42.0; 30]);
        assert!(macd(&candles).abs() < 1e-9);
    }

    #[test]
    fn macd_is_positive_in_an_uptrend_and_equals_ema_difference() {
        let closes: Vec<f64> = (1..=30).map(f64::from).collect();
        let candles = candles_from_closes(&closes);
        let value = macd(&candles);
        assert!(value > 0.0, "macd was {value}");
        let reference = ema(&candles, 12) - ema(&candles, 26);
        assert!((value - reference).abs() < 1e-12);
    }

    // ============================================
    // rsi Tests
    // ============================================

    #[test]
    fn rsi_is_100_when_there_are_no_losses() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let value = rsi(&candles, 3);
        assert!((value - 100.0).abs() < f64::EPSILON, "rsi was {value}");
    }

    #[test]
    fn rsi_matches_hand_computed_reference() {
        // Deltas: +1, -1, +1, -1. Initial averages over 3 deltas:
        // gain 2/3, loss 1/3. Wilder step with -1: gain 4/9, loss 5/9.
        // RS = 0.8 -> RSI = 44.4444...
        let candles = candles_from_closes(&[10.0, 11.0, 10.0, 11.0, 10.0]);
        let value = rsi(&candles, 3);
        assert!((value - 44.444_444_444_444_44).abs() < 1e-9, "rsi was {value}");
    }

    #[test]
    fn rsi_returns_zero_when_input_not_longer_than_period() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0]);
        assert!((rsi(&candles, 3) - 0.0).abs() < f64::EPSILON);
    }

    // ============================================
    // atr Tests
    // ============================================

    #[test]
    fn atr_matches_hand_computed_reference() {
        let candles = vec![
            Candle { open: 9.0, high: 10.0, low: 8.0, close: 9.0, volume: 1.0 },
            Candle { open: 9.0, high: 11.0, low: 9.0, close: 10.0, volume: 1.0 },
            Candle { open: 10.0, high: 12.0, low: 10.0, close: 11.0, volume: 1.0 },
            Candle { open: 11.0, high: 14.0, low: 10.0, close: 12.0, volume: 1.0 },
        ];
        // TRs: 2, 2, 4. Initial ATR(2) = 2, Wilder step -> (2 + 4) / 2 = 3.
        let value = atr(&candles, 2);
        assert!((value - 3.0).abs() < 1e-9, "atr was {value}");
    }

    #[test]
    fn atr_returns_zero_when_input_not_longer_than_period() {
        let candles = candles_from_closes(&[1.0, 2.0]);
        assert!((atr(&candles, 2) - 0.0).abs() < f64::EPSILON);
    }
}
