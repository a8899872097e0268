//! Wyckoff-style phase and pattern detection.
//!
//! Phase classification looks at the last 10 candles, named patterns at the
//! last 5. Multiple patterns can fire on the same candle; all matches are
//! reported.

use ai_trade_core::Candle;
use serde::Serialize;
use std::fmt;

use crate::error::MarketError;

const MIN_CANDLES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WyckoffPhase {
    Accumulation,
    Distribution,
    Uptrend,
    Downtrend,
    Consolidation,
}

impl fmt::Display for WyckoffPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Accumulation => "accumulation",
            Self::Distribution => "distribution",
            Self::Uptrend => "uptrend",
            Self::Downtrend => "downtrend",
            Self::Consolidation => "consolidation",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WyckoffSignal {
    Spring,
    Upthrust,
    SignOfStrength,
    SignOfWeakness,
    Climax,
    Test,
    Breakout,
    Breakdown,
}

impl fmt::Display for WyckoffSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Spring => "Spring",
            Self::Upthrust => "Upthrust",
            Self::SignOfStrength => "SOS",
            Self::SignOfWeakness => "SOW",
            Self::Climax => "Climax",
            Self::Test => "Test",
            Self::Breakout => "Breakout",
            Self::Breakdown => "Breakdown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VolumePattern {
    High,
    Low,
    Normal,
    Divergence,
}

impl fmt::Display for VolumePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::High => "high volume",
            Self::Low => "low volume",
            Self::Normal => "normal volume",
            Self::Divergence => "price/volume divergence",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceAction {
    Breakout,
    Breakdown,
    FalseMove,
    Consolidation,
    Trending,
}

impl fmt::Display for PriceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Breakout => "breakout",
            Self::Breakdown => "breakdown",
            Self::FalseMove => "false move",
            Self::Consolidation => "consolidation",
            Self::Trending => "trending",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WyckoffAnalysis {
    pub phase: WyckoffPhase,
    pub signals: Vec<WyckoffSignal>,
    pub volume_pattern: VolumePattern,
    pub price_action: PriceAction,
}

impl WyckoffAnalysis {
    /// Runs phase, pattern, volume, and price-action analysis.
    ///
    /// # Errors
    /// `NotEnoughData` below 20 candles.
    pub fn analyze(candles: &[Candle]) -> Result<Self, MarketError> {
        if candles.len() < MIN_CANDLES {
            return Err(MarketError::NotEnoughData {
                needed: MIN_CANDLES,
                have: candles.len(),
            });
        }

        Ok(Self {
            phase: identify_phase(candles),
            signals: detect_signals(candles),
            volume_pattern: volume_pattern(candles),
            price_action: price_action(candles),
        })
    }
}

/// Classifies the market phase from the last 10 candles.
#[must_use]
pub fn identify_phase(candles: &[Candle]) -> WyckoffPhase {
    if candles.len() < 10 {
        return WyckoffPhase::Consolidation;
    }

    let recent = &candles[candles.len() - 10..];
    let current_price = recent[recent.len() - 1].close;

    let mut avg_change = 0.0;
    for i in 1..recent.len() {
        avg_change += (recent[i].close - recent[i - 1].close) / recent[i - 1].close * 100.0;
    }
    avg_change /= (recent.len() - 1) as f64;

    let volatility = true_range_volatility(recent);

    if volatility < 2.0 && avg_change.abs() < 1.0 {
        return WyckoffPhase::Consolidation;
    }
    if avg_change > 2.0 {
        return WyckoffPhase::Uptrend;
    }
    if avg_change < -2.0 {
        return WyckoffPhase::Downtrend;
    }

    let high = recent.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = recent.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let avg_volume = recent.iter().map(|c| c.volume).sum::<f64>() / recent.len() as f64;

    let range = high - low;
    if range <= 0.0 {
        return WyckoffPhase::Consolidation;
    }
    let position_in_range = (current_price - low) / range;

    if position_in_range < 0.3 && avg_volume > 0.0 {
        WyckoffPhase::Accumulation
    } else if position_in_range > 0.7 && avg_volume > 0.0 {
        WyckoffPhase::Distribution
    } else {
        WyckoffPhase::Consolidation
    }
}

/// Scans the last 5 candles for named patterns. All matches are returned.
#[must_use]
pub fn detect_signals(candles: &[Candle]) -> Vec<WyckoffSignal> {
    let mut signals = Vec::new();
    if candles.len() < 5 {
        return signals;
    }

    let recent = &candles[candles.len() - 5..];

    if is_spring(recent) {
        signals.push(WyckoffSignal::Spring);
    }
    if is_upthrust(recent) {
        signals.push(WyckoffSignal::Upthrust);
    }
    if is_sign_of_strength(recent) {
        signals.push(WyckoffSignal::SignOfStrength);
    }
    if is_sign_of_weakness(recent) {
        signals.push(WyckoffSignal::SignOfWeakness);
    }
    if is_climax(recent) {
        signals.push(WyckoffSignal::Climax);
    }
    if is_test(recent) {
        signals.push(WyckoffSignal::Test);
    }
    if is_breakout(recent) {
        signals.push(WyckoffSignal::Breakout);
    }
    if is_breakdown(recent) {
        signals.push(WyckoffSignal::Breakdown);
    }

    signals
}

// A brief dip below support on the prior candle, reclaimed by the current
// close.
fn is_spring(recent: &[Candle]) -> bool {
    let current = &recent[recent.len() - 1];
    let previous = &recent[recent.len() - 2];

    let lower_shadow = previous.close - previous.low;
    let body = (previous.close - previous.open).abs();

    lower_shadow > body * 2.0 && current.close > previous.close
}

// Mirror of the spring: a rejected poke above resistance.
fn is_upthrust(recent: &[Candle]) -> bool {
    let current = &recent[recent.len() - 1];
    let previous = &recent[recent.len() - 2];

    let upper_shadow = previous.high - previous.close;
    let body = (previous.close - previous.open).abs();

    upper_shadow > body * 2.0 && current.close < previous.close
}

fn is_sign_of_strength(recent: &[Candle]) -> bool {
    let current = &recent[recent.len() - 1];
    current.close > current.open
        && (current.close - current.open) > (current.high - current.low) * 0.6
}

fn is_sign_of_weakness(recent: &[Candle]) -> bool {
    let current = &recent[recent.len() - 1];
    current.close < current.open
        && (current.open - current.close) > (current.high - current.low) * 0.6
}

fn is_climax(recent: &[Candle]) -> bool {
    let current = &recent[recent.len() - 1];
    if current.open <= 0.0 {
        return false;
    }
    (current.high - current.low) / current.open * 100.0 > 5.0
}

fn is_test(recent: &[Candle]) -> bool {
    let current = &recent[recent.len() - 1];
    let body = (current.close - current.open).abs();
    let range = current.high - current.low;
    range > 0.0 && body / range < 0.3
}

fn is_breakout(recent: &[Candle]) -> bool {
    let current = &recent[recent.len() - 1];
    let prior_high = recent[..recent.len() - 1]
        .iter()
        .map(|c| c.high)
        .fold(f64::MIN, f64::max);
    current.close > prior_high
}

fn is_breakdown(recent: &[Candle]) -> bool {
    let current = &recent[recent.len() - 1];
    let prior_low = recent[..recent.len() - 1]
        .iter()
        .map(|c| c.low)
        .fold(f64::MAX, f64::min);
    current.close < prior_low
}

/// Classifies the latest volume against the trailing average.
#[must_use]
pub fn volume_pattern(candles: &[Candle]) -> VolumePattern {
    if candles.len() < 5 {
        return VolumePattern::Normal;
    }

    let recent = &candles[candles.len() - 5..];
    let recent_avg = recent.iter().map(|c| c.volume).sum::<f64>() / recent.len() as f64;

    let start = candles.len().saturating_sub(20);
    let historical = &candles[start..candles.len() - 5];
    let historical_avg = if historical.is_empty() {
        0.0
    } else {
        historical.iter().map(|c| c.volume).sum::<f64>() / historical.len() as f64
    };

    let current_volume = recent[recent.len() - 1].volume;

    if historical_avg > 0.0 {
        let ratio = current_volume / historical_avg;
        if ratio > 2.0 {
            return VolumePattern::High;
        }
        if ratio < 0.5 {
            return VolumePattern::Low;
        }
    }

    if recent_avg > 0.0 && recent[0].open > 0.0 {
        let price_change =
            (recent[recent.len() - 1].close - recent[0].open) / recent[0].open * 100.0;
        let volume_change = (current_volume - recent_avg) / recent_avg * 100.0;
        if price_change.abs() > 2.0 && volume_change.abs() < 1.0 {
            return VolumePattern::Divergence;
        }
    }

    VolumePattern::Normal
}

/// Classifies the short-term price action from the last 3 candles.
#[must_use]
pub fn price_action(candles: &[Candle]) -> PriceAction {
    if candles.len() < 3 {
        return PriceAction::Consolidation;
    }

    let recent = &candles[candles.len() - 3..];
    let total_change = (recent[recent.len() - 1].close - recent[0].open) / recent[0].open * 100.0;
    let volatility = true_range_volatility(recent);

    if total_change.abs() > 3.0 {
        return if total_change > 0.0 {
            PriceAction::Breakout
        } else {
            PriceAction::Breakdown
        };
    }

    if volatility > 2.0 {
        return PriceAction::FalseMove;
    }
    if volatility < 1.0 {
        return PriceAction::Consolidation;
    }

    PriceAction::Trending
}

/// Mean true range as a percentage of the previous close.
fn true_range_volatility(candles: &[Candle]) -> f64 {
    if candles.len() < 2 {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 1..candles.len() {
        sum += candles[i].true_range(candles[i - 1].close) / candles[i - 1].close * 100.0;
    }

    sum / (candles.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            open,
            high,
            low,
            close,
            volume,
        }
    }

    fn flat_candle(price: f64) -> Candle {
        candle(price, price + 0.1, price - 0.1, price, 10.0)
    }

    // ============================================
    // Phase Tests
    // ============================================

    #[test]
    fn steady_rally_classifies_as_uptrend() {
        let mut close = 100.0;
        let mut candles = Vec::new();
        for _ in 0..10 {
            let next = close * 1.03;
            candles.push(candle(close, next + 0.5, close - 0.5, next, 10.0));
            close = next;
        }
        assert_eq!(identify_phase(&candles), WyckoffPhase::Uptrend);
    }

    #[test]
    fn quiet_range_classifies_as_consolidation() {
        let candles: Vec<Candle> = (0..10).map(|_| flat_candle(100.0)).collect();
        assert_eq!(identify_phase(&candles), WyckoffPhase::Consolidation);
    }

    #[test]
    fn volatile_base_near_the_lows_classifies_as_accumulation() {
        let closes = [105.0, 104.0, 105.0, 103.0, 104.0, 102.0, 103.0, 101.0, 102.0, 100.0];
        let candles: Vec<Candle> = closes
            .iter()
            .map(|&c| candle(c, c + 3.0, c - 3.0, c, 10.0))
            .collect();
        assert_eq!(identify_phase(&candles), WyckoffPhase::Accumulation);
    }

    #[test]
    fn volatile_top_near_the_highs_classifies_as_distribution() {
        let closes = [100.0, 101.0, 100.0, 102.0, 101.0, 103.0, 102.0, 104.0, 103.0, 105.0];
        let candles: Vec<Candle> = closes
            .iter()
            .map(|&c| candle(c, c + 3.0, c - 3.0, c, 10.0))
            .collect();
        assert_eq!(identify_phase(&candles), WyckoffPhase::Distribution);
    }

    // ============================================
    // Signal Tests
    // ============================================

    #[test]
    fn long_lower_shadow_reclaimed_is_a_spring() {
        let candles = vec![
            candle(100.0, 101.0, 99.0, 100.0, 10.0),
            candle(100.0, 101.0, 99.0, 100.0, 10.0),
            candle(100.0, 101.0, 99.0, 100.0, 10.0),
            candle(100.0, 100.1, 95.0, 99.5, 10.0),
            candle(100.0, 100.3, 99.9, 100.2, 10.0),
        ];
        let signals = detect_signals(&candles);
        assert!(signals.contains(&WyckoffSignal::Spring), "{signals:?}");
        assert!(!signals.contains(&WyckoffSignal::Upthrust));
    }

    #[test]
    fn wide_bullish_body_fires_sos_climax_and_breakout() {
        let mut candles: Vec<Candle> = (0..4).map(|_| candle(100.0, 101.0, 99.0, 100.0, 10.0)).collect();
        candles.push(candle(100.0, 106.5, 99.8, 106.0, 10.0));
        let signals = detect_signals(&candles);
        assert!(signals.contains(&WyckoffSignal::SignOfStrength), "{signals:?}");
        assert!(signals.contains(&WyckoffSignal::Climax), "{signals:?}");
        assert!(signals.contains(&WyckoffSignal::Breakout), "{signals:?}");
    }

    #[test]
    fn narrow_body_is_a_test() {
        let mut candles: Vec<Candle> = (0..4).map(|_| candle(100.0, 101.0, 99.0, 100.0, 10.0)).collect();
        candles.push(candle(100.0, 101.0, 99.0, 100.1, 10.0));
        let signals = detect_signals(&candles);
        assert!(signals.contains(&WyckoffSignal::Test), "{signals:?}");
    }

    // ============================================
    // Volume / Price Action Tests
    // ============================================

    #[test]
    fn volume_spike_reads_high() {
        let mut candles: Vec<Candle> = (0..19).map(|_| flat_candle(100.0)).collect();
        candles.push(candle(100.0, 100.2, 99.8, 100.0, 25.0));
        assert_eq!(volume_pattern(&candles), VolumePattern::High);
    }

    #[test]
    fn dried_up_volume_reads_low() {
        let mut candles: Vec<Candle> = (0..19).map(|_| flat_candle(100.0)).collect();
        candles.push(candle(100.0, 100.2, 99.8, 100.0, 4.0));
        assert_eq!(volume_pattern(&candles), VolumePattern::Low);
    }

    #[test]
    fn big_move_on_flat_volume_reads_divergence() {
        let mut candles: Vec<Candle> = (0..15).map(|_| flat_candle(100.0)).collect();
        candles.push(candle(100.0, 101.0, 99.9, 100.8, 10.0));
        candles.push(candle(100.8, 101.8, 100.7, 101.6, 10.0));
        candles.push(candle(101.6, 102.6, 101.5, 102.4, 10.0));
        candles.push(candle(102.4, 103.4, 102.3, 103.2, 10.0));
        candles.push(candle(103.2, 103.5, 103.0, 103.1, 10.0));
        assert_eq!(volume_pattern(&candles), VolumePattern::Divergence);
    }

    #[test]
    fn sharp_three_candle_rally_is_a_breakout() {
        let candles = vec![
            candle(100.0, 102.0, 99.5, 101.5, 10.0),
            candle(101.5, 103.0, 101.0, 102.5, 10.0),
            candle(102.5, 104.5, 102.0, 104.0, 10.0),
        ];
        assert_eq!(price_action(&candles), PriceAction::Breakout);
    }

    // ============================================
    // analyze Tests
    // ============================================

    #[test]
    fn analyze_rejects_short_input() {
        let candles: Vec<Candle> = (0..19).map(|_| flat_candle(100.0)).collect();
        let err = WyckoffAnalysis::analyze(&candles).unwrap_err();
        assert_eq!(err, MarketError::NotEnoughData { needed: 20, have: 19 });
    }

    #[test]
    fn analyze_bundles_all_dimensions() {
        let candles: Vec<Candle> = (0..20).map(|_| flat_candle(100.0)).collect();
        let analysis = WyckoffAnalysis::analyze(&candles).unwrap();
        assert_eq!(analysis.phase, WyckoffPhase::Consolidation);
        assert_eq!(analysis.volume_pattern, VolumePattern::Normal);
        assert_eq!(analysis.price_action, PriceAction::Consolidation);
    }
}
