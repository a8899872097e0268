use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub binance: BinanceConfig,
    pub trader: TraderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinanceConfig {
    pub api_url: String,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://fapi.binance.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraderConfig {
    /// Short-horizon candle resolution for intraday indicators.
    pub intraday_interval: String,
    /// Long-horizon candle resolution for trend context.
    pub context_interval: String,
    /// Candles fetched per symbol per interval.
    pub candle_limit: usize,
    /// Non-held symbols below this open-interest notional (USD) are dropped.
    pub min_oi_value_usd: f64,
    pub leverage: LeverageConfig,
    pub risk: RiskConfig,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            intraday_interval: "3m".to_string(),
            context_interval: "4h".to_string(),
            candle_limit: 60,
            min_oi_value_usd: 15_000_000.0,
            leverage: LeverageConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeverageConfig {
    /// Symbols allowed the higher `major` cap.
    pub major_symbols: Vec<String>,
    pub major: u32,
    pub altcoin: u32,
}

impl LeverageConfig {
    /// Leverage cap for `symbol`.
    #[must_use]
    pub fn cap_for(&self, symbol: &str) -> u32 {
        if self.major_symbols.iter().any(|s| s == symbol) {
            self.major
        } else {
            self.altcoin
        }
    }
}

impl Default for LeverageConfig {
    fn default() -> Self {
        Self {
            major_symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            major: 10,
            altcoin: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Opens with a stated confidence below this are rejected.
    pub min_confidence: f64,
    /// Hard ceiling on risk_usd as a fraction of account equity.
    pub max_risk_fraction: f64,
    /// Minimum estimated reward/risk ratio for opens.
    pub min_risk_reward: f64,
    /// Synthetic entry is interpolated this far from stop toward take.
    pub entry_offset_fraction: f64,
    pub max_positions: usize,
    pub max_margin_used_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.85,
            max_risk_fraction: 0.03,
            min_risk_reward: 2.0,
            entry_offset_fraction: 0.1,
            max_positions: 5,
            max_margin_used_pct: 90.0,
        }
    }
}
