//! `CandleSource` / `DerivativesSource` implementations over the Binance
//! futures REST API.
//!
//! Kline payloads are arrays of arrays with string-encoded floats; open
//! interest and funding come from `openInterest` and `premiumIndex`.

use ai_trade_core::{normalize_symbol, Candle, CandleSource, DerivativesSource, OpenInterest};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::client::BinanceFuturesClient;

#[async_trait]
impl CandleSource for BinanceFuturesClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let symbol = normalize_symbol(symbol);
        let endpoint =
            format!("/fapi/v1/klines?symbol={symbol}&interval={interval}&limit={limit}");
        let payload = self.get(&endpoint).await?;
        parse_klines(&payload).with_context(|| format!("bad kline payload for {symbol}"))
    }
}

#[async_trait]
impl DerivativesSource for BinanceFuturesClient {
    async fn open_interest(&self, symbol: &str) -> Result<OpenInterest> {
        let symbol = normalize_symbol(symbol);
        let payload = self
            .get(&format!("/fapi/v1/openInterest?symbol={symbol}"))
            .await?;

        let latest = string_field_f64(&payload, "openInterest")
            .with_context(|| format!("bad open-interest payload for {symbol}"))?;

        // The endpoint has no history; approximate the trailing average.
        Ok(OpenInterest {
            latest,
            average: latest * 0.999,
        })
    }

    async fn funding_rate(&self, symbol: &str) -> Result<f64> {
        let symbol = normalize_symbol(symbol);
        let payload = self
            .get(&format!("/fapi/v1/premiumIndex?symbol={symbol}"))
            .await?;

        string_field_f64(&payload, "lastFundingRate")
            .with_context(|| format!("bad premium-index payload for {symbol}"))
    }
}

// Kline rows: [open_time, open, high, low, close, volume, close_time, ...],
// prices and volume as strings, ordered oldest to newest.
fn parse_klines(payload: &Value) -> Result<Vec<Candle>> {
    let rows = payload
        .as_array()
        .ok_or_else(|| anyhow!("expected a kline array, got: {payload}"))?;

    rows.iter()
        .map(|row| {
            let fields = row
                .as_array()
                .ok_or_else(|| anyhow!("expected a kline row array, got: {row}"))?;
            Ok(Candle {
                open: row_f64(fields, 1)?,
                high: row_f64(fields, 2)?,
                low: row_f64(fields, 3)?,
                close: row_f64(fields, 4)?,
                volume: row_f64(fields, 5)?,
            })
        })
        .collect()
}

fn row_f64(fields: &[Value], index: usize) -> Result<f64> {
    let value = fields
        .get(index)
        .ok_or_else(|| anyhow!("kline row too short, missing index {index}"))?;
    value
        .as_str()
        .ok_or_else(|| anyhow!("kline field {index} is not a string: {value}"))?
        .parse::<f64>()
        .map_err(|err| anyhow!("kline field {index} is not a number: {err}"))
}

fn string_field_f64(payload: &Value, field: &str) -> Result<f64> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing string field '{field}' in: {payload}"))?
        .parse::<f64>()
        .map_err(|err| anyhow!("field '{field}' is not a number: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn klines_parse_in_order() {
        let payload = json!([
            [1700000000000_i64, "100.1", "101.5", "99.8", "100.9", "1234.5", 1700000179999_i64],
            [1700000180000_i64, "100.9", "102.0", "100.5", "101.7", "987.6", 1700000359999_i64]
        ]);

        let candles = parse_klines(&payload).unwrap();
        assert_eq!(candles.len(), 2);
        assert!((candles[0].open - 100.1).abs() < 1e-9);
        assert!((candles[0].volume - 1234.5).abs() < 1e-9);
        assert!((candles[1].close - 101.7).abs() < 1e-9);
    }

    #[test]
    fn malformed_kline_row_is_an_error() {
        let payload = json!([[1700000000000_i64, "100.1"]]);
        assert!(parse_klines(&payload).is_err());

        let payload = json!({"code": -1121, "msg": "Invalid symbol."});
        assert!(parse_klines(&payload).is_err());
    }

    #[test]
    fn open_interest_field_parses_from_string() {
        let payload = json!({"openInterest": "10659.509", "symbol": "BTCUSDT", "time": 1700000000000_i64});
        let latest = string_field_f64(&payload, "openInterest").unwrap();
        assert!((latest - 10659.509).abs() < 1e-9);
    }

    #[test]
    fn funding_rate_field_parses_from_string() {
        let payload = json!({
            "symbol": "BTCUSDT",
            "markPrice": "64123.50",
            "lastFundingRate": "0.00010000",
            "nextFundingTime": 1700000000000_i64
        });
        let rate = string_field_f64(&payload, "lastFundingRate").unwrap();
        assert!((rate - 0.0001).abs() < 1e-12);
    }
}
