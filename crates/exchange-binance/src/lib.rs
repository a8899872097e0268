//! Market data from Binance USDT-margined futures REST endpoints.

pub mod client;
pub mod data_source;

pub use client::BinanceFuturesClient;
