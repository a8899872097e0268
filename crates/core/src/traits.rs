use crate::candidates::OiRankEntry;
use crate::candle::{Candle, OpenInterest};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetches up to `limit` candles for `symbol` at `interval`, ordered
    /// oldest to newest.
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: usize)
        -> Result<Vec<Candle>>;
}

#[async_trait]
pub trait DerivativesSource: Send + Sync {
    async fn open_interest(&self, symbol: &str) -> Result<OpenInterest>;
    async fn funding_rate(&self, symbol: &str) -> Result<f64>;
}

#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Returns the ranked open-interest-growth entries, best rank first.
    async fn ranked_entries(&self) -> Result<Vec<OiRankEntry>>;
}

/// Single synchronous round-trip to the language model. No streaming, no
/// retry; cancellation is the caller dropping the future.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub content: String,
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Looks up a template by name. `Ok(None)` means not found.
    async fn get(&self, name: &str) -> Result<Option<PromptTemplate>>;
}
