use anyhow::Result;
use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;

pub struct BinanceFuturesClient {
    http_client: Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
}

impl BinanceFuturesClient {
    /// Creates a client for `base_url` (e.g. `https://fapi.binance.com`).
    ///
    /// # Panics
    /// Never; the rate-limiter quota is a nonzero constant.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        // 1200 request weight per minute = 20 per second
        let quota = Quota::per_second(NonZeroU32::new(20).unwrap());
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            http_client: Client::new(),
            base_url,
            rate_limiter,
        }
    }

    /// Rate-limited GET returning the JSON body.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-JSON body.
    pub async fn get(&self, endpoint: &str) -> Result<serde_json::Value> {
        self.rate_limiter.until_ready().await;
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.http_client.get(&url).send().await?;
        let json = response.json().await?;
        Ok(json)
    }
}
