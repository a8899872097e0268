use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MarketError {
    #[error("not enough candles: need at least {needed}, have {have}")]
    NotEnoughData { needed: usize, have: usize },

    #[error("flat price range: swing high {high} is not above swing low {low}")]
    FlatSwing { high: f64, low: f64 },
}
