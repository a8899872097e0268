pub mod candidates;
pub mod candle;
pub mod config;
pub mod config_loader;
pub mod position;
pub mod symbol;
pub mod traits;

pub use candidates::{CandidateCoin, OiRankEntry};
pub use candle::{Candle, OpenInterest};
pub use config::{AppConfig, BinanceConfig, LeverageConfig, RiskConfig, TraderConfig};
pub use config_loader::ConfigLoader;
pub use position::{AccountState, PerformanceSummary, Position, PositionSide};
pub use symbol::normalize_symbol;
pub use traits::{
    CandidateSource, CandleSource, DerivativesSource, LlmGateway, PromptTemplate, TemplateStore,
};
