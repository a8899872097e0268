//! Technical analysis over raw candle sequences and the per-cycle market
//! snapshot builder.
//!
//! Indicator functions are pure and synchronous; the builder fans fetches
//! out across symbols and applies the liquidity gate.

pub mod builder;
pub mod error;
pub mod fibonacci;
pub mod indicators;
pub mod snapshot;
pub mod wyckoff;

pub use builder::SnapshotBuilder;
pub use error::MarketError;
pub use fibonacci::{FibLevels, FibonacciAnalysis, PricePosition};
pub use snapshot::{IntradaySeries, LongerTermContext, MarketSnapshot};
pub use wyckoff::{PriceAction, VolumePattern, WyckoffAnalysis, WyckoffPhase, WyckoffSignal};
