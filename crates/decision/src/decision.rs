//! Typed trading decisions decoded from the model reply.
//!
//! The action is an internally tagged sum type: each variant carries exactly
//! the fields its action requires, so an action/field mismatch fails at
//! decode time instead of slipping through as a half-formed record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TradeAction {
    OpenLong {
        leverage: u32,
        stop_loss: f64,
        take_profit: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
        risk_usd: f64,
    },
    OpenShort {
        leverage: u32,
        stop_loss: f64,
        take_profit: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
        risk_usd: f64,
    },
    Close,
    Hold,
    Wait,
    UpdateStopLoss {
        new_stop_loss: f64,
    },
    UpdateTakeProfit {
        new_take_profit: f64,
    },
    PartialClose {
        close_percentage: f64,
    },
}

impl TradeAction {
    /// Wire name of the action, for log and error text.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::OpenLong { .. } => "open_long",
            Self::OpenShort { .. } => "open_short",
            Self::Close => "close",
            Self::Hold => "hold",
            Self::Wait => "wait",
            Self::UpdateStopLoss { .. } => "update_stop_loss",
            Self::UpdateTakeProfit { .. } => "update_take_profit",
            Self::PartialClose { .. } => "partial_close",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub symbol: String,
    #[serde(flatten)]
    pub action: TradeAction,
    #[serde(default)]
    pub reasoning: String,
}

/// One cycle's complete output: the prompts that were sent, the model's
/// chain of thought, and the validated decision list. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullDecision {
    pub system_prompt: String,
    pub user_prompt: String,
    pub cot_trace: String,
    pub decisions: Vec<Decision>,
    pub timestamp: DateTime<Utc>,
}
