//! Hard risk invariants over a decision batch.
//!
//! Validation is fail-fast: the first invalid decision rejects the whole
//! batch, and the error names the decision and the rule it broke. Callers
//! that want partial application can walk the batch themselves with
//! [`validate_decision`].

use ai_trade_core::{LeverageConfig, RiskConfig};
use thiserror::Error;

use crate::decision::{Decision, TradeAction};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleViolation {
    #[error("leverage must be between 1 and {max}, got {got}")]
    LeverageOutOfRange { max: u32, got: u32 },

    #[error("stop loss and take profit must both be positive")]
    NonPositiveProtection,

    #[error("confidence {got:.2} is below the {min:.2} floor for opening")]
    LowConfidence { got: f64, min: f64 },

    #[error("risk_usd must be positive")]
    NonPositiveRisk,

    #[error("risk_usd {got:.2} exceeds {max:.2} ({pct:.1}% of account equity)")]
    RiskAboveCeiling { got: f64, max: f64, pct: f64 },

    #[error("a long's stop loss must be below its take profit")]
    LongProtectionInverted,

    #[error("a short's stop loss must be above its take profit")]
    ShortProtectionInverted,

    #[error("estimated risk/reward {got:.2}:1 is below the {min:.1}:1 minimum")]
    RiskRewardTooLow { got: f64, min: f64 },

    #[error("new_stop_loss must be positive")]
    NonPositiveNewStop,

    #[error("new_take_profit must be positive")]
    NonPositiveNewTake,

    #[error("close_percentage must be in (0, 100], got {got}")]
    ClosePercentageOutOfRange { got: f64 },
}

/// A rejected batch: which decision failed and why.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("decision #{index} ({symbol} {action}) rejected: {rule}")]
pub struct ValidationError {
    /// 1-based position in the batch.
    pub index: usize,
    pub symbol: String,
    pub action: &'static str,
    pub rule: RuleViolation,
}

/// Validates the whole batch, fail-fast.
///
/// # Errors
/// The first rule violation, annotated with the offending decision.
pub fn validate_decisions(
    decisions: &[Decision],
    account_equity: f64,
    leverage: &LeverageConfig,
    risk: &RiskConfig,
) -> Result<(), ValidationError> {
    for (i, decision) in decisions.iter().enumerate() {
        validate_decision(decision, account_equity, leverage, risk).map_err(|rule| {
            ValidationError {
                index: i + 1,
                symbol: decision.symbol.clone(),
                action: decision.action.kind(),
                rule,
            }
        })?;
    }
    Ok(())
}

/// Validates a single decision against the per-action contract.
///
/// # Errors
/// The violated rule.
pub fn validate_decision(
    decision: &Decision,
    account_equity: f64,
    leverage: &LeverageConfig,
    risk: &RiskConfig,
) -> Result<(), RuleViolation> {
    match &decision.action {
        TradeAction::OpenLong {
            leverage: lev,
            stop_loss,
            take_profit,
            confidence,
            risk_usd,
        } => validate_open(
            true,
            &decision.symbol,
            *lev,
            *stop_loss,
            *take_profit,
            *confidence,
            *risk_usd,
            account_equity,
            leverage,
            risk,
        ),
        TradeAction::OpenShort {
            leverage: lev,
            stop_loss,
            take_profit,
            confidence,
            risk_usd,
        } => validate_open(
            false,
            &decision.symbol,
            *lev,
            *stop_loss,
            *take_profit,
            *confidence,
            *risk_usd,
            account_equity,
            leverage,
            risk,
        ),
        TradeAction::UpdateStopLoss { new_stop_loss } => {
            if *new_stop_loss <= 0.0 {
                return Err(RuleViolation::NonPositiveNewStop);
            }
            Ok(())
        }
        TradeAction::UpdateTakeProfit { new_take_profit } => {
            if *new_take_profit <= 0.0 {
                return Err(RuleViolation::NonPositiveNewTake);
            }
            Ok(())
        }
        TradeAction::PartialClose { close_percentage } => {
            if *close_percentage <= 0.0 || *close_percentage > 100.0 {
                return Err(RuleViolation::ClosePercentageOutOfRange {
                    got: *close_percentage,
                });
            }
            Ok(())
        }
        TradeAction::Close | TradeAction::Hold | TradeAction::Wait => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
fn validate_open(
    is_long: bool,
    symbol: &str,
    lev: u32,
    stop_loss: f64,
    take_profit: f64,
    confidence: Option<f64>,
    risk_usd: f64,
    account_equity: f64,
    leverage: &LeverageConfig,
    risk: &RiskConfig,
) -> Result<(), RuleViolation> {
    let cap = leverage.cap_for(symbol);
    if lev == 0 || lev > cap {
        return Err(RuleViolation::LeverageOutOfRange { max: cap, got: lev });
    }

    if stop_loss <= 0.0 || take_profit <= 0.0 {
        return Err(RuleViolation::NonPositiveProtection);
    }

    if let Some(confidence) = confidence {
        if confidence < risk.min_confidence {
            return Err(RuleViolation::LowConfidence {
                got: confidence,
                min: risk.min_confidence,
            });
        }
    }

    if risk_usd <= 0.0 {
        return Err(RuleViolation::NonPositiveRisk);
    }
    let max_risk = account_equity * risk.max_risk_fraction;
    if risk_usd > max_risk {
        return Err(RuleViolation::RiskAboveCeiling {
            got: risk_usd,
            max: max_risk,
            pct: risk.max_risk_fraction * 100.0,
        });
    }

    if is_long && stop_loss >= take_profit {
        return Err(RuleViolation::LongProtectionInverted);
    }
    if !is_long && stop_loss <= take_profit {
        return Err(RuleViolation::ShortProtectionInverted);
    }

    let ratio = estimate_risk_reward(is_long, stop_loss, take_profit, risk.entry_offset_fraction);
    if ratio < risk.min_risk_reward {
        return Err(RuleViolation::RiskRewardTooLow {
            got: ratio,
            min: risk.min_risk_reward,
        });
    }

    Ok(())
}

/// Estimates reward/risk for an open before any fill exists.
///
/// The entry price is synthetic: interpolated `entry_offset_fraction` of the
/// way from the stop toward the take. This is an approximation, not a fill
/// price; it lives here as a standalone function so a better estimator can
/// replace it without touching validation control flow.
#[must_use]
pub fn estimate_risk_reward(
    is_long: bool,
    stop_loss: f64,
    take_profit: f64,
    entry_offset_fraction: f64,
) -> f64 {
    let (risk, reward) = if is_long {
        let entry = stop_loss + (take_profit - stop_loss) * entry_offset_fraction;
        (entry - stop_loss, take_profit - entry)
    } else {
        let entry = stop_loss - (stop_loss - take_profit) * entry_offset_fraction;
        (stop_loss - entry, entry - take_profit)
    };

    if risk > 0.0 {
        reward / risk
    } else {
        0.0
    }
}
