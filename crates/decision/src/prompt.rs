//! Prompt construction: fixed rules in the system prompt, per-cycle data in
//! the user prompt.
//!
//! The exact text layout is an implementation detail; the information
//! content (account state, per-position analysis, per-candidate multi-
//! timeframe read-outs) is the contract.

use ai_trade_core::{
    Candle, LeverageConfig, Position, PositionSide, RiskConfig, TemplateStore,
};
use ai_trade_market::{LongerTermContext, MarketSnapshot};
use tracing::warn;

use crate::context::DecisionContext;
use crate::templates::DEFAULT_TEMPLATE_NAME;

/// Last-resort system prompt when no template can be loaded at all.
const BUILTIN_FALLBACK_PROMPT: &str = "You are a professional crypto perpetual-futures \
trading AI. Analyze the market data you are given and respond with trading decisions.";

/// Caller-facing knobs for system-prompt assembly.
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    /// Extra strategy text appended to the base prompt.
    pub custom_prompt: Option<String>,
    /// When set (and custom text exists), the custom text replaces the base
    /// template and generated constraints entirely.
    pub override_base: bool,
    /// Template to use instead of `default`.
    pub template_name: Option<String>,
}

/// Builds the system prompt: base template, generated hard constraints, and
/// the optional custom-strategy addendum.
pub async fn build_system_prompt(
    store: &dyn TemplateStore,
    account_equity: f64,
    leverage: &LeverageConfig,
    risk: &RiskConfig,
    options: &PromptOptions,
) -> String {
    let custom = options
        .custom_prompt
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if options.override_base {
        if let Some(custom) = custom {
            return custom.to_string();
        }
    }

    let mut s = resolve_base_template(store, options.template_name.as_deref()).await;
    s.push_str("\n\n");

    s.push_str("# Risk Management Protocol (mandatory)\n\n");
    s.push_str(&format!(
        "1. **profit_target**: minimum reward/risk {:.1}:1\n",
        risk.min_risk_reward
    ));
    s.push_str("2. **stop_loss**: cap any single loss at 1-3% of account equity\n");
    s.push_str(&format!(
        "3. **confidence**: below {:.2} do not open a position\n",
        risk.min_confidence
    ));
    s.push_str(&format!(
        "4. **risk_usd**: must be <= {:.2} USD ({:.1}% of the {:.2} USD equity)\n",
        account_equity * risk.max_risk_fraction,
        risk.max_risk_fraction * 100.0,
        account_equity
    ));
    s.push_str(&format!(
        "5. **leverage**: up to {}x on {}, up to {}x on everything else\n",
        leverage.major,
        leverage.major_symbols.join("/"),
        leverage.altcoin
    ));
    s.push_str(&format!(
        "6. **exposure**: at most {} concurrent positions, margin use under {:.0}%\n\n",
        risk.max_positions, risk.max_margin_used_pct
    ));

    s.push_str("# Output Format\n\n");
    s.push_str("Step 1: chain of thought (plain text)\n");
    s.push_str("A concise walkthrough of your reasoning\n\n");
    s.push_str("Step 2: JSON decision array\n\n");
    s.push_str("```json\n[\n");
    s.push_str(&format!(
        "  {{\"symbol\": \"BTCUSDT\", \"action\": \"open_short\", \"leverage\": {}, \
         \"stop_loss\": 68000, \"take_profit\": 65000, \"confidence\": 0.88, \
         \"risk_usd\": 200, \"reasoning\": \"bearish on 6/8 indicators\"}},\n",
        leverage.major
    ));
    s.push_str(
        "  {\"symbol\": \"ETHUSDT\", \"action\": \"update_stop_loss\", \
         \"new_stop_loss\": 3500, \"reasoning\": \"profit > 3%, stop to break-even\"},\n",
    );
    s.push_str(
        "  {\"symbol\": \"SOLUSDT\", \"action\": \"close\", \"reasoning\": \
         \"trend reversal, exiting\"}\n",
    );
    s.push_str("]\n```\n\n");
    s.push_str("Field notes:\n");
    s.push_str(
        "- `action`: open_long | open_short | close | hold | wait | update_stop_loss | \
         update_take_profit | partial_close\n",
    );
    s.push_str(&format!(
        "- `confidence`: 0-1 (opens must be >= {:.2})\n",
        risk.min_confidence
    ));
    s.push_str("- opens require: leverage, stop_loss, take_profit, confidence, risk_usd\n");
    s.push_str("- adjustments require: new_stop_loss / new_take_profit / close_percentage\n");

    if let Some(custom) = custom {
        s.push_str("\n# Personalized Trading Strategy\n\n");
        s.push_str(custom);
        s.push_str(
            "\n\nNote: the personalized strategy supplements the base rules and must not \
             override the risk controls above.\n",
        );
    }

    s
}

async fn resolve_base_template(store: &dyn TemplateStore, name: Option<&str>) -> String {
    let name = name.unwrap_or(DEFAULT_TEMPLATE_NAME);

    match store.get(name).await {
        Ok(Some(template)) => return template.content,
        Ok(None) => {
            warn!("prompt template '{name}' not found, falling back to '{DEFAULT_TEMPLATE_NAME}'");
        }
        Err(err) => {
            warn!("prompt template lookup for '{name}' failed, falling back: {err:#}");
        }
    }

    match store.get(DEFAULT_TEMPLATE_NAME).await {
        Ok(Some(template)) => template.content,
        _ => {
            warn!("no prompt template available, using the built-in fallback");
            BUILTIN_FALLBACK_PROMPT.to_string()
        }
    }
}

/// Serializes the decision context into the user prompt.
#[must_use]
pub fn build_user_prompt(ctx: &DecisionContext) -> String {
    let mut s = String::new();

    s.push_str(&format!(
        "Time: {} | Cycle: #{} | Uptime: {} min\n\n",
        ctx.current_time.format("%Y-%m-%d %H:%M:%S UTC"),
        ctx.cycle_number,
        ctx.runtime_minutes
    ));

    let account = &ctx.account;
    let available_pct = if account.total_equity > 0.0 {
        account.available_balance / account.total_equity * 100.0
    } else {
        0.0
    };
    s.push_str("### Account\n");
    s.push_str(&format!(
        "Equity: {:.2} USDT | Available: {:.2} ({:.1}%) | Total PnL: {:+.2}%\n",
        account.total_equity, account.available_balance, available_pct, account.total_pnl_pct
    ));
    s.push_str(&format!(
        "Margin used: {:.1}% | Open positions: {}\n\n",
        account.margin_used_pct, account.position_count
    ));

    if let Some(performance) = &ctx.performance {
        s.push_str(&format!("### Sharpe Ratio: {:.2}\n\n", performance.sharpe_ratio));
    }

    if let Some(btc) = ctx.snapshots.get("BTCUSDT") {
        s.push_str("### BTC Regime (check first)\n");
        s.push_str(&format!(
            "Price: ${:.2} | {}\n",
            btc.current_price,
            ema_relation(btc)
        ));
        s.push_str(&format!(
            "- **Intraday MACD**: {:.4} ({})\n",
            btc.current_macd,
            macd_label(btc.current_macd)
        ));
        let series = &btc.longer_term.macd_values;
        if let Some(latest) = series.last() {
            s.push_str(&format!(
                "- **Long-horizon MACD (latest)**: {:.4} ({})\n",
                latest,
                macd_label(*latest)
            ));
        }
        if series.len() >= 3 {
            let earlier = series[series.len() - 3];
            s.push_str(&format!(
                "- **Long-horizon MACD (3 bars back)**: {:.4} ({})\n",
                earlier,
                macd_label(earlier)
            ));
        }
        s.push('\n');
    }

    if ctx.positions.is_empty() {
        s.push_str("### Open Positions: none\n\n");
    } else {
        s.push_str("### Open Positions\n");
        for (i, position) in ctx.positions.iter().enumerate() {
            let Some(snapshot) = ctx.snapshots.get(&position.symbol) else {
                continue;
            };

            let mut holding = String::new();
            if position.update_time > 0 {
                let minutes =
                    (ctx.current_time.timestamp_millis() - position.update_time) / 60_000;
                holding = format!(" | held {minutes} min");
            }

            s.push_str(&format!(
                "{}. **{}** {} | entry: {:.4} | mark: {:.4} | PnL: {:+.2}%{}\n",
                i + 1,
                position.symbol,
                position.side.as_str(),
                position.entry_price,
                position.mark_price,
                position.unrealized_pnl_pct,
                holding
            ));
            s.push_str(&format!(
                "   risk/reward: {:.2} | advice: {}\n\n",
                position_risk_reward(position),
                hold_advice(position, snapshot)
            ));
        }
    }

    s.push_str("### New Opportunities\n");
    let mut displayed = 0;
    for coin in ctx.candidate_coins.iter().take(ctx.max_candidates()) {
        let Some(snapshot) = ctx.snapshots.get(&coin.symbol) else {
            continue;
        };
        displayed += 1;

        s.push_str(&format!("#### {}. **{}**\n", displayed, coin.symbol));
        s.push_str(&format!(
            "- **Price**: ${:.4} ({}{})\n",
            snapshot.current_price,
            ema_relation(snapshot),
            candle_shape_flags(&snapshot.latest_candle)
        ));

        let mut trend = format!(
            "intraday MACD: {:.4} ({})",
            snapshot.current_macd,
            macd_label(snapshot.current_macd)
        );
        if let Some(latest) = snapshot.longer_term.macd_values.last() {
            trend.push_str(&format!(
                " | long-horizon MACD: {:.4} ({})",
                latest,
                macd_label(*latest)
            ));
        }
        s.push_str(&format!("- **Trend**: {trend}\n"));

        let mut momentum = format!("RSI7: {:.2} ({})", snapshot.current_rsi7, rsi_label(snapshot.current_rsi7));
        if let Some(rsi14) = snapshot.longer_term.rsi14_values.last() {
            momentum.push_str(&format!(" | RSI14: {:.2} ({})", rsi14, rsi_label(*rsi14)));
        }
        s.push_str(&format!("- **Momentum**: {momentum}\n"));

        let oi_info = ctx.oi_ranks.get(&coin.symbol).map_or_else(
            || "no OI data".to_string(),
            |entry| format!("OI delta: {:+.2}%", entry.oi_delta_pct),
        );
        s.push_str(&format!(
            "- **Market**: funding: {:.2e} | {} | {}\n",
            snapshot.funding_rate,
            oi_info,
            volume_label(&snapshot.longer_term)
        ));

        let mut patterns = Vec::new();
        if let Some(wyckoff) = &snapshot.wyckoff {
            patterns.push(format!("phase {}", wyckoff.phase));
            if !wyckoff.signals.is_empty() {
                patterns.push(
                    wyckoff
                        .signals
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                );
            }
        }
        if let Some(fibonacci) = &snapshot.fibonacci {
            patterns.push(format!("price {}", fibonacci.price_position));
        }
        if !patterns.is_empty() {
            s.push_str(&format!("- **Patterns**: {}\n", patterns.join(" | ")));
        }
        s.push('\n');
    }

    s.push_str("\n---\n\n");
    s.push_str(
        "Follow the decision process and risk protocol from the system prompt, then output \
         your analysis (chain of thought) followed by the JSON decision array.\n",
    );

    s
}

fn ema_relation(snapshot: &MarketSnapshot) -> &'static str {
    if snapshot.current_price < snapshot.current_ema20 {
        "price < EMA20"
    } else {
        "price > EMA20"
    }
}

fn macd_label(macd: f64) -> &'static str {
    if macd > 0.0 {
        "bullish"
    } else if macd < 0.0 {
        "bearish"
    } else {
        "flat"
    }
}

fn rsi_label(rsi: f64) -> &'static str {
    if rsi < 30.0 {
        "oversold"
    } else if rsi > 70.0 {
        "overbought"
    } else if rsi < 35.0 {
        "low"
    } else if rsi > 65.0 {
        "high"
    } else if rsi < 50.0 {
        "weak"
    } else {
        "strong"
    }
}

/// Realized-so-far reward against distance to liquidation.
fn position_risk_reward(position: &Position) -> f64 {
    let (risk, reward) = match position.side {
        PositionSide::Long => (
            position.entry_price - position.liquidation_price,
            position.mark_price - position.entry_price,
        ),
        PositionSide::Short => (
            position.liquidation_price - position.entry_price,
            position.entry_price - position.mark_price,
        ),
    };

    if risk > 0.0 {
        reward / risk
    } else {
        0.0
    }
}

fn hold_advice(position: &Position, snapshot: &MarketSnapshot) -> String {
    let mut advice = Vec::new();

    if position.unrealized_pnl_pct > 5.0 {
        advice.push("profit > 5%, consider partial_close(50%) to lock in gains");
    } else if position.unrealized_pnl_pct > 3.0 {
        advice.push("profit > 3%, consider update_stop_loss to break-even");
    }

    let trend_against = match position.side {
        PositionSide::Long => snapshot.current_macd < 0.0,
        PositionSide::Short => snapshot.current_macd > 0.0,
    };
    if trend_against {
        advice.push("MACD has turned against the position, consider close");
    }

    if advice.is_empty() {
        return "trend intact, hold".to_string();
    }

    advice.join("; ")
}

fn volume_label(context: &LongerTermContext) -> String {
    if context.average_volume > 0.0 {
        let ratio = context.current_volume / context.average_volume;
        if context.current_volume > context.average_volume * 1.5 {
            return format!("expanding volume ({ratio:.1}x)");
        }
        if context.current_volume < context.average_volume * 0.8 {
            return format!("contracting volume ({ratio:.1}x)");
        }
    }
    "normal volume".to_string()
}

// Shape flags for the latest intraday candle, used to warn about fakeouts.
fn candle_shape_flags(candle: &Candle) -> String {
    let range = candle.high - candle.low;
    if range <= 0.0 {
        return String::new();
    }

    let body = (candle.close - candle.open).abs();
    let upper_shadow = candle.high - candle.open.max(candle.close);
    let lower_shadow = candle.open.min(candle.close) - candle.low;

    let mut flags = String::new();
    if upper_shadow > body * 2.0 {
        flags.push_str(" | long upper shadow");
    }
    if lower_shadow > body * 2.0 {
        flags.push_str(" | long lower shadow");
    }
    if body < range * 0.2 {
        flags = " | doji".to_string();
    }

    flags
}
