//! Cycle orchestration: snapshot -> prompts -> LLM -> parse -> validate.

use std::sync::Arc;

use ai_trade_core::{CandidateSource, CandleSource, DerivativesSource, LlmGateway, TemplateStore, TraderConfig};
use ai_trade_market::SnapshotBuilder;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::context::DecisionContext;
use crate::decision::FullDecision;
use crate::parser::{extract_cot_trace, parse_decisions, ParseError};
use crate::prompt::{build_system_prompt, build_user_prompt, PromptOptions};
use crate::validator::{validate_decisions, ValidationError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("snapshot build failed: {0:#}")]
    Snapshot(anyhow::Error),

    #[error("llm call failed: {0:#}")]
    Gateway(anyhow::Error),

    #[error("failed to parse llm response: {source}")]
    Parse {
        #[source]
        source: ParseError,
        /// The raw model reply, attached for operator diagnosis.
        raw_response: String,
        cot_trace: String,
    },

    #[error("decision validation failed: {source}")]
    Validation {
        #[source]
        source: ValidationError,
        /// The fully assembled (rejected) decision, for inspection.
        decision: Box<FullDecision>,
    },
}

/// Sequences one decision cycle. Owns no mutable state; the context is
/// rebuilt by the caller every cycle.
pub struct DecisionEngine {
    snapshot_builder: SnapshotBuilder,
    candidates: Arc<dyn CandidateSource>,
    templates: Arc<dyn TemplateStore>,
    config: TraderConfig,
}

impl DecisionEngine {
    #[must_use]
    pub fn new(
        candle_source: Arc<dyn CandleSource>,
        derivatives_source: Arc<dyn DerivativesSource>,
        candidate_source: Arc<dyn CandidateSource>,
        template_store: Arc<dyn TemplateStore>,
        config: TraderConfig,
    ) -> Self {
        Self {
            snapshot_builder: SnapshotBuilder::new(candle_source, derivatives_source, &config),
            candidates: candidate_source,
            templates: template_store,
            config,
        }
    }

    /// Populates the context with per-symbol snapshots and OI-rank data.
    ///
    /// Individual symbol failures are recovered inside the builder; a
    /// failing rank feed only loses the annotation.
    ///
    /// # Errors
    /// Currently infallible; the `Result` is the contract for stores that
    /// can fail wholesale.
    pub async fn build_snapshots(&self, ctx: &mut DecisionContext) -> anyhow::Result<()> {
        let held = ctx.held_symbols();
        let candidates = ctx.candidate_symbols();

        ctx.snapshots = self.snapshot_builder.build(&held, &candidates).await;

        match self.candidates.ranked_entries().await {
            Ok(entries) => {
                ctx.oi_ranks = entries
                    .into_iter()
                    .map(|entry| (entry.symbol.clone(), entry))
                    .collect();
            }
            Err(err) => {
                warn!("ranked-candidate fetch failed, continuing without OI ranks: {err:#}");
            }
        }

        info!(
            "cycle #{}: {} symbols snapshotted ({} held, {} candidates)",
            ctx.cycle_number,
            ctx.snapshots.len(),
            held.len(),
            candidates.len()
        );
        Ok(())
    }

    /// Renders the prompt pair without calling the model.
    pub async fn build_prompts(
        &self,
        ctx: &DecisionContext,
        options: &PromptOptions,
    ) -> (String, String) {
        let system_prompt = build_system_prompt(
            self.templates.as_ref(),
            ctx.account.total_equity,
            &ctx.leverage,
            &self.config.risk,
            options,
        )
        .await;
        let user_prompt = build_user_prompt(ctx);
        (system_prompt, user_prompt)
    }

    /// Runs a full cycle and returns the validated decision bundle.
    ///
    /// # Errors
    /// `Gateway` when the LLM call fails (no retry), `Parse` when the reply
    /// has no decodable decision array, `Validation` when a decision breaks
    /// a risk invariant.
    pub async fn get_full_decision(
        &self,
        ctx: &mut DecisionContext,
        gateway: &dyn LlmGateway,
        options: &PromptOptions,
    ) -> Result<FullDecision, EngineError> {
        self.build_snapshots(ctx)
            .await
            .map_err(EngineError::Snapshot)?;

        let (system_prompt, user_prompt) = self.build_prompts(ctx, options).await;

        let raw_response = gateway
            .complete(&system_prompt, &user_prompt)
            .await
            .map_err(EngineError::Gateway)?;

        let (cot_trace, decisions) = match parse_decisions(&raw_response) {
            Ok(parsed) => parsed,
            Err(source) => {
                let cot_trace = extract_cot_trace(&raw_response);
                return Err(EngineError::Parse {
                    source,
                    raw_response,
                    cot_trace,
                });
            }
        };

        let full = FullDecision {
            system_prompt,
            user_prompt,
            cot_trace,
            decisions,
            timestamp: Utc::now(),
        };

        if let Err(source) = validate_decisions(
            &full.decisions,
            ctx.account.total_equity,
            &ctx.leverage,
            &self.config.risk,
        ) {
            return Err(EngineError::Validation {
                source,
                decision: Box::new(full),
            });
        }

        info!(
            "cycle #{}: {} decisions accepted",
            ctx.cycle_number,
            full.decisions.len()
        );
        Ok(full)
    }
}
