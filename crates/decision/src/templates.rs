//! In-memory prompt template store.
//!
//! The engine only depends on the [`TemplateStore`] capability; this
//! implementation seeds the `default` template and lets the API layer swap
//! or add templates at runtime.

use ai_trade_core::{PromptTemplate, TemplateStore};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub const DEFAULT_TEMPLATE_NAME: &str = "default";

const DEFAULT_TEMPLATE: &str = "\
You are a disciplined crypto perpetual-futures trader. Each cycle you \
receive the account state, open positions, and a multi-timeframe technical \
snapshot per symbol.

Decision process:
1. Establish the BTC regime first; fighting it needs overwhelming evidence.
2. For every open position decide: hold, tighten protection, take partial \
profit, or close.
3. For new entries demand multi-timeframe agreement: intraday and \
long-horizon MACD aligned, RSI not at an extreme against the trade, price \
on the right side of EMA20, and acceptable volume.
4. Prefer missing a trade over forcing one. `wait` is a valid decision.

Never average into losers and never move a stop away from price.";

pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<String, PromptTemplate>>,
}

impl InMemoryTemplateStore {
    /// Creates a store pre-seeded with the `default` template.
    #[must_use]
    pub fn new() -> Self {
        let mut templates = HashMap::new();
        templates.insert(
            DEFAULT_TEMPLATE_NAME.to_string(),
            PromptTemplate {
                name: DEFAULT_TEMPLATE_NAME.to_string(),
                content: DEFAULT_TEMPLATE.to_string(),
            },
        );
        Self {
            templates: RwLock::new(templates),
        }
    }

    pub async fn insert(&self, template: PromptTemplate) {
        self.templates
            .write()
            .await
            .insert(template.name.clone(), template);
    }

    pub async fn all(&self) -> Vec<PromptTemplate> {
        self.templates.read().await.values().cloned().collect()
    }
}

impl Default for InMemoryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn get(&self, name: &str) -> Result<Option<PromptTemplate>> {
        Ok(self.templates.read().await.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_the_default_template() {
        let store = InMemoryTemplateStore::new();
        let template = store.get(DEFAULT_TEMPLATE_NAME).await.unwrap();
        assert!(template.is_some());
    }

    #[tokio::test]
    async fn unknown_name_is_none_not_an_error() {
        let store = InMemoryTemplateStore::new();
        assert!(store.get("aggressive").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inserted_templates_are_retrievable() {
        let store = InMemoryTemplateStore::new();
        store
            .insert(PromptTemplate {
                name: "scalper".to_string(),
                content: "trade fast".to_string(),
            })
            .await;
        let template = store.get("scalper").await.unwrap().unwrap();
        assert_eq!(template.content, "trade fast");
        assert_eq!(store.all().await.len(), 2);
    }
}
