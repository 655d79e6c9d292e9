use std::sync::Arc;

use crate::story::Sentiment;

#[async_trait::async_trait]
pub(crate) trait SentimentService: Send + Sync {
    async fn score(&self, text: &str) -> anyhow::Result<Sentiment>;
}

/// Best-effort sentiment lookups. Errors are returned to the caller, which is
/// expected to carry on without a sentiment.
#[derive(Clone)]
pub(crate) struct SentimentEnricher {
    service: Option<Arc<dyn SentimentService>>,
}

impl SentimentEnricher {
    pub(crate) fn new(service: Arc<dyn SentimentService>) -> Self {
        Self {
            service: Some(service),
        }
    }

    /// An enricher with no credentials configured. Every lookup fails.
    pub(crate) fn unconfigured() -> Self {
        Self { service: None }
    }

    pub(crate) async fn score(&self, text: &str) -> anyhow::Result<Sentiment> {
        let Some(service) = &self.service else {
            anyhow::bail!("no sentiment credentials configured, set OPENAI_API_KEY");
        };

        let sentiment = service.score(text).await?;
        tracing::debug!(text, sentiment =% sentiment, "Scored sentiment");
        Ok(sentiment)
    }
}
