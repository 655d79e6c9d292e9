//! One refresh cycle: fetch the top stories, score each one as it arrives and
//! merge it into the live list.

use std::sync::Arc;

use futures::StreamExt;

use crate::collection::SortedMergeCollection;
use crate::error::RefreshError;
use crate::fetcher::StoryFetcher;
use crate::sentiment::SentimentEnricher;
use crate::story::Story;

const FAILURE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RefreshStats {
    pub(crate) received: usize,
    pub(crate) inserted: usize,
    pub(crate) duplicates: usize,
    pub(crate) unscored: usize,
}

#[derive(Debug)]
pub(crate) enum RefreshOutcome {
    Completed(RefreshStats),
    Failed(RefreshError),
}

pub(crate) struct RefreshOrchestrator {
    fetcher: StoryFetcher,
    enricher: SentimentEnricher,
    story_count: usize,
    stories: Arc<SortedMergeCollection<Story>>,
    refreshing: tokio::sync::watch::Sender<bool>,
    in_flight: std::sync::Mutex<usize>,
    failures: tokio::sync::broadcast::Sender<String>,
}

/// Counts one running refresh. The refreshing flag only goes back to false
/// when the last overlapping refresh ends, however it ends, including the
/// refresh future being dropped half way.
struct RefreshingGuard<'a> {
    orchestrator: &'a RefreshOrchestrator,
}

impl<'a> RefreshingGuard<'a> {
    fn enter(orchestrator: &'a RefreshOrchestrator) -> Self {
        let mut in_flight = orchestrator
            .in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *in_flight += 1;
        if *in_flight > 1 {
            tracing::warn!(in_flight = *in_flight, "Refresh started while another one is still running");
        }
        orchestrator.refreshing.send_replace(true);
        Self { orchestrator }
    }
}

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .orchestrator
            .in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *in_flight -= 1;
        if *in_flight == 0 {
            self.orchestrator.refreshing.send_replace(false);
        }
    }
}

impl RefreshOrchestrator {
    pub(crate) fn new(fetcher: StoryFetcher, enricher: SentimentEnricher, story_count: usize) -> Self {
        let (refreshing, _) = tokio::sync::watch::channel(false);
        let (failures, _) = tokio::sync::broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Self {
            fetcher,
            enricher,
            story_count,
            stories: Arc::new(SortedMergeCollection::new()),
            refreshing,
            in_flight: std::sync::Mutex::new(0),
            failures,
        }
    }

    /// The live result list, sorted by descending score and unique by title.
    pub(crate) fn stories(&self) -> Arc<SortedMergeCollection<Story>> {
        self.stories.clone()
    }

    // Consumers outside tests watch the flag through `watch_refreshing`.
    #[cfg(test)]
    pub(crate) fn is_refreshing(&self) -> bool {
        *self.refreshing.borrow()
    }

    pub(crate) fn watch_refreshing(&self) -> tokio::sync::watch::Receiver<bool> {
        self.refreshing.subscribe()
    }

    /// Receives one diagnostic message per failed refresh.
    pub(crate) fn subscribe_failures(&self) -> tokio::sync::broadcast::Receiver<String> {
        self.failures.subscribe()
    }

    pub(crate) async fn execute_refresh(&self) -> RefreshOutcome {
        let _guard = RefreshingGuard::enter(self);

        self.stories.clear();
        tracing::info!(story_count = self.story_count, "Refresh started");

        let mut stats = RefreshStats::default();
        match self.merge_top_stories(&mut stats).await {
            Ok(()) => {
                tracing::info!(stats =? stats, "Refresh completed");
                RefreshOutcome::Completed(stats)
            }
            Err(e) => {
                let message = e.diagnostic();
                tracing::error!(error =% message, stats =? stats, "Refresh failed");
                // Nobody listening is not an error.
                let _ = self.failures.send(message);
                RefreshOutcome::Failed(e)
            }
        }
    }

    async fn merge_top_stories(&self, stats: &mut RefreshStats) -> Result<(), RefreshError> {
        let mut stories = self.fetcher.fetch_top(Some(self.story_count));

        while let Some(story) = stories.next().await {
            let story = story?;
            stats.received += 1;

            let story = match self.enricher.score(&story.title).await {
                Ok(sentiment) => story.with_sentiment(sentiment),
                Err(e) => {
                    tracing::warn!(id = story.id, error =% e, "Could not score sentiment, keeping story unscored");
                    stats.unscored += 1;
                    story
                }
            };

            let (id, score) = (story.id, story.score);
            match self.stories.insert_unique(
                story,
                |s: &Story| s.title.clone(),
                crate::story::by_score_descending,
            ) {
                Some(index) => {
                    stats.inserted += 1;
                    tracing::debug!(id, score, index, "Inserted story");
                }
                None => {
                    stats.duplicates += 1;
                    tracing::debug!(id, "Dropped story with duplicate title");
                }
            }
        }

        Ok(())
    }
}
