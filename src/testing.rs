//! In-memory stand-ins for the story API and the sentiment service.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::story::{Sentiment, Story};

#[derive(Default)]
struct Calls {
    listing: AtomicUsize,
    details: Mutex<Vec<i64>>,
    completed: Mutex<Vec<i64>>,
}

#[derive(Clone)]
struct FakeStory {
    result: Result<Story, String>,
    delay_ms: u64,
}

#[derive(Clone)]
pub(crate) struct FakeStorySource {
    ids: Result<Vec<i64>, String>,
    stories: HashMap<i64, FakeStory>,
    calls: Arc<Calls>,
}

impl FakeStorySource {
    pub(crate) fn new(ids: Vec<i64>) -> Self {
        Self {
            ids: Ok(ids),
            stories: HashMap::new(),
            calls: Arc::new(Calls::default()),
        }
    }

    pub(crate) fn failing_listing(message: &str) -> Self {
        Self {
            ids: Err(message.to_string()),
            ..Self::new(vec![])
        }
    }

    /// Registers a story whose fetch takes `delay_ms` milliseconds.
    pub(crate) fn with_story(mut self, id: i64, title: &str, score: i64, delay_ms: u64) -> Self {
        let story = Story {
            id,
            score,
            title: title.to_string(),
            ..Default::default()
        };
        self.stories.insert(
            id,
            FakeStory {
                result: Ok(story),
                delay_ms,
            },
        );
        self
    }

    pub(crate) fn with_failing_story(mut self, id: i64, delay_ms: u64) -> Self {
        self.stories.insert(
            id,
            FakeStory {
                result: Err(format!("item {} unavailable", id)),
                delay_ms,
            },
        );
        self
    }

    pub(crate) fn listing_calls(&self) -> usize {
        self.calls.listing.load(Ordering::SeqCst)
    }

    pub(crate) fn detail_calls(&self) -> Vec<i64> {
        let mut calls = self.calls.details.lock().unwrap().clone();
        calls.sort();
        calls
    }

    pub(crate) fn completed_details(&self) -> Vec<i64> {
        self.calls.completed.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl crate::hn_api::StorySource for FakeStorySource {
    async fn top_story_ids(&self) -> anyhow::Result<Vec<i64>> {
        self.calls.listing.fetch_add(1, Ordering::SeqCst);
        self.ids.clone().map_err(|e| anyhow::anyhow!(e))
    }

    async fn story(&self, id: i64) -> anyhow::Result<Story> {
        self.calls.details.lock().unwrap().push(id);

        let fake = self
            .stories
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown item {}", id))?;

        if fake.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(fake.delay_ms)).await;
        }

        self.calls.completed.lock().unwrap().push(id);
        fake.result.map_err(|e| anyhow::anyhow!(e))
    }
}

/// Scores every title as `Neutral` unless told otherwise.
#[derive(Clone, Default)]
pub(crate) struct FakeSentiment {
    results: HashMap<String, Result<Sentiment, String>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    scored: Arc<Mutex<Vec<String>>>,
}

impl FakeSentiment {
    pub(crate) fn with(mut self, title: &str, sentiment: Sentiment) -> Self {
        self.results.insert(title.to_string(), Ok(sentiment));
        self
    }

    pub(crate) fn failing_for(mut self, title: &str) -> Self {
        self.results
            .insert(title.to_string(), Err("quota exceeded".to_string()));
        self
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn scored(&self) -> Vec<String> {
        self.scored.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl crate::sentiment::SentimentService for FakeSentiment {
    async fn score(&self, text: &str) -> anyhow::Result<Sentiment> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.scored.lock().unwrap().push(text.to_string());

        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.results.get(text) {
            Some(result) => result.clone().map_err(|e| anyhow::anyhow!(e)),
            None => Ok(Sentiment::Neutral),
        }
    }
}
