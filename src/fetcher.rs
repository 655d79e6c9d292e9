//! Fans out one detail fetch per top story and hands the stories back in the
//! order the fetches finish.

use std::sync::Arc;

use futures::StreamExt;

use crate::error::RefreshError;
use crate::hn_api::StorySource;
use crate::story::Story;

#[derive(Clone)]
pub(crate) struct StoryFetcher {
    source: Arc<dyn StorySource>,
}

enum FetchState {
    NotStarted,
    Draining {
        pending: tokio::task::JoinSet<Result<Story, RefreshError>>,
        remaining: usize,
    },
    Done,
}

impl StoryFetcher {
    pub(crate) fn new(source: Arc<dyn StorySource>) -> Self {
        Self { source }
    }

    /// Lazily fetches up to `count` top stories (all of them for `None`).
    ///
    /// Nothing is requested until the stream is polled. The first error ends the
    /// stream. Dropping the stream aborts every fetch still in flight.
    pub(crate) fn fetch_top(
        &self,
        count: Option<usize>,
    ) -> futures::stream::BoxStream<'static, Result<Story, RefreshError>> {
        let source = self.source.clone();
        let wanted = count.unwrap_or(usize::MAX);

        futures::stream::unfold(FetchState::NotStarted, move |state| {
            let source = source.clone();
            async move {
                let (mut pending, remaining) = match state {
                    FetchState::Done => return None,
                    FetchState::Draining { pending, remaining } => (pending, remaining),
                    FetchState::NotStarted => {
                        if wanted == 0 {
                            return None;
                        }

                        let ids = match source.top_story_ids().await {
                            Ok(ids) => ids,
                            Err(e) => return Some((Err(RefreshError::Listing(e)), FetchState::Done)),
                        };

                        tracing::info!(
                            num_ids = ids.len(),
                            num_requested = ids.len().min(wanted),
                            "Got top story ids"
                        );

                        let mut pending = tokio::task::JoinSet::new();
                        for id in ids.into_iter().take(wanted) {
                            let source = source.clone();
                            pending.spawn(async move {
                                source
                                    .story(id)
                                    .await
                                    .map_err(|source| RefreshError::Detail { id, source })
                            });
                        }

                        let remaining = pending.len();
                        (pending, remaining)
                    }
                };

                // Returning here drops `pending`, which aborts the leftovers.
                if remaining == 0 {
                    return None;
                }

                match pending.join_next().await? {
                    Ok(Ok(story)) => {
                        tracing::debug!(id = story.id, score = story.score, "Fetched story");
                        Some((
                            Ok(story),
                            FetchState::Draining {
                                pending,
                                remaining: remaining - 1,
                            },
                        ))
                    }
                    Ok(Err(e)) => Some((Err(e), FetchState::Done)),
                    Err(e) => Some((Err(RefreshError::Task(e)), FetchState::Done)),
                }
            }
        })
        .boxed()
    }
}
