/// Failures that end a refresh cycle. Enrichment failures never show up here,
/// they are recovered per story.
#[derive(Debug, thiserror::Error)]
pub(crate) enum RefreshError {
    #[error("failed to list top stories")]
    Listing(#[source] anyhow::Error),

    #[error("failed to fetch story {id}")]
    Detail {
        id: i64,
        #[source]
        source: anyhow::Error,
    },

    #[error("story fetch task did not complete")]
    Task(#[source] tokio::task::JoinError),
}

impl RefreshError {
    /// Message with the whole cause chain, e.g. `failed to fetch story 5: connection refused`.
    pub(crate) fn diagnostic(&self) -> String {
        use std::error::Error;

        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}
