/// Listing and detail endpoints of a story API.
#[async_trait::async_trait]
pub(crate) trait StorySource: Send + Sync {
    /// Ranked identifiers of the current top stories.
    async fn top_story_ids(&self) -> anyhow::Result<Vec<i64>>;

    async fn story(&self, id: i64) -> anyhow::Result<crate::story::Story>;
}

#[derive(Debug, Clone)]
pub(crate) struct HackerNewsClient {
    base_url: String,
}

impl HackerNewsClient {
    pub(crate) fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl StorySource for HackerNewsClient {
    async fn top_story_ids(&self) -> anyhow::Result<Vec<i64>> {
        let response = crate::CLIENT
            .get(format!("{}/topstories.json", self.base_url))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Vec<i64>>().await?)
    }

    async fn story(&self, id: i64) -> anyhow::Result<crate::story::Story> {
        let response = crate::CLIENT
            .get(format!("{}/item/{}.json", self.base_url, id))
            .send()
            .await?
            .error_for_status()?;

        // Deleted or unknown items come back as a literal `null`.
        response
            .json::<Option<crate::story::Story>>()
            .await?
            .ok_or_else(|| anyhow::anyhow!("item {} not found", id))
    }
}
