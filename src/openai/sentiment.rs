//! Classifies the sentiment of a text with a single chat completion.

use crate::story::Sentiment;

pub(crate) const DEFAULT_SYSTEM_PROMPT: &str = "You classify the sentiment of Hacker News story titles. \
Answer with Positive, Neutral, Negative or Mixed.";

#[derive(Debug, Clone)]
pub(crate) struct OpenAiSentiment {
    api_key: String,
    model: String,
    system_prompt: String,
    schema: crate::openai::Schema,
}

impl OpenAiSentiment {
    pub(crate) fn new(api_key: String, model: String, system_prompt: String) -> anyhow::Result<Self> {
        Ok(Self {
            api_key,
            model,
            system_prompt,
            schema: schema_for_sentiment_response()?,
        })
    }
}

#[async_trait::async_trait]
impl crate::sentiment::SentimentService for OpenAiSentiment {
    async fn score(&self, text: &str) -> anyhow::Result<Sentiment> {
        let query = crate::openai::OpenAIChatCompletionQuery::new(
            self.model.clone(),
            crate::openai::OpenAIChatCompletionQuery::system_prompt_and_content_to_messages(
                &self.system_prompt,
                text,
            ),
            self.schema.clone(),
        );

        let response = crate::CLIENT
            .post(crate::openai::CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&query)
            .send()
            .await?;

        // Keep the raw body around for debugging failed requests.
        if let Err(e) = response.error_for_status_ref() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(error =% e, body =% body, "Sentiment request failed");
            return Err(anyhow::anyhow!("Error querying model: {}", e));
        }

        let model_response: crate::openai::OpenAIChatCompletionResponse = response.json().await?;
        tracing::debug!(usage =? model_response.usage, "Sentiment usage");
        parse_sentiment(&model_response)
    }
}

fn parse_sentiment(
    response: &crate::openai::OpenAIChatCompletionResponse,
) -> anyhow::Result<Sentiment> {
    let choice = response
        .choices
        .first()
        .ok_or_else(|| anyhow::anyhow!("Model returned no choices"))?;

    Ok(serde_json::from_str::<SentimentResponse>(&choice.message.content)?.sentiment)
}

/// We enforce a json schema for the responses since we are working with structured data.
#[derive(Debug, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
struct SentimentResponse {
    #[schemars(required)]
    #[schemars(description = "The overall sentiment of the text")]
    sentiment: Sentiment,
}

fn schema_for_sentiment_response() -> anyhow::Result<crate::openai::Schema> {
    crate::openai::schema_for::<SentimentResponse>("title_sentiment")
}
