#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    schemars::JsonSchema,
)]
#[serde(deny_unknown_fields)]
pub(crate) enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

impl Sentiment {
    pub(crate) fn emoji(&self) -> &'static str {
        match self {
            Sentiment::Positive => "😃",
            Sentiment::Neutral => "😐",
            Sentiment::Negative => "😡",
            Sentiment::Mixed => "🤔",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Neutral => write!(f, "Neutral"),
            Sentiment::Negative => write!(f, "Negative"),
            Sentiment::Mixed => write!(f, "Mixed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub(crate) struct Story {
    pub(crate) id: i64,
    #[serde(default)]
    pub(crate) score: i64,
    #[serde(default)]
    pub(crate) title: String,

    #[serde(default)]
    pub(crate) by: Option<String>,
    #[serde(default)]
    pub(crate) url: Option<String>,
    #[serde(default)]
    pub(crate) descendants: Option<i64>,

    #[serde(rename = "type", default)]
    pub(crate) story_type: String,

    // Not included in json response. Our own enrichment.
    #[serde(default)]
    pub(crate) sentiment: Option<Sentiment>,
}

impl Default for Story {
    fn default() -> Self {
        Self {
            id: 0,
            score: 0,
            title: "".to_string(),
            by: None,
            url: None,
            descendants: None,
            story_type: "story".to_string(),
            sentiment: None,
        }
    }
}

impl Story {
    /// Returns a copy of the story carrying `sentiment`. The original is left untouched.
    pub(crate) fn with_sentiment(&self, sentiment: Sentiment) -> Self {
        Self {
            sentiment: Some(sentiment),
            ..self.clone()
        }
    }
}

/// Higher score sorts first.
pub(crate) fn by_score_descending(a: &Story, b: &Story) -> std::cmp::Ordering {
    b.score.cmp(&a.score)
}

impl std::fmt::Display for Story {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sentiment = self.sentiment.as_ref().map(Sentiment::emoji).unwrap_or(" ");
        write!(f, "{:>5} {} {}", self.score, sentiment, self.title)
    }
}
