#[derive(Debug)]
pub(crate) struct Config {
    pub(crate) number_of_stories: usize,
    pub(crate) hacker_news_base_url: String,
    pub(crate) sentiment: SentimentConfig,

    pub(crate) log_to_console: bool,
    pub(crate) refresh_timeout: std::time::Duration,
}

pub(crate) static CONFIG: std::sync::LazyLock<Config> = std::sync::LazyLock::new(|| {
    // A missing .env file is fine, everything has a default.
    let _ = dotenvy::dotenv();

    Config {
        number_of_stories: env_or("NUMBER_OF_STORIES", 50),
        hacker_news_base_url: env_or(
            "HACKER_NEWS_BASE_URL",
            "https://hacker-news.firebaseio.com/v0".to_string(),
        ),
        sentiment: SentimentConfig::new(),
        log_to_console: env_or("LOG_TO_CONSOLE", false),
        refresh_timeout: std::time::Duration::from_secs(env_or("REFRESH_TIMEOUT_SECS", 60 * 60)),
    }
});

pub(crate) fn config() -> &'static Config {
    &CONFIG
}

pub(crate) struct SentimentConfig {
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) system_prompt: String,
}

impl SentimentConfig {
    fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: env_or("OPENAI_SENTIMENT_MODEL", "gpt-4o-mini".to_string()),
            system_prompt: env_or(
                "SENTIMENT_SYSTEM_PROMPT",
                crate::openai::sentiment::DEFAULT_SYSTEM_PROMPT.to_string(),
            ),
        }
    }
}

// The key is never logged.
impl std::fmt::Debug for SentimentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentConfig")
            .field("api_key_set", &self.api_key.is_some())
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    parse_or(key, std::env::var(key).ok(), default)
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        None => default,
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(key, value =% value, "Could not parse config value, using default");
                default
            }
        },
    }
}
