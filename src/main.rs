use tracing_subscriber::util::SubscriberInitExt;

pub(crate) mod collection;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod fetcher;
pub(crate) mod hn_api;
pub(crate) mod openai;
pub(crate) mod orchestrator;
pub(crate) mod sentiment;
pub(crate) mod story;
#[cfg(test)]
mod testing;

pub(crate) static CLIENT: std::sync::LazyLock<reqwest::Client> =
    std::sync::LazyLock::new(reqwest::Client::new);

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    #[arg(help = "Number of top stories to fetch, overrides NUMBER_OF_STORIES")]
    count: Option<usize>,

    #[arg(short, long, default_value = "false")]
    #[arg(help = "Export the final list to json in the export directory")]
    export: bool,

    #[arg(short, long, default_value = "false")]
    #[arg(help = "Log to console")]
    log_to_console: bool,
}

/// Holds the screen while the list is being mutated so a printed line never
/// describes a half-applied change.
struct ConsoleSync {
    screen: std::sync::Arc<std::sync::Mutex<()>>,
}

impl collection::SyncHook for ConsoleSync {
    fn marshal(&self, access: &mut (dyn FnMut() + Send), _write_access: bool) {
        let _screen = self
            .screen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        access();
    }
}

/// Prints every change to the live list and every flip of the refreshing flag
/// until `done` fires and the backlog is drained.
fn spawn_renderer(
    stories: std::sync::Arc<collection::SortedMergeCollection<story::Story>>,
    mut refreshing: tokio::sync::watch::Receiver<bool>,
    screen: std::sync::Arc<std::sync::Mutex<()>>,
    mut done: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    use tokio::sync::broadcast::error::RecvError;

    let mut changes = stories.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                change = changes.recv() => match change {
                    Ok(collection::Change::Inserted { index, item }) => {
                        let _screen = screen
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner);
                        println!("+ {:>3}/{:<3} {}", index + 1, stories.len(), item);
                    }
                    Ok(collection::Change::Cleared) => println!("List cleared"),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Renderer fell behind the story list")
                    }
                    Err(RecvError::Closed) => break,
                },
                Ok(()) = refreshing.changed() => {
                    if *refreshing.borrow_and_update() {
                        println!("Refreshing top stories...");
                    } else {
                        println!("Refresh finished");
                    }
                }
                _ = &mut done => break,
            }
        }
    })
}

fn print_stories(stories: &[story::Story]) {
    println!();
    println!("Top {} stories", stories.len());
    for (rank, story) in stories.iter().enumerate() {
        println!("{:>3}. {}", rank + 1, story);
    }
}

fn sentiment_enricher() -> anyhow::Result<sentiment::SentimentEnricher> {
    let sentiment = &config::config().sentiment;

    let Some(api_key) = &sentiment.api_key else {
        tracing::warn!("OPENAI_API_KEY not set, stories will not be scored");
        return Ok(sentiment::SentimentEnricher::unconfigured());
    };

    let service = openai::sentiment::OpenAiSentiment::new(
        api_key.clone(),
        sentiment.model.clone(),
        sentiment.system_prompt.clone(),
    )?;
    Ok(sentiment::SentimentEnricher::new(std::sync::Arc::new(service)))
}

async fn refresh_top_stories(args: Args) -> anyhow::Result<()> {
    let source = hn_api::HackerNewsClient::new(config::config().hacker_news_base_url.clone());
    let orchestrator = orchestrator::RefreshOrchestrator::new(
        fetcher::StoryFetcher::new(std::sync::Arc::new(source)),
        sentiment_enricher()?,
        args.count.unwrap_or(config::config().number_of_stories),
    );

    let screen = std::sync::Arc::new(std::sync::Mutex::new(()));
    orchestrator
        .stories()
        .set_sync_hook(std::sync::Arc::new(ConsoleSync {
            screen: screen.clone(),
        }));

    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    let renderer = spawn_renderer(
        orchestrator.stories(),
        orchestrator.watch_refreshing(),
        screen,
        done_rx,
    );
    let mut failures = orchestrator.subscribe_failures();

    let outcome = orchestrator.execute_refresh().await;

    // Refreshing has flipped back to false; let the renderer report it before stopping.
    let _ = done_tx.send(());
    if let Err(e) = renderer.await {
        tracing::error!(error =? e, "Renderer stopped unexpectedly");
    }

    while let Ok(message) = failures.try_recv() {
        eprintln!("Refresh failed: {}", message);
    }

    let stories = orchestrator.stories().snapshot();
    print_stories(&stories);

    if args.export {
        let json = serde_json::to_string_pretty(&stories)?;
        std::fs::create_dir_all("export")?;
        std::fs::write("export/top_stories.json", json)?;
        tracing::info!(num_stories = stories.len(), "Exported stories to export/top_stories.json");
    }

    match outcome {
        orchestrator::RefreshOutcome::Completed(stats) => {
            println!(
                "{} received, {} listed, {} duplicates, {} without sentiment",
                stats.received, stats.inserted, stats.duplicates, stats.unscored
            );
            tracing::info!(stats =? stats, "Top stories refreshed");
            Ok(())
        }
        orchestrator::RefreshOutcome::Failed(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() {
    use tracing_subscriber::layer::Layer;
    use tracing_subscriber::layer::SubscriberExt;

    use clap::Parser;
    let args = Args::parse();

    let file_appender = tracing_appender::rolling::daily("./log", "hn_sentiment.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer();
    let file_layer = file_layer
        .with_writer(non_blocking)
        .json()
        .with_filter(tracing::level_filters::LevelFilter::INFO)
        .boxed();

    let pretty_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_filter(tracing::level_filters::LevelFilter::INFO)
        .boxed();

    let registry = tracing_subscriber::registry().with(file_layer);

    if config::config().log_to_console || args.log_to_console {
        registry.with(pretty_layer).init();
    } else {
        registry.init();
    };

    tracing::info!(
        config =? config::config(),
        args =? args,
        "Starting HN sentiment"
    );

    let timeout = config::config().refresh_timeout;
    tokio::select! {
        res = refresh_top_stories(args) => match res {
            Ok(_) => tracing::info!("HN sentiment finished"),
            Err(e) => tracing::error!(error =? e, "Error when refreshing top stories"),
        },
        _ = tokio::time::sleep(timeout) => {
            tracing::error!(timeout_secs = timeout.as_secs(), "Timeout when refreshing top stories");
        }
    }
}
