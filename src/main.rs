// src/main.rs
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use bbref_scrape::bbref::models::{DEFAULT_BASE_URL, DEFAULT_PARALLELISM, DEFAULT_REQUEST_DELAY_MS, DEFAULT_USER_AGENT};
use bbref_scrape::bbref::{CrawlSettings, Crawler, RunSummary};
use bbref_scrape::pipeline::{self, GamelogRecorder};
use bbref_scrape::storage::StorageManager;
use bbref_scrape::utils::{self, AppError, Diagnostics, TracingDiagnostics};

/// Command Line Interface for the basketball-reference gamelog scraper
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every team of a season and save each player's gamelog
    Crawl(CrawlArgs),
    /// Extract gamelogs from pages already saved to disk
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output directory for gamelog CSVs and index.json
    #[arg(short, long, default_value = "./output/gamelogs")]
    output_dir: PathBuf,

    /// Debug mode - save annotated copies of pages that failed extraction
    #[arg(short, long)]
    debug: bool,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Season to scrape, named by its end year (2022 = 2021-22)
    #[arg(short, long, default_value = "2022")]
    season: String,

    /// Maximum number of requests in flight
    #[arg(long, default_value_t = DEFAULT_PARALLELISM)]
    parallelism: usize,

    /// Delay before each request, in milliseconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_DELAY_MS)]
    delay_ms: u64,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Site root to crawl
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Saved gamelog pages
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
}

fn build_recorder(output: &OutputArgs, diagnostics: Arc<dyn Diagnostics>) -> Result<GamelogRecorder, AppError> {
    let storage = StorageManager::new(&output.output_dir)?;
    let recorder = GamelogRecorder::new(storage, diagnostics);
    Ok(if output.debug { recorder.with_debug_dumps() } else { recorder })
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let cli = Cli::parse();
    tracing::info!("Starting processing for args: {:?}", cli);

    let diagnostics: Arc<dyn Diagnostics> = Arc::new(TracingDiagnostics);

    let summary = match cli.command {
        Command::Crawl(args) => {
            let mut settings = CrawlSettings::new(&args.season, &args.base_url)?;
            settings.parallelism = args.parallelism;
            settings.request_delay = Duration::from_millis(args.delay_ms);
            settings.user_agent = args.user_agent;

            let recorder = build_recorder(&args.output, diagnostics)?;
            let crawler = Arc::new(Crawler::new(settings, recorder)?);
            crawler.run().await?
        }
        Command::Extract(args) => {
            let recorder = build_recorder(&args.output, diagnostics)?;
            pipeline::extract_files(&recorder, &args.files)?
        }
    };

    report(&summary)
}

fn report(summary: &RunSummary) -> Result<(), AppError> {
    tracing::info!(
        "Processing finished. Gamelogs: {}, skipped: {}, failures: {}",
        summary.gamelogs_written, summary.skipped, summary.fetch_failures
    );

    if summary.gamelogs_written == 0 && summary.skipped + summary.fetch_failures > 0 {
        return Err(AppError::Processing(format!(
            "No gamelogs extracted from {} pages",
            summary.pages_fetched + summary.fetch_failures
        )));
    }

    Ok(())
}
