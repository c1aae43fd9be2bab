// src/bbref/crawl.rs
//! Season crawl: teams index -> team season pages -> player gamelog pages.
//!
//! Every stage fans out over a `JoinSet`; a semaphore caps how many requests
//! are in flight. Each URL is fetched at most once per crawl.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Url;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::bbref::client;
use crate::bbref::links;
use crate::bbref::models::{CrawlSettings, RunSummary};
use crate::pipeline::{GamelogRecorder, PageOutcome};
use crate::storage::RunMetadata;
use crate::utils::error::{AppError, FetchError};

/// Turns a fetched page body into something for the next stage.
type PageHandler<T> = fn(&Crawler, &Url, &str) -> Result<T, AppError>;

enum Visit<T> {
    Fetched(T),
    FetchFailed(Url, FetchError),
}

pub struct Crawler {
    settings: CrawlSettings,
    client: reqwest::Client,
    limiter: Semaphore,
    recorder: GamelogRecorder,
    visited: Mutex<HashSet<Url>>,
}

impl Crawler {
    pub fn new(settings: CrawlSettings, recorder: GamelogRecorder) -> Result<Self, AppError> {
        if settings.parallelism == 0 {
            return Err(AppError::Config("parallelism must be at least 1".to_string()));
        }

        let client = client::build_client(&settings)?;
        let limiter = Semaphore::new(settings.parallelism);

        Ok(Self {
            settings,
            client,
            limiter,
            recorder,
            visited: Mutex::new(HashSet::new()),
        })
    }

    /// Crawls the configured season and writes every gamelog found.
    pub async fn run(self: &Arc<Self>) -> Result<RunSummary, AppError> {
        let season = self.settings.season.clone();
        let mut summary = RunSummary::default();

        // 1. Teams index -> team season pages
        let teams_url = self.settings.teams_url()?;
        tracing::info!("Starting crawl for season {} at {}", season, teams_url);
        let team_pages: Vec<Url> = self
            .fetch_stage(vec![teams_url], &mut summary, |crawler, url, body| {
                Ok(links::season_links(body, url, &crawler.settings.season))
            })
            .await?
            .into_iter()
            .flatten()
            .collect();
        tracing::info!("Found {} team season pages", team_pages.len());

        // 2. Team season pages -> player gamelog pages
        let gamelog_pages: Vec<Url> = self
            .fetch_stage(team_pages, &mut summary, |crawler, url, body| {
                Ok(links::player_gamelog_links(body, url, &crawler.settings.season))
            })
            .await?
            .into_iter()
            .flatten()
            .filter(|url| links::is_gamelog_url(url, &season))
            .collect();
        tracing::info!("Found {} player gamelog pages", gamelog_pages.len());

        // 3. Gamelog pages -> output files
        let outcomes = self
            .fetch_stage(gamelog_pages, &mut summary, |crawler, url, body| {
                Ok(crawler.recorder.record_page(url.as_str(), body)?)
            })
            .await?;

        for outcome in &outcomes {
            match outcome {
                PageOutcome::Written { .. } => summary.gamelogs_written += 1,
                PageOutcome::NoGamelogTable | PageOutcome::NoPlayerName => summary.skipped += 1,
            }
        }

        self.recorder.finish(&RunMetadata {
            mode: "crawl".to_string(),
            season: Some(season),
            summary: summary.clone(),
        })?;

        tracing::info!(
            "Crawl finished. Pages: {}, gamelogs: {}, skipped: {}, fetch failures: {}",
            summary.pages_fetched, summary.gamelogs_written, summary.skipped, summary.fetch_failures
        );
        Ok(summary)
    }

    /// Fetches every not-yet-visited URL concurrently and runs `handle` on each body.
    ///
    /// Fetch failures are counted and skipped. A handler error aborts the
    /// remaining tasks and is returned.
    async fn fetch_stage<T: Send + 'static>(
        self: &Arc<Self>,
        urls: Vec<Url>,
        summary: &mut RunSummary,
        handle: PageHandler<T>,
    ) -> Result<Vec<T>, AppError> {
        let mut tasks = JoinSet::new();
        for url in self.claim_unvisited(urls) {
            let crawler = Arc::clone(self);
            tasks.spawn(async move { crawler.visit(url, handle).await });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(Visit::Fetched(value))) => {
                    summary.pages_fetched += 1;
                    results.push(value);
                }
                Ok(Ok(Visit::FetchFailed(url, e))) => {
                    summary.fetch_failures += 1;
                    self.recorder
                        .diagnostics()
                        .warn(format_args!("failed to fetch {}: {}", url, e));
                }
                Ok(Err(e)) => {
                    self.recorder.diagnostics().fatal(format_args!("aborting crawl: {}", e));
                    tasks.abort_all();
                    return Err(e);
                }
                Err(join_error) => {
                    tasks.abort_all();
                    return Err(AppError::Processing(format!("crawl task failed: {}", join_error)));
                }
            }
        }

        Ok(results)
    }

    async fn visit<T>(self: Arc<Self>, url: Url, handle: PageHandler<T>) -> Result<Visit<T>, AppError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| AppError::Processing(format!("request limiter closed: {}", e)))?;

        let body = match client::fetch_page(&self.client, &url, &self.settings).await {
            Ok(body) => body,
            Err(e) => return Ok(Visit::FetchFailed(url, e)),
        };

        handle(&self, &url, &body).map(Visit::Fetched)
    }

    // Keeps only URLs this crawl has not handed out yet.
    fn claim_unvisited(&self, urls: Vec<Url>) -> Vec<Url> {
        let mut visited = self.visited.lock().unwrap_or_else(PoisonError::into_inner);
        urls.into_iter().filter(|url| visited.insert(url.clone())).collect()
    }
}
