use std::io::Write;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use jobscout_client::{ReqwestFetcher, ScraperExtractor};
use jobscout_core::cache::{CacheKey, MokaCacheStore};
use jobscout_core::config::ScrapeConfig;
use jobscout_core::filters::FilterName;
use jobscout_core::models::{SearchOutcome, processing_seconds};
use jobscout_core::query::JobQuery;
use jobscout_core::scrape::ScrapeService;
use jobscout_core::traits::Fetcher;
use jobscout_core::url_builder::build_search_url;

#[derive(Parser)]
#[command(name = "jobscout", version, about = "Job listing search with concurrent detail enrichment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search and print the jobs found
    Search {
        #[command(flatten)]
        query: QueryArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Render pages in headless Chromium instead of plain HTTP
        #[arg(long, default_value_t = false)]
        browser: bool,
    },

    /// Print the search URL and cache keys for a query without fetching
    Url {
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// Search terms
    #[arg(short, long)]
    keyword: Option<String>,

    /// Location
    #[arg(short, long)]
    location: Option<String>,

    /// day, week or month
    #[arg(long)]
    date_posted: Option<String>,

    /// fulltime, parttime, contract or internship
    #[arg(long)]
    job_type: Option<String>,

    /// entry, associate, mid, senior or director
    #[arg(long)]
    experience: Option<String>,

    /// Comma-separated company names (at most 10)
    #[arg(long)]
    company: Option<String>,

    /// all, onsite, remote or hybrid
    #[arg(long)]
    workplace: Option<String>,
}

impl QueryArgs {
    fn to_query(&self) -> Result<JobQuery> {
        let filters = [
            (FilterName::DatePosted, &self.date_posted),
            (FilterName::JobType, &self.job_type),
            (FilterName::Experience, &self.experience),
            (FilterName::Company, &self.company),
            (FilterName::Workplace, &self.workplace),
        ];
        let query = JobQuery::new(
            self.keyword.as_deref(),
            self.location.as_deref(),
            filters
                .iter()
                .filter_map(|(name, value)| value.as_deref().map(|v| (*name, v))),
        )?;
        Ok(query)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscout=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ScrapeConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Search {
            query,
            format,
            browser,
        } => {
            let query = query.to_query()?;
            if browser {
                cmd_search_browser(config, &query, format).await?;
            } else {
                let fetcher = ReqwestFetcher::new(config.proxy.as_ref())
                    .context("Failed to create HTTP client")?;
                cmd_search(fetcher, config, &query, format).await?;
            }
        }
        Commands::Url { query } => {
            let query = query.to_query()?;
            cmd_url(&config, &query)?;
        }
    }

    Ok(())
}

#[cfg(feature = "browser")]
async fn cmd_search_browser(config: ScrapeConfig, query: &JobQuery, format: OutputFormat) -> Result<()> {
    let fetcher = jobscout_client::BrowserFetcher::launch(config.proxy.as_ref())
        .await
        .context("Failed to launch headless browser")?;
    cmd_search(fetcher, config, query, format).await
}

#[cfg(not(feature = "browser"))]
async fn cmd_search_browser(_: ScrapeConfig, _: &JobQuery, _: OutputFormat) -> Result<()> {
    anyhow::bail!("--browser requires jobscout to be built with the `browser` feature")
}

async fn cmd_search<F: Fetcher>(
    fetcher: F,
    config: ScrapeConfig,
    query: &JobQuery,
    format: OutputFormat,
) -> Result<()> {
    let cache = MokaCacheStore::new(config.cache_capacity);
    let service = ScrapeService::new(fetcher, ScraperExtractor::new(), cache, config);

    let outcome = service.search(query).await?;

    tracing::info!(
        source = %outcome.source,
        count = outcome.count(),
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "Search finished"
    );
    if let Some(message) = &outcome.error_message {
        tracing::warn!("{message}");
    }
    if let Some(warning) = &outcome.filter_warning {
        tracing::warn!("{}", warning.message);
    }

    match format {
        OutputFormat::Json => print_json(&outcome),
        OutputFormat::Csv => print_csv(&outcome),
    }
}

fn print_json(outcome: &SearchOutcome) -> Result<()> {
    let body = serde_json::json!({
        "success": true,
        "source": outcome.source,
        "count": outcome.count(),
        "processing_time": processing_seconds(outcome.elapsed),
        "error_message": outcome.error_message,
        "filter_warning": outcome.filter_warning,
        "jobs": outcome.jobs,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn print_csv(outcome: &SearchOutcome) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    if outcome.jobs.is_empty() {
        writer.write_record(["title", "company", "location", "url", "date_posted", "snippet"])?;
    }
    for job in &outcome.jobs {
        writer.serialize(job)?;
    }
    writer.flush()?;
    Ok(())
}

fn cmd_url(config: &ScrapeConfig, query: &JobQuery) -> Result<()> {
    let url = build_search_url(&config.search_url, query)?;
    let key = CacheKey::for_query(query);

    let mut out = std::io::stdout().lock();
    writeln!(out, "url:       {url}")?;
    writeln!(out, "fresh key: {}", key.fresh())?;
    writeln!(out, "stale key: {}", key.stale())?;
    Ok(())
}
