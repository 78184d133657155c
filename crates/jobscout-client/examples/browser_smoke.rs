/// Smoke-test for `BrowserFetcher` + `ScraperExtractor`.
///
/// Launches a headless Chromium, renders one live search page and prints the
/// result cards it finds. Honours the usual `PROXY_*` variables.
///
/// Run with:
///   cargo run -p jobscout-client --example browser_smoke --features browser -- "rust developer" "Berlin"
use std::time::Duration;

use jobscout_client::{BrowserFetcher, ScraperExtractor};
use jobscout_core::config::ScrapeConfig;
use jobscout_core::query::JobQuery;
use jobscout_core::selectors::{SEARCH_CARDS, TITLE};
use jobscout_core::traits::{Extractor, Fetcher};
use jobscout_core::url_builder::build_search_url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let mut args = std::env::args().skip(1);
    let keyword = args.next().unwrap_or_else(|| "rust developer".into());
    let location = args.next().unwrap_or_else(|| "Berlin".into());

    let config = ScrapeConfig::from_env()?;
    let query = JobQuery::new(Some(&keyword), Some(&location), [])?;
    let url = build_search_url(&config.search_url, &query)?;

    println!("Launching headless browser…");
    let fetcher = BrowserFetcher::launch(config.proxy.as_ref()).await?;

    println!("Fetching {url} …");
    let html = fetcher.fetch(&url, Duration::from_secs(30)).await?;
    let cards = ScraperExtractor::new().extract(&html, &SEARCH_CARDS)?;

    println!("Got {} bytes, {} cards", html.len(), cards.len());
    for card in cards.iter().take(5) {
        println!("  - {}", card.get(TITLE).map(String::as_str).unwrap_or("?"));
    }
    Ok(())
}
