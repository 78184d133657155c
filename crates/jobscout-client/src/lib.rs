pub mod extractor;
pub mod fetcher;

#[cfg(feature = "browser")]
pub mod browser_fetcher;

#[cfg(feature = "browser")]
pub use browser_fetcher::BrowserFetcher;
pub use extractor::ScraperExtractor;
pub use fetcher::ReqwestFetcher;
