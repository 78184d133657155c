use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use jobscout_core::config::ProxyConfig;
use jobscout_core::error::AppError;
use jobscout_core::traits::Fetcher;

/// Headless-browser fetcher using Chromium via the Chrome DevTools Protocol.
///
/// Unlike [`crate::ReqwestFetcher`], this renders JavaScript before returning
/// the markup, which the search page needs to fill in its result cards.
///
/// A single Chromium process is shared across all clones; each
/// [`Fetcher::fetch`] call is its own tab, closed on every exit path,
/// including when the caller drops the future on timeout.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use jobscout_client::BrowserFetcher;
/// use jobscout_core::traits::Fetcher;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = BrowserFetcher::launch(None).await?;
/// let html = fetcher.fetch("https://example.com", Duration::from_secs(15)).await?;
/// println!("{}", &html[..200]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BrowserFetcher {
    browser: Arc<Browser>,
    settle: Duration,
}

/// Closes its tab when dropped. `Page::close` is async, so the close runs on
/// a detached task.
struct PageGuard(Option<Page>);

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.0.take() {
            tokio::spawn(async move {
                if let Err(e) = page.close().await {
                    tracing::debug!(error = %e, "Failed to close browser tab");
                }
            });
        }
    }
}

impl BrowserFetcher {
    /// Launches a headless Chromium, optionally behind a proxy.
    ///
    /// Chromium takes the proxy address on its command line but has no flag
    /// for proxy credentials; if they are set, a warning is logged and the
    /// proxy is used unauthenticated.
    pub async fn launch(proxy: Option<&ProxyConfig>) -> Result<Self, AppError> {
        let mut builder = BrowserConfig::builder();
        builder = builder.no_sandbox().disable_default_args();

        // Snap-packaged Chromium exposes a wrapper that rejects standard
        // Chrome CLI flags, so prefer the real binary when we can find it.
        if let Some(bin) = Self::find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        if let Some(proxy) = proxy {
            if proxy.has_credentials() {
                tracing::warn!(
                    proxy = %proxy.address(),
                    "Proxy credentials are not supported by the browser fetcher; connecting without them"
                );
            }
            builder = builder.arg(format!("--proxy-server={}", proxy.url()));
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg("--blink-settings=imagesEnabled=false")
            .build()
            .map_err(|e| AppError::BrowserError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        Ok(Self {
            browser: Arc::new(browser),
            settle: Duration::from_secs(2),
        })
    }

    /// Time to wait after `<body>` appears, for client-side rendering to
    /// finish. Counted against the fetch timeout.
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Locate the real Chrome/Chromium binary, honouring `CHROME_BIN`.
    /// `None` lets `chromiumoxide` do its own lookup.
    fn find_chrome_binary() -> Option<PathBuf> {
        let candidates: &[&str] = &[
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ];

        if let Ok(p) = std::env::var("CHROME_BIN") {
            let path = PathBuf::from(&p);
            if path.exists() {
                return Some(path);
            }
        }

        candidates.iter().map(PathBuf::from).find(|p| p.exists())
    }

    async fn render(&self, url: &str) -> Result<String, AppError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to navigate to {url}: {e}")))?;
        let guard = PageGuard(Some(page));
        let Some(page) = guard.0.as_ref() else {
            return Err(AppError::BrowserError("tab closed before use".into()));
        };

        page.find_element("body")
            .await
            .map_err(|e| AppError::BrowserError(format!("Page did not render body: {e}")))?;

        tokio::time::sleep(self.settle).await;

        page.content()
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to read page content: {e}")))
    }
}

impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, AppError> {
        tokio::time::timeout(timeout, self.render(url))
            .await
            .unwrap_or(Err(AppError::Timeout(timeout)))
    }
}
