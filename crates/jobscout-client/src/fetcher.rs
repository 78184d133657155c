use std::time::Duration;

use jobscout_core::config::ProxyConfig;
use jobscout_core::error::AppError;
use jobscout_core::traits::Fetcher;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Plain HTTP fetcher using reqwest.
///
/// Sends browser-like headers and routes every request through the configured
/// proxy, credentials included. The per-call timeout covers the whole request,
/// body included. Connections are pooled by the shared client but no request
/// state outlives a call.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(proxy: Option<&ProxyConfig>) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers);

        if let Some(proxy) = proxy {
            let mut outbound = reqwest::Proxy::all(proxy.url())
                .map_err(|e| AppError::ConfigError(format!("Invalid proxy: {e}")))?;
            if let Some(username) = &proxy.username {
                outbound = outbound.basic_auth(username, proxy.password.as_deref().unwrap_or(""));
            }
            tracing::info!(proxy = %proxy.address(), "Routing fetches through proxy");
            builder = builder.proxy(outbound);
        }

        let client = builder
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, AppError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(timeout)
            } else {
                AppError::HttpError(format!("Failed to read response body: {e}"))
            }
        })
    }
}

fn map_error(e: reqwest::Error, timeout: Duration) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(timeout)
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {e}"))
    } else {
        AppError::HttpError(e.to_string())
    }
}
