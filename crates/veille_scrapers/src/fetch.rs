//! Polite HTTP fetch capability shared by listing and article retrieval.
//!
//! Retry/backoff and per-host rate limiting live here so the politeness and
//! resilience policy is defined once for the whole pipeline.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::prelude::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use veille_core::config::Settings;
use veille_core::{Error, Result};

/// Desktop User-Agent strings rotated across requests.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

pub struct Fetcher {
    client: reqwest::Client,
    min_delay: Duration,
    max_retries: u32,
    last_request: Mutex<HashMap<String, Instant>>,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Fetcher {
            client,
            min_delay: Duration::from_millis(settings.delay_ms),
            max_retries: settings.max_retries,
            last_request: Mutex::new(HashMap::new()),
        })
    }

    /// Fetches a page and decodes it with the source's configured encoding.
    /// Transient failures (connect, timeout, 5xx, 429) are retried with
    /// exponential backoff; anything else fails immediately.
    pub async fn get_text(&self, url: &str, encoding: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            self.respect_delay(url).await;

            match self.try_get(url, encoding).await {
                Ok(body) => return Ok(body),
                Err(FetchAttempt::Transient(reason)) if attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = backoff_delay(attempt);
                    warn!(
                        "🔁 retrying {} in {}s ({}/{}): {}",
                        url,
                        backoff.as_secs(),
                        attempt,
                        self.max_retries,
                        reason
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(FetchAttempt::Transient(reason)) | Err(FetchAttempt::Fatal(reason)) => {
                    return Err(Error::fetch(url, reason));
                }
            }
        }
    }

    async fn try_get(&self, url: &str, encoding: &str) -> std::result::Result<String, FetchAttempt> {
        let user_agent = USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .text_with_charset(encoding)
                .await
                .map_err(classify_reqwest_error)?;
            debug!("fetched {} ({} bytes)", url, body.len());
            Ok(body)
        } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(FetchAttempt::Transient(format!("HTTP {}", status)))
        } else {
            Err(FetchAttempt::Fatal(format!("HTTP {}", status)))
        }
    }

    /// Waits out the per-host politeness delay before hitting `url`'s host.
    async fn respect_delay(&self, url: &str) {
        let host = match Url::parse(url) {
            Ok(u) => match u.host_str() {
                Some(h) => h.to_string(),
                None => return,
            },
            Err(_) => return,
        };

        let wait = {
            let mut last = self.last_request.lock().await;
            let now = Instant::now();
            let wait = last
                .get(&host)
                .and_then(|t| self.min_delay.checked_sub(now.duration_since(*t)))
                .unwrap_or(Duration::ZERO);
            last.insert(host, now + wait);
            wait
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

enum FetchAttempt {
    /// Worth retrying: network-level failure or a 5xx/429 answer.
    Transient(String),
    Fatal(String),
}

fn classify_reqwest_error(e: reqwest::Error) -> FetchAttempt {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        FetchAttempt::Transient(e.to_string())
    } else {
        FetchAttempt::Fatal(e.to_string())
    }
}

/// 2s, 4s, 8s, capped at 10s.
fn backoff_delay(attempt: u32) -> Duration {
    let secs = 2u64.saturating_pow(attempt).min(10);
    Duration::from_secs(secs)
}
