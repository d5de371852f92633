use std::time::Duration;

use dn_core::{Error, Result};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use url::Url;

/// Configuration for the shared page fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of GET attempts before giving up
    pub retries: u32,
    /// Base delay between attempts; actual sleep is `delay * (1 + jitter)`
    pub delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retries: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// HTTP page fetcher shared by all crawlers. Explicitly constructed and
/// passed around instead of living in module-level state.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    retries: u32,
    delay: Duration,
}

const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
];

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(reqwest::header::USER_AGENT, HeaderValue::from_static(USER_AGENTS[0]));
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.8,en-US;q=0.5,en;q=0.3"),
    );
    headers.insert(reqwest::header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers.insert(reqwest::header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    headers
}

/// A user agent drawn at random from the rotation pool.
pub fn random_user_agent() -> &'static str {
    let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

/// True when the URL carries both a scheme and a host.
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => !parsed.scheme().is_empty() && parsed.has_host(),
        Err(_) => false,
    }
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self> {
        // Some of the target sites present certificates reqwest rejects;
        // verification stays off to match their served configuration.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers())
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            client,
            retries: config.retries,
            delay: config.delay,
        })
    }

    /// Fetches the body of `url` as text, retrying transport failures.
    ///
    /// The URL is validated before any network I/O. Exhausting every
    /// attempt returns `Error::Fetch`; this method never panics.
    pub async fn get_html(&self, url: &str) -> Result<String> {
        if !is_valid_url(url) {
            tracing::error!("refusing to fetch invalid url: {}", url);
            return Err(Error::InvalidUrl(url.to_string()));
        }

        let mut last_err: Option<Error> = None;
        for attempt in 1..=self.retries {
            tracing::info!("fetching {} (attempt {}/{})", url, attempt, self.retries);
            match self.try_get(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::error!("request failed (attempt {}/{}): {}", attempt, self.retries, e);
                    last_err = Some(e);
                    if attempt < self.retries {
                        let jitter: f64 = rand::thread_rng().gen_range(0.0..0.5);
                        let sleep = self.delay.mul_f64(1.0 + jitter);
                        tracing::info!("waiting {:.2}s before retry", sleep.as_secs_f64());
                        tokio::time::sleep(sleep).await;
                    }
                }
            }
        }

        let detail = last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt was made".to_string());
        Err(Error::Fetch(format!(
            "all {} attempts failed for {}: {}",
            self.retries, url, detail
        )))
    }

    async fn try_get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default();
            if !content_type.to_ascii_lowercase().contains("text/html") {
                tracing::warn!("response content type is not HTML: {}", content_type);
            }
        }
        let body = response.text().await?;
        tracing::info!("fetched {} characters from {}", body.len(), url);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://tv.cctv.com/lm/xwlb/index.shtml"));
        assert!(is_valid_url("http://example.com"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("/relative/path"));
        assert!(!is_valid_url("file:///etc/hosts"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_random_user_agent_is_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_io() {
        let fetcher = Fetcher::new().unwrap();
        let err = fetcher.get_html("not a url").await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_retries_exhaust_into_fetch_error() {
        // Port 9 (discard) refuses connections locally; no external traffic.
        let fetcher = Fetcher::with_config(FetchConfig {
            timeout_secs: 1,
            retries: 3,
            delay: Duration::from_millis(0),
        })
        .unwrap();
        let err = fetcher.get_html("http://127.0.0.1:9/").await.unwrap_err();
        match err {
            Error::Fetch(msg) => assert!(msg.contains("all 3 attempts failed")),
            other => panic!("unexpected error: {}", other),
        }
    }
}
