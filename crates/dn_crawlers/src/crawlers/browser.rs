use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use dn_core::{Error, Result};
use futures::StreamExt;
use tokio::task::JoinHandle;

/// One headless Chromium session, acquired per crawl. [`close`] must run on
/// every exit path; callers hold the fetch result and close before `?`.
///
/// [`close`]: BrowserSession::close
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch() -> Result<Self> {
        let config = BrowserConfig::builder()
            .args(vec![
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--window-size=1920,1080",
            ])
            .build()
            .map_err(Error::Browser)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Browser(format!("failed to launch browser: {}", e)))?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });
        Ok(Self { browser, handler })
    }

    /// Navigates to `url`, waits (bounded) for `selector` to materialize in
    /// the rendered DOM, and returns the document HTML.
    pub async fn rendered_html(
        &self,
        url: &str,
        selector: &str,
        timeout: Duration,
    ) -> Result<String> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| Error::Browser(format!("failed to open {}: {}", url, e)))?;

        let deadline = tokio::time::Instant::now() + timeout;
        while page.find_element(selector).await.is_err() {
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Browser(format!(
                    "timed out waiting for {} on {}",
                    selector, url
                )));
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }

        let html = page
            .content()
            .await
            .map_err(|e| Error::Browser(format!("failed to read rendered page: {}", e)))?;
        page.close().await.ok();
        Ok(html)
    }

    pub async fn close(mut self) {
        self.browser.close().await.ok();
        self.handler.abort();
    }
}
