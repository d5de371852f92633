use async_trait::async_trait;
use dn_core::{Error, News, NewsResponse, Result};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::crawlers::extract::{direct_child_named, text_of};
use crate::crawlers::{Crawler, Listing, NewsKey};
use crate::fetch::Fetcher;
use crate::util;

const ORIGIN: &str = "商务部";

// Top-leadership and other-leadership activity sections, merged in this
// order (the later section wins on key collision).
const SECTIONS: [&str; 2] = ["xwfb/ldrhd/index.html", "xwfb/bldhd/index.html"];

// The rendered list container varies by template revision.
const LIST_CLASSES: [&str; 3] = ["txtList_01", "txtList_02", "txtList"];

const API_DAY_OFFSET: usize = 4;
#[cfg(feature = "headless")]
const BROWSER_DAY_OFFSET: usize = 1;
#[cfg(feature = "headless")]
const BROWSER_WAIT: std::time::Duration = std::time::Duration::from_secs(5);

/// How the commerce listing, which is injected client side, gets read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStrategy {
    /// Call the JSON endpoint referenced by the page's embedded script.
    Api,
    /// Render the page in a headless browser and read the DOM.
    #[cfg(feature = "headless")]
    Browser,
}

/// Crawls the commerce ministry's leadership-activity sections. The listing
/// markup is not in the static HTML; it is either recovered through the
/// site's own listing API or read from a rendered DOM.
pub struct CommerceNewsCrawler {
    url: Url,
    fetcher: Fetcher,
    strategy: ListingStrategy,
    day_offset: usize,
}

impl CommerceNewsCrawler {
    pub const DEFAULT_URL: &'static str = "https://www.mofcom.gov.cn/";

    pub fn new(url: &str, fetcher: Fetcher) -> Result<Self> {
        Self::with_strategy(url, fetcher, ListingStrategy::Api)
    }

    pub fn with_strategy(url: &str, fetcher: Fetcher, strategy: ListingStrategy) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        let day_offset = match strategy {
            ListingStrategy::Api => API_DAY_OFFSET,
            #[cfg(feature = "headless")]
            ListingStrategy::Browser => BROWSER_DAY_OFFSET,
        };
        Ok(Self {
            url,
            fetcher,
            strategy,
            day_offset,
        })
    }

    pub fn day_offset(mut self, day_offset: usize) -> Self {
        self.day_offset = day_offset;
        self
    }

    async fn crawl(&self) -> Result<Option<Vec<News>>> {
        let window = util::recent_days(self.day_offset);
        let mut listing = Listing::new();
        for section in SECTIONS {
            listing.merge(self.section_listing(section, &window).await?);
        }

        let mut news_list = Vec::new();
        for (key, url) in listing.iter() {
            let summary = match self.fetch_detail(url).await {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!("skipping detail page {}: {}", url, e);
                    continue;
                }
            };
            news_list.push(News {
                title: key.title.clone(),
                url: url.clone(),
                origin: ORIGIN.to_string(),
                summary,
                publish_date: key.date.clone(),
            });
        }

        if news_list.is_empty() {
            return Ok(None);
        }
        Ok(Some(news_list))
    }

    async fn section_listing(&self, section: &str, window: &[String]) -> Result<Listing> {
        match self.strategy {
            ListingStrategy::Api => self.listing_via_api(section, window).await,
            #[cfg(feature = "headless")]
            ListingStrategy::Browser => self.listing_via_browser(section, window).await,
        }
    }

    /// Strategy (b): the static page embeds a script element whose `url`
    /// and `para` attributes describe the XHR the browser would issue; call
    /// it directly and parse the HTML fragment from its JSON payload.
    async fn listing_via_api(&self, section: &str, window: &[String]) -> Result<Listing> {
        let listing_url = util::join_urls(self.url.as_str(), section)?;
        let html = self.fetcher.get_html(&listing_url).await?;
        let (api, para) = discover_listing_api(&html)?;
        let request_url = build_api_url(&listing_url, &api, &para)?;
        let body = self.fetcher.get_html(&request_url).await?;
        let fragment = parse_payload(&body)?;
        collect_listing(&Html::parse_fragment(&fragment), &listing_url, window)
    }

    /// Strategy (a): render the page and run the same traversal over the
    /// materialized DOM. The browser session is released on every exit path.
    #[cfg(feature = "headless")]
    async fn listing_via_browser(&self, section: &str, window: &[String]) -> Result<Listing> {
        use crate::crawlers::browser::BrowserSession;

        let listing_url = util::join_urls(self.url.as_str(), section)?;
        let session = BrowserSession::launch().await?;
        let rendered = session
            .rendered_html(&listing_url, "ul.txtList_01", BROWSER_WAIT)
            .await;
        session.close().await;
        let html = rendered?;
        collect_listing(&Html::parse_document(&html), &listing_url, window)
    }

    async fn fetch_detail(&self, url: &str) -> Result<String> {
        let html = self.fetcher.get_html(url).await?;
        parse_detail(&html)
    }
}

/// Locates the script element that drives the client-side listing render.
fn discover_listing_api(html: &str) -> Result<(String, String)> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script[url][para]").unwrap();
    let script = document.select(&selector).next().ok_or_else(|| {
        Error::Upstream("listing script with url/para attributes not found".to_string())
    })?;
    let api = script.value().attr("url").unwrap_or_default().to_string();
    let para = script.value().attr("para").unwrap_or_default().trim().to_string();
    if api.is_empty() {
        return Err(Error::Upstream("listing script callback url is empty".to_string()));
    }
    if para.is_empty() {
        return Err(Error::Upstream("listing script query blob is empty".to_string()));
    }
    Ok((api, para))
}

/// The query blob is written with single quotes; normalize before parsing.
fn parse_query_blob(para: &str) -> Result<serde_json::Map<String, Value>> {
    let normalized = para.replace('\'', "\"");
    let value: Value = serde_json::from_str(&normalized)
        .map_err(|e| Error::Upstream(format!("malformed listing query blob: {}", e)))?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| Error::Upstream("listing query blob is not a JSON object".to_string()))
}

/// Absolute API request URL carrying the blob's parameters plus a forced
/// first-page parameter.
fn build_api_url(listing_url: &str, api: &str, para: &str) -> Result<String> {
    let mut params = parse_query_blob(para)?;
    params.insert("page".to_string(), Value::from(1));

    let mut url = Url::parse(&util::join_urls(listing_url, api)?)
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", api, e)))?;
    {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in &params {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            pairs.append_pair(name, &value);
        }
    }
    Ok(url.to_string())
}

#[derive(Debug, Deserialize)]
struct ListingPayload {
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<ListingData>,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    html: Option<String>,
}

/// The HTML fragment out of the listing API's JSON payload.
fn parse_payload(body: &str) -> Result<String> {
    let payload: ListingPayload = serde_json::from_str(body)
        .map_err(|e| Error::Upstream(format!("listing api returned non-JSON response: {}", e)))?;
    if payload.code != Some(200) {
        return Err(Error::Upstream(format!(
            "listing api returned non-success payload: code {:?} msg {:?}",
            payload.code, payload.msg
        )));
    }
    payload
        .data
        .and_then(|data| data.html)
        .ok_or_else(|| Error::Upstream("listing api payload is missing the html fragment".to_string()))
}

/// Shared list-item traversal for both the API fragment and the rendered
/// document: anchor href/title plus a direct-child span date, bracket
/// characters stripped, filtered by the freshness window.
fn collect_listing(document: &Html, base: &str, window: &[String]) -> Result<Listing> {
    let li_selector = Selector::parse("li").unwrap();
    let a_selector = Selector::parse("a").unwrap();

    let mut listing = Listing::new();
    for class in LIST_CLASSES {
        let ul_selector = Selector::parse(&format!("ul.{}", class)).unwrap();
        let Some(ul) = document.select(&ul_selector).next() else {
            continue;
        };
        for li in ul.select(&li_selector) {
            let Some(anchor) = li.select(&a_selector).next() else {
                continue;
            };
            let Some(span) = direct_child_named(&li, "span") else {
                continue;
            };
            let (Some(href), Some(title)) =
                (anchor.value().attr("href"), anchor.value().attr("title"))
            else {
                continue;
            };
            let date = text_of(&span)
                .trim_matches(|c| matches!(c, '[' | ']' | '(' | ')'))
                .to_string();
            if !window.contains(&date) {
                continue;
            }
            let url = util::join_urls(base, href)?;
            listing.insert(NewsKey::new(title, date), url);
        }
        break;
    }
    Ok(listing)
}

fn parse_detail(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let container = document
        .select(&Selector::parse("div.art-con.art-con-bottonmLine").unwrap())
        .next()
        .ok_or_else(|| Error::Scraping("article container not found".to_string()))?;
    let p_selector =
        Selector::parse("p[style=\"text-align: justify; text-indent: 2em;\"]").unwrap();
    Ok(container.select(&p_selector).map(|p| text_of(&p)).collect())
}

#[async_trait]
impl Crawler for CommerceNewsCrawler {
    fn origin(&self) -> &str {
        ORIGIN
    }

    fn source_url(&self) -> &Url {
        &self.url
    }

    async fn get_news(&self) -> NewsResponse {
        match self.crawl().await {
            Ok(Some(news_list)) => NewsResponse::ok(news_list),
            Ok(None) => NewsResponse::no_data(),
            Err(e) => NewsResponse::error("400", e.to_string()),
        }
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["commerce", "mofcom"]
    }
}
