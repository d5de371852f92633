use async_trait::async_trait;
use chrono::Local;
use dn_core::{Error, News, NewsResponse, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::crawlers::extract::{first_child_element, text_of};
use crate::crawlers::Crawler;
use crate::fetch::Fetcher;
use crate::util;

const ORIGIN: &str = "Aibase";

// Tailwind class soup, matched as an exact attribute value.
const DIGEST_LIST_CLASS: &str =
    "grid grid-cols-1 md:grid-cols-1 md:gap-[16px] gap-[32px] w-full pb-[40px]";
const POST_CONTENT_CLASS: &str =
    "overflow-hidden space-y-[20px] text-[15px] leading-[25px] break-words mainColor post-content text-wrap";

/// Crawls the AI-news aggregator's same-day digest page. One digest page
/// carries many articles as alternating title/body paragraphs.
pub struct AiNewsCrawler {
    url: Url,
    fetcher: Fetcher,
}

impl AiNewsCrawler {
    pub const DEFAULT_URL: &'static str = "https://news.aibase.com/zh/daily";

    pub fn new(url: &str, fetcher: Fetcher) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self { url, fetcher })
    }

    /// Digest links on the landing page are newest first; the first anchor
    /// in the list container is today's digest.
    fn daily_digest_url(&self, html: &str) -> Result<String> {
        let document = Html::parse_document(html);
        let container_selector =
            Selector::parse(&format!("div[class=\"{}\"]", DIGEST_LIST_CLASS)).unwrap();
        let container = document
            .select(&container_selector)
            .next()
            .ok_or_else(|| Error::Scraping("daily digest list container not found".to_string()))?;
        let anchor = container
            .select(&Selector::parse("a").unwrap())
            .next()
            .ok_or_else(|| Error::Scraping("daily digest link not found".to_string()))?;
        let href = anchor
            .value()
            .attr("href")
            .ok_or_else(|| Error::Scraping("daily digest link has no href".to_string()))?;
        Ok(format!("{}{}", util::base_url(&self.url), href))
    }

    async fn crawl(&self) -> Result<Vec<News>> {
        let landing = self.fetcher.get_html(self.url.as_str()).await?;
        let digest_url = self.daily_digest_url(&landing)?;
        let digest = self.fetcher.get_html(&digest_url).await?;
        let today = Local::now().format("%Y-%m-%d").to_string();
        parse_digest(&digest, &digest_url, &today)
    }
}

/// Walks the digest's paragraphs. A paragraph whose first direct child
/// element is `<strong>` starts a new article (unless the strong only wraps
/// an image); every other paragraph extends the current article's summary.
fn parse_digest(html: &str, digest_url: &str, today: &str) -> Result<Vec<News>> {
    let document = Html::parse_document(html);
    let container_selector =
        Selector::parse(&format!("div[class=\"{}\"]", POST_CONTENT_CLASS)).unwrap();
    let container = document
        .select(&container_selector)
        .next()
        .ok_or_else(|| Error::Scraping("post content container not found".to_string()))?;

    let paragraphs: Vec<ElementRef> = container.select(&Selector::parse("p").unwrap()).collect();

    let mut title = String::new();
    let mut texts: Vec<String> = Vec::new();
    let mut news_list = Vec::new();
    let make_news = |title: &str, summary: String| News {
        title: title.to_string(),
        url: digest_url.to_string(),
        origin: ORIGIN.to_string(),
        summary,
        publish_date: today.to_string(),
    };

    // The first two paragraphs are boilerplate, not articles.
    for p in paragraphs.iter().skip(2) {
        let first_child = first_child_element(p);
        match first_child.filter(|el| el.value().name() == "strong") {
            Some(strong) => {
                // An image-only strong marks a picture block, not a title.
                if first_child_element(&strong)
                    .map(|el| el.value().name() == "img")
                    .unwrap_or(false)
                {
                    continue;
                }
                if !texts.is_empty() {
                    news_list.push(make_news(&title, texts.concat()));
                    texts.clear();
                }
                title = text_of(&strong);
            }
            None => texts.push(text_of(p)),
        }
    }

    // Flush the article still accumulating when the walk ends.
    if !title.is_empty() || !texts.is_empty() {
        news_list.push(make_news(&title, texts.concat()));
    }

    Ok(news_list)
}

#[async_trait]
impl Crawler for AiNewsCrawler {
    fn origin(&self) -> &str {
        ORIGIN
    }

    fn source_url(&self) -> &Url {
        &self.url
    }

    async fn get_news(&self) -> NewsResponse {
        match self.crawl().await {
            Ok(news_list) => NewsResponse::ok(news_list),
            Err(e) => NewsResponse::error("500", e.to_string()),
        }
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["ai", "aibase"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_page(body: &str) -> String {
        format!(
            "<html><body><div class=\"{}\">\
             <p>boilerplate intro</p><p>boilerplate date line</p>{}\
             </div></body></html>",
            POST_CONTENT_CLASS, body
        )
    }

    #[test]
    fn test_parse_digest_three_titles() {
        let html = digest_page(
            "<p><strong>First title</strong></p>\
             <p>first body a.</p>\
             <p>first body b.</p>\
             <p><strong>Second title</strong></p>\
             <p>second body.</p>\
             <p><strong>Third title</strong></p>\
             <p>third body.</p>",
        );
        let news = parse_digest(&html, "https://news.aibase.com/zh/daily/1", "2026-08-06").unwrap();
        assert_eq!(news.len(), 3);
        assert_eq!(news[0].title, "First title");
        assert_eq!(news[0].summary, "first body a.first body b.");
        assert_eq!(news[1].title, "Second title");
        assert_eq!(news[2].title, "Third title");
        assert_eq!(news[2].summary, "third body.");
        assert!(news.iter().all(|n| n.origin == "Aibase"));
        assert!(news.iter().all(|n| n.publish_date == "2026-08-06"));
        assert!(news.iter().all(|n| n.url == "https://news.aibase.com/zh/daily/1"));
    }

    #[test]
    fn test_parse_digest_skips_image_blocks() {
        let html = digest_page(
            "<p><strong>Only title</strong></p>\
             <p>body.</p>\
             <p><strong><img src=\"x.png\"></strong></p>\
             <p>more body.</p>",
        );
        let news = parse_digest(&html, "https://x/d", "2026-08-06").unwrap();
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].summary, "body.more body.");
    }

    #[test]
    fn test_parse_digest_missing_container_is_error() {
        let err = parse_digest("<html><body></body></html>", "https://x/d", "2026-08-06").unwrap_err();
        assert!(matches!(err, Error::Scraping(_)));
    }

    #[test]
    fn test_parse_digest_empty_body_yields_nothing() {
        let html = digest_page("");
        let news = parse_digest(&html, "https://x/d", "2026-08-06").unwrap();
        assert!(news.is_empty());
    }

    #[test]
    fn test_daily_digest_url_resolves_against_base() {
        let fetcher = Fetcher::new().unwrap();
        let crawler = AiNewsCrawler::new(AiNewsCrawler::DEFAULT_URL, fetcher).unwrap();
        let html = format!(
            "<html><body><div class=\"{}\">\
             <a href=\"/zh/daily/123\">today</a>\
             <a href=\"/zh/daily/122\">yesterday</a>\
             </div></body></html>",
            DIGEST_LIST_CLASS
        );
        let url = crawler.daily_digest_url(&html).unwrap();
        assert_eq!(url, "https://news.aibase.com/zh/daily/123");
    }

    #[test]
    fn test_invalid_source_url_rejected() {
        let fetcher = Fetcher::new().unwrap();
        assert!(matches!(
            AiNewsCrawler::new("not a url", fetcher),
            Err(Error::InvalidUrl(_))
        ));
    }
}
