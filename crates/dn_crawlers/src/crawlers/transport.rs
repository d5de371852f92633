use async_trait::async_trait;
use dn_core::{Error, News, NewsResponse, Result};
use scraper::{Html, Selector};
use url::Url;

use crate::crawlers::extract::text_of;
use crate::crawlers::{Crawler, Listing, NewsKey};
use crate::fetch::Fetcher;
use crate::util;

const ORIGIN: &str = "交通部";

// Today and yesterday.
const DAY_OFFSET: usize = 2;

/// Crawls the transport ministry's headline listing. Entries carry inline
/// date badges and are filtered to a two-day freshness window.
pub struct TransportNewsCrawler {
    url: Url,
    fetcher: Fetcher,
}

impl TransportNewsCrawler {
    pub const DEFAULT_URL: &'static str = "https://www.mot.gov.cn/jiaotongyaowen/";

    pub fn new(url: &str, fetcher: Fetcher) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self { url, fetcher })
    }

    async fn crawl(&self) -> Result<Vec<News>> {
        let window = util::recent_days(DAY_OFFSET);
        let html = self.fetcher.get_html(self.url.as_str()).await?;
        let listing = parse_listing(&html, self.url.as_str(), &window)?;

        let mut news_list = Vec::new();
        for (key, url) in listing.iter() {
            let detail = self.fetcher.get_html(url).await?;
            let summary = parse_detail(&detail)?;
            news_list.push(News {
                title: key.title.clone(),
                url: url.clone(),
                origin: ORIGIN.to_string(),
                summary,
                publish_date: key.date.clone(),
            });
        }
        Ok(news_list)
    }
}

/// Anchors inside the tabbed list groups, filtered by the date badge and
/// keyed by (title, date) to deduplicate repeated entries across groups.
fn parse_listing(html: &str, base: &str, window: &[String]) -> Result<Listing> {
    let document = Html::parse_document(html);
    let container = document
        .select(&Selector::parse("div.list-group.tab-content").unwrap())
        .next()
        .ok_or_else(|| Error::Scraping("list-group container not found".to_string()))?;

    let group_selector = Selector::parse("div").unwrap();
    let anchor_selector = Selector::parse("a.list-group-item").unwrap();
    let badge_selector = Selector::parse("span.badge").unwrap();

    let mut listing = Listing::new();
    for group in container.select(&group_selector) {
        for anchor in group.select(&anchor_selector) {
            let Some(badge) = anchor.select(&badge_selector).next() else {
                continue;
            };
            let date = text_of(&badge);
            if !window.contains(&date) {
                continue;
            }
            let (Some(href), Some(title)) =
                (anchor.value().attr("href"), anchor.value().attr("title"))
            else {
                continue;
            };
            let url = util::join_urls(base, href)?;
            listing.insert(NewsKey::new(title, date), url);
        }
    }
    Ok(listing)
}

fn parse_detail(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let zoom = document
        .select(&Selector::parse("div#Zoom").unwrap())
        .next()
        .ok_or_else(|| Error::Scraping("article container div#Zoom not found".to_string()))?;
    let span_selector = Selector::parse("span[style=\"line-height: 2em;\"]").unwrap();
    Ok(zoom.select(&span_selector).map(|span| text_of(&span)).collect())
}

#[async_trait]
impl Crawler for TransportNewsCrawler {
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
        vec!["transport", "mot"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.mot.gov.cn/jiaotongyaowen/";

    fn listing_page(items: &str) -> String {
        format!(
            "<html><body><div class=\"list-group tab-content\"><div class=\"tab-pane\">{}</div></div></body></html>",
            items
        )
    }

    fn item(title: &str, href: &str, date: &str) -> String {
        format!(
            "<a class=\"list-group-item\" href=\"{}\" title=\"{}\"><span class=\"badge\">{}</span></a>",
            href, title, date
        )
    }

    #[test]
    fn test_parse_listing_filters_by_window() {
        let window = vec!["2026-08-06".to_string(), "2026-08-05".to_string()];
        let html = listing_page(&format!(
            "{}{}{}{}",
            item("今日要闻", "./202608/a.html", "2026-08-06"),
            item("昨日要闻", "./202608/b.html", "2026-08-05"),
            item("过期要闻", "./202607/c.html", "2026-07-30"),
            item("未来要闻", "./202609/d.html", "2026-09-01"),
        ));
        let listing = parse_listing(&html, BASE, &window).unwrap();
        assert_eq!(listing.len(), 2);
        let titles: Vec<&str> = listing.iter().map(|(k, _)| k.title.as_str()).collect();
        assert_eq!(titles, vec!["今日要闻", "昨日要闻"]);
        let (_, url) = listing.iter().next().unwrap();
        assert_eq!(url, "https://www.mot.gov.cn/jiaotongyaowen/202608/a.html");
    }

    #[test]
    fn test_parse_listing_selection_independent_of_order() {
        let window = vec!["2026-08-06".to_string()];
        let html = listing_page(&format!(
            "{}{}{}",
            item("过期", "./old.html", "2026-07-01"),
            item("命中", "./hit.html", "2026-08-06"),
            item("过期二", "./old2.html", "2026-06-01"),
        ));
        let listing = parse_listing(&html, BASE, &window).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.iter().next().unwrap().0.title, "命中");
    }

    #[test]
    fn test_parse_listing_skips_anchor_without_href_or_title() {
        let window = vec!["2026-08-06".to_string()];
        let html = listing_page(
            "<a class=\"list-group-item\" title=\"无链接\"><span class=\"badge\">2026-08-06</span></a>\
             <a class=\"list-group-item\" href=\"./a.html\"><span class=\"badge\">2026-08-06</span></a>",
        );
        let listing = parse_listing(&html, BASE, &window).unwrap();
        assert!(listing.is_empty());
    }

    #[test]
    fn test_parse_listing_dedupes_repeated_entries() {
        let window = vec!["2026-08-06".to_string()];
        let html = listing_page(&format!(
            "{}{}",
            item("同一条", "./a.html", "2026-08-06"),
            item("同一条", "./b.html", "2026-08-06"),
        ));
        let listing = parse_listing(&html, BASE, &window).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.iter().next().unwrap().1, "https://www.mot.gov.cn/jiaotongyaowen/b.html");
    }

    #[test]
    fn test_parse_listing_missing_container() {
        let err = parse_listing("<div class=\"other\"></div>", BASE, &[]).unwrap_err();
        assert!(matches!(err, Error::Scraping(_)));
    }

    #[test]
    fn test_parse_detail_reads_styled_spans() {
        let html = r#"
            <div id="Zoom">
                <span style="line-height: 2em;">第一段。</span>
                <span>忽略这段</span>
                <span style="line-height: 2em;">第二段。</span>
            </div>
        "#;
        assert_eq!(parse_detail(html).unwrap(), "第一段。第二段。");
    }

    #[test]
    fn test_parse_detail_missing_container() {
        assert!(parse_detail("<div id=\"NotZoom\"></div>").is_err());
    }
}
