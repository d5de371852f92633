use async_trait::async_trait;
use chrono::{Days, Local};
use dn_core::{Error, News, NewsResponse, Result};
use scraper::{Html, Selector};
use url::Url;

use crate::crawlers::extract::text_of;
use crate::crawlers::Crawler;
use crate::fetch::Fetcher;

const ORIGIN: &str = "新闻联播";

// The anchor titles carry a fixed 4-character site prefix.
const TITLE_PREFIX_CHARS: usize = 4;

/// Crawls the broadcaster's evening-news listing. The program airs nightly,
/// so every record is dated t-1 regardless of page content.
pub struct CctvNewsCrawler {
    url: Url,
    fetcher: Fetcher,
}

impl CctvNewsCrawler {
    pub const DEFAULT_URL: &'static str = "https://tv.cctv.com/lm/xwlb/index.shtml";

    pub fn new(url: &str, fetcher: Fetcher) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self { url, fetcher })
    }

    async fn crawl(&self) -> Result<Vec<News>> {
        let listing = self.fetcher.get_html(self.url.as_str()).await?;
        let entries = parse_listing(&listing)?;

        let yesterday = Local::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .map(|day| day.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        let mut news_list = Vec::new();
        for (title, url) in entries {
            let detail = self.fetcher.get_html(&url).await?;
            let summary = parse_detail(&detail)?;
            news_list.push(News {
                title,
                url,
                origin: ORIGIN.to_string(),
                summary,
                publish_date: yesterday.clone(),
            });
        }
        Ok(news_list)
    }
}

/// Title/URL pairs from the listing, in page order. The first entry links
/// the full-program video and is skipped.
fn parse_listing(html: &str) -> Result<Vec<(String, String)>> {
    let document = Html::parse_document(html);
    let ul = document
        .select(&Selector::parse("ul#content").unwrap())
        .next()
        .ok_or_else(|| Error::Scraping("news listing ul#content not found".to_string()))?;

    let li_selector = Selector::parse("li").unwrap();
    let a_selector = Selector::parse("a").unwrap();
    let mut entries = Vec::new();
    for (idx, li) in ul.select(&li_selector).enumerate() {
        if idx == 0 {
            continue;
        }
        let Some(anchor) = li.select(&a_selector).next() else {
            continue;
        };
        let (Some(href), Some(title)) = (anchor.value().attr("href"), anchor.value().attr("title"))
        else {
            continue;
        };
        let title: String = title.chars().skip(TITLE_PREFIX_CHARS).collect();
        entries.push((title, href.to_string()));
    }
    Ok(entries)
}

fn parse_detail(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let content = document
        .select(&Selector::parse("div.content_area").unwrap())
        .next()
        .ok_or_else(|| Error::Scraping("content_area container not found".to_string()))?;
    Ok(content
        .select(&Selector::parse("p").unwrap())
        .map(|p| text_of(&p))
        .collect())
}

#[async_trait]
impl Crawler for CctvNewsCrawler {
    fn origin(&self) -> &str {
        ORIGIN
    }

    fn source_url(&self) -> &Url {
        &self.url
    }

    async fn get_news(&self) -> NewsResponse {
        match self.crawl().await {
            Ok(news_list) if news_list.is_empty() => NewsResponse::no_data(),
            Ok(news_list) => NewsResponse::ok(news_list),
            Err(e) => NewsResponse::error("500", e.to_string()),
        }
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["cctv", "xwlb"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_skips_video_entry() {
        let html = r#"
            <ul id="content">
                <li><a href="https://tv.cctv.com/video/full" title="full program video"></a></li>
                <li><a href="https://tv.cctv.com/a/1.shtml" title="[视频]国内要闻一"></a></li>
                <li><a href="https://tv.cctv.com/a/2.shtml" title="[视频]国内要闻二"></a></li>
            </ul>
        "#;
        let entries = parse_listing(html).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("国内要闻一".to_string(), "https://tv.cctv.com/a/1.shtml".to_string()));
        assert_eq!(entries[1].0, "国内要闻二");
    }

    #[test]
    fn test_parse_listing_skips_bare_entries() {
        let html = r#"
            <ul id="content">
                <li><a href="https://x/video" title="video"></a></li>
                <li><a href="https://x/a">no title attr</a></li>
                <li><a title="[视频]无链接"></a></li>
                <li><a href="https://x/b" title="[视频]完整条目"></a></li>
            </ul>
        "#;
        let entries = parse_listing(html).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "完整条目");
    }

    #[test]
    fn test_parse_listing_missing_container() {
        let err = parse_listing("<html><body><ul></ul></body></html>").unwrap_err();
        assert!(matches!(err, Error::Scraping(_)));
    }

    #[test]
    fn test_parse_detail_concatenates_paragraphs() {
        let html = r#"
            <div class="content_area">
                <p> 第一段内容 </p>
                <p>第二段内容</p>
                <div><p>嵌套段落</p></div>
            </div>
        "#;
        assert_eq!(parse_detail(html).unwrap(), "第一段内容第二段内容嵌套段落");
    }

    #[test]
    fn test_parse_detail_missing_container() {
        assert!(parse_detail("<div></div>").is_err());
    }
}
