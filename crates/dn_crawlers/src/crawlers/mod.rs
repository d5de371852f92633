use async_trait::async_trait;
use dn_core::NewsResponse;
use scraper::ElementRef;
use url::Url;

pub mod aibase;
#[cfg(feature = "headless")]
pub mod browser;
pub mod cctv;
pub mod commerce;
pub mod transport;

use crate::fetch::Fetcher;
use aibase::AiNewsCrawler;
use cctv::CctvNewsCrawler;
use commerce::CommerceNewsCrawler;
use transport::TransportNewsCrawler;

/// Composite identity of one listed entry: the title together with the
/// inline publish date shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewsKey {
    pub title: String,
    pub date: String,
}

impl NewsKey {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
        }
    }
}

/// Insertion-ordered map from [`NewsKey`] to an absolute detail-page URL.
/// Re-inserting an existing key replaces its URL.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    entries: Vec<(NewsKey, String)>,
}

impl Listing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: NewsKey, url: String) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = url;
        } else {
            self.entries.push((key, url));
        }
    }

    /// Appends another listing; on key collision the other listing wins.
    pub fn merge(&mut self, other: Listing) {
        for (key, url) in other.entries {
            self.insert(key, url);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NewsKey, String)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
pub trait Crawler: Send + Sync {
    /// Tag identifying the source site on every emitted record
    fn origin(&self) -> &str;

    /// The listing page this crawler starts from
    fn source_url(&self) -> &Url;

    /// Runs the full listing -> freshness filter -> detail pipeline and
    /// wraps the outcome in the uniform envelope. Failures resolve into the
    /// envelope's status fields, never into a panic.
    async fn get_news(&self) -> NewsResponse;

    /// CLI shorthand names for this crawler
    fn cli_names(&self) -> Vec<&str> {
        vec![]
    }
}

/// Enum that holds all possible crawler types
pub enum CrawlerKind {
    AiNews(AiNewsCrawler),
    Cctv(CctvNewsCrawler),
    Transport(TransportNewsCrawler),
    Commerce(CommerceNewsCrawler),
}

impl CrawlerKind {
    /// Builds the crawler matching a CLI shorthand, pointed at its default
    /// source URL.
    pub fn from_name(name: &str, fetcher: Fetcher) -> dn_core::Result<Self> {
        match name.to_lowercase().as_str() {
            "ai" | "aibase" => {
                Ok(CrawlerKind::AiNews(AiNewsCrawler::new(AiNewsCrawler::DEFAULT_URL, fetcher)?))
            }
            "cctv" | "xwlb" => {
                Ok(CrawlerKind::Cctv(CctvNewsCrawler::new(CctvNewsCrawler::DEFAULT_URL, fetcher)?))
            }
            "transport" | "mot" => Ok(CrawlerKind::Transport(TransportNewsCrawler::new(
                TransportNewsCrawler::DEFAULT_URL,
                fetcher,
            )?)),
            "commerce" | "mofcom" => Ok(CrawlerKind::Commerce(CommerceNewsCrawler::new(
                CommerceNewsCrawler::DEFAULT_URL,
                fetcher,
            )?)),
            other => Err(dn_core::Error::Scraping(format!("Crawler not found: {}", other))),
        }
    }

    pub fn origin(&self) -> &str {
        match self {
            CrawlerKind::AiNews(c) => c.origin(),
            CrawlerKind::Cctv(c) => c.origin(),
            CrawlerKind::Transport(c) => c.origin(),
            CrawlerKind::Commerce(c) => c.origin(),
        }
    }

    pub async fn get_news(&self) -> NewsResponse {
        match self {
            CrawlerKind::AiNews(c) => c.get_news().await,
            CrawlerKind::Cctv(c) => c.get_news().await,
            CrawlerKind::Transport(c) => c.get_news().await,
            CrawlerKind::Commerce(c) => c.get_news().await,
        }
    }

    pub fn cli_names(&self) -> Vec<&str> {
        match self {
            CrawlerKind::AiNews(c) => c.cli_names(),
            CrawlerKind::Cctv(c) => c.cli_names(),
            CrawlerKind::Transport(c) => c.cli_names(),
            CrawlerKind::Commerce(c) => c.cli_names(),
        }
    }
}

/// Common extraction helpers shared by the crawlers
pub(crate) mod extract {
    use super::*;

    /// Text content of an element with every text node stripped, concatenated
    /// without separators.
    pub fn text_of(el: &ElementRef) -> String {
        el.text().map(str::trim).collect()
    }

    /// First direct child that is an element (skips text and comment nodes).
    pub fn first_child_element<'a>(el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
        el.children().filter_map(ElementRef::wrap).next()
    }

    /// First direct child element with the given tag name.
    pub fn direct_child_named<'a>(el: &ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
        el.children()
            .filter_map(ElementRef::wrap)
            .find(|child| child.value().name() == name)
    }
}
