pub mod crawlers;
pub mod fetch;
pub mod util;

pub use crawlers::{Crawler, CrawlerKind, Listing, NewsKey};
pub use fetch::{FetchConfig, Fetcher};

pub mod prelude {
    pub use crate::crawlers::Crawler;
    pub use crate::fetch::Fetcher;
    pub use dn_core::{Error, News, NewsResponse, Result};
}
