use dn_crawlers::Fetcher;

pub struct AppState {
    pub fetcher: Fetcher,
}
