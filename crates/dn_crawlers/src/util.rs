use chrono::{Days, Local, NaiveDate};
use dn_core::{Error, Result};
use url::Url;

/// The `day_offset` most recent calendar dates ending today, newest first,
/// formatted `YYYY-MM-DD`. Used as the freshness-window membership set.
pub fn recent_days(day_offset: usize) -> Vec<String> {
    recent_days_from(Local::now().date_naive(), day_offset)
}

pub fn recent_days_from(today: NaiveDate, day_offset: usize) -> Vec<String> {
    (0..day_offset as u64)
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|day| day.format("%Y-%m-%d").to_string())
        .collect()
}

/// Resolves a possibly-relative child URL against a base (urljoin semantics).
pub fn join_urls(base: &str, child: &str) -> Result<String> {
    let base = Url::parse(base).map_err(|e| Error::InvalidUrl(format!("{}: {}", base, e)))?;
    let joined = base
        .join(child)
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", child, e)))?;
    Ok(joined.to_string())
}

/// Scheme + authority of a URL with path and query dropped,
/// e.g. `https://news.aibase.com`.
pub fn base_url(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Host component of a URL, when there is one.
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(|h| h.to_string())
}
