use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use dn_core::Error;
use dn_crawlers::crawlers::aibase::AiNewsCrawler;
use dn_crawlers::crawlers::cctv::CctvNewsCrawler;
use dn_crawlers::crawlers::commerce::CommerceNewsCrawler;
use dn_crawlers::crawlers::transport::TransportNewsCrawler;
use dn_crawlers::Crawler;

use crate::AppState;

/// Same-day AI news digest
pub async fn get_daily_ai_news(State(state): State<Arc<AppState>>) -> Response {
    match AiNewsCrawler::new(AiNewsCrawler::DEFAULT_URL, state.fetcher.clone()) {
        Ok(crawler) => Json(crawler.get_news().await).into_response(),
        Err(e) => url_error(&e),
    }
}

/// Yesterday's evening-news program
pub async fn get_daily_cctv_news(State(state): State<Arc<AppState>>) -> Response {
    match CctvNewsCrawler::new(CctvNewsCrawler::DEFAULT_URL, state.fetcher.clone()) {
        Ok(crawler) => Json(crawler.get_news().await).into_response(),
        Err(e) => url_error(&e),
    }
}

/// Transport-ministry headlines within the two-day window
pub async fn get_transport_gov_news(State(state): State<Arc<AppState>>) -> Response {
    match TransportNewsCrawler::new(TransportNewsCrawler::DEFAULT_URL, state.fetcher.clone()) {
        Ok(crawler) => Json(crawler.get_news().await).into_response(),
        Err(e) => url_error(&e),
    }
}

/// Commerce-ministry leadership activity within the lookback window
pub async fn get_commerce_gov_news(State(state): State<Arc<AppState>>) -> Response {
    match CommerceNewsCrawler::new(CommerceNewsCrawler::DEFAULT_URL, state.fetcher.clone()) {
        Ok(crawler) => Json(crawler.get_news().await).into_response(),
        Err(e) => url_error(&e),
    }
}

/// A crawler whose source URL fails validation is the one case that crosses
/// the HTTP boundary as a transport-level error.
fn url_error(e: &Error) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("Website url error: {}", e) })),
    )
        .into_response()
}
