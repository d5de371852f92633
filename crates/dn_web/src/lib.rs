use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/get_daily_ai_news", get(handlers::get_daily_ai_news))
        .route("/api/get_daily_cctv_news", get(handlers::get_daily_cctv_news))
        .route("/api/get_transport_gov_news", get(handlers::get_transport_gov_news))
        .route("/api/get_commerce_gov_news", get(handlers::get_commerce_gov_news))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::AppState;
    pub use dn_core::{News, NewsResponse, Result};
}
