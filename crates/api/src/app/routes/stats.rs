use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    response::IntoResponse,
    routing::{get, post},
};

use stockbridge_core::StorefrontId;
use stockbridge_infra::SyncService;
use stockbridge_infra::service::DEFAULT_SUMMARY_DAYS;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/daily", get(daily_summary))
        .route("/mappings", post(mapping_stats))
        .route("/storefront", get(storefront_mapping_stats))
}

pub async fn daily_summary(
    Extension(services): Extension<Arc<SyncService>>,
    Query(query): Query<dto::DaysQuery>,
) -> axum::response::Response {
    let days = query.days.unwrap_or(DEFAULT_SUMMARY_DAYS);
    match services.daily_summary(days).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}

/// Counts over the posted product ids.
pub async fn mapping_stats(
    Extension(services): Extension<Arc<SyncService>>,
    Json(body): Json<dto::MappingStatsRequest>,
) -> axum::response::Response {
    let products: Vec<StorefrontId> = match body
        .products
        .iter()
        .map(|raw| errors::parse_param(raw))
        .collect::<Result<_, _>>()
    {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.mapping_stats(&products).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}

pub async fn storefront_mapping_stats(
    Extension(services): Extension<Arc<SyncService>>,
) -> axum::response::Response {
    match services.storefront_mapping_stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}
