use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    response::IntoResponse,
};

use stockbridge_infra::SyncService;

use crate::app::{dto, errors};

pub async fn search_warehouse(
    Extension(services): Extension<Arc<SyncService>>,
    Json(body): Json<dto::SearchRequest>,
) -> axum::response::Response {
    match services.search_warehouse(&body.query).await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}

/// Always 200; each side reports `online` or `offline`.
pub async fn api_status(Extension(services): Extension<Arc<SyncService>>) -> axum::response::Response {
    Json(services.api_status().await).into_response()
}

/// Storefront products, optionally only the mapped or unmapped ones.
pub async fn list_products(
    Extension(services): Extension<Arc<SyncService>>,
    Query(query): Query<dto::ProductsQuery>,
) -> axum::response::Response {
    let filter = match query.filter() {
        Ok(f) => f,
        Err(e) => return errors::sync_error_to_response(e),
    };

    match services
        .list_storefront_products(filter, query.pagination())
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}
