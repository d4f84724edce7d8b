use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    response::IntoResponse,
};

use stockbridge_core::StorefrontId;
use stockbridge_infra::SyncService;

use crate::app::{dto, errors};

pub async fn list_logs(
    Extension(services): Extension<Arc<SyncService>>,
    Query(query): Query<dto::LogsQuery>,
) -> axum::response::Response {
    let filter = match query.filter() {
        Ok(f) => f,
        Err(e) => return errors::sync_error_to_response(e),
    };

    match services.list_logs(&filter, query.pagination()).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}

pub async fn clear_logs(
    Extension(services): Extension<Arc<SyncService>>,
    Path(storefront_id): Path<String>,
) -> axum::response::Response {
    let id: StorefrontId = match errors::parse_param(&storefront_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.clear_logs(&id).await {
        Ok(deleted) => Json(dto::ClearedLogsResponse {
            storefront_id: id,
            deleted,
        })
        .into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}
