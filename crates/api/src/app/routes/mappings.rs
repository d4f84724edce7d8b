use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use stockbridge_core::StorefrontId;
use stockbridge_infra::SyncService;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_mappings).put(save_mappings).post(map_product))
        .route("/:storefront_id", get(get_mapping).delete(unmap))
        .route("/:storefront_id/sync", post(sync_mapping))
}

pub async fn list_mappings(Extension(services): Extension<Arc<SyncService>>) -> axum::response::Response {
    match services.list_mappings().await {
        Ok(mappings) => Json(mappings).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}

/// Batch replace; all-or-nothing.
pub async fn save_mappings(
    Extension(services): Extension<Arc<SyncService>>,
    Json(body): Json<dto::SaveMappingsRequest>,
) -> axum::response::Response {
    let mappings = match body
        .mappings
        .into_iter()
        .map(dto::MappingRequest::into_mapping)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(m) => m,
        Err(e) => return errors::sync_error_to_response(e),
    };

    match services.save_mappings(mappings).await {
        Ok(saved) => Json(dto::SavedMappingsResponse { saved }).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}

/// Link one product and sync it; responds with the resulting log entry.
pub async fn map_product(
    Extension(services): Extension<Arc<SyncService>>,
    Json(body): Json<dto::MappingRequest>,
) -> axum::response::Response {
    let mapping = match body.into_mapping() {
        Ok(m) => m,
        Err(e) => return errors::sync_error_to_response(e),
    };

    match services.map_product(mapping).await {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}

pub async fn get_mapping(
    Extension(services): Extension<Arc<SyncService>>,
    Path(storefront_id): Path<String>,
) -> axum::response::Response {
    let id: StorefrontId = match errors::parse_param(&storefront_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.get_mapping(&id).await {
        Ok(mapping) => Json(mapping).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}

/// Idempotent: unmapping an absent id answers 200 with `removed: false`.
pub async fn unmap(
    Extension(services): Extension<Arc<SyncService>>,
    Path(storefront_id): Path<String>,
) -> axum::response::Response {
    let id: StorefrontId = match errors::parse_param(&storefront_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.unmap(&id).await {
        Ok(removed) => Json(dto::UnmapResponse {
            storefront_id: id,
            removed,
        })
        .into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}

/// Manual sync / retry. Upstream failures still answer 200 with an error entry.
pub async fn sync_mapping(
    Extension(services): Extension<Arc<SyncService>>,
    Path(storefront_id): Path<String>,
) -> axum::response::Response {
    let id: StorefrontId = match errors::parse_param(&storefront_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.sync_mapping(&id).await {
        Ok(entry) => Json(entry).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}

pub async fn sync_all(Extension(services): Extension<Arc<SyncService>>) -> axum::response::Response {
    match services.sync_all().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}
