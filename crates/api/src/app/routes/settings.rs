use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use stockbridge_infra::SyncService;

use crate::app::{dto, errors};

/// Credentials are masked in the response.
pub async fn get_settings(Extension(services): Extension<Arc<SyncService>>) -> axum::response::Response {
    match services.settings().await {
        Ok(settings) => Json(settings.redacted()).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}

pub async fn update_settings(
    Extension(services): Extension<Arc<SyncService>>,
    Json(body): Json<dto::SettingsRequest>,
) -> axum::response::Response {
    let current = match services.settings().await {
        Ok(s) => s,
        Err(e) => return errors::sync_error_to_response(e),
    };

    let updated = body.apply(current);
    match services.update_settings(updated.clone()).await {
        Ok(()) => Json(updated.redacted()).into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}
