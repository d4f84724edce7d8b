use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use stockbridge_infra::SyncService;

use crate::app::dto;

pub async fn status(Extension(services): Extension<Arc<SyncService>>) -> axum::response::Response {
    Json(services.scheduler_status().await).into_response()
}

/// Re-arm with a new interval; 0 disarms. The persisted interval is untouched.
pub async fn arm(
    Extension(services): Extension<Arc<SyncService>>,
    Json(body): Json<dto::SchedulerRequest>,
) -> axum::response::Response {
    Json(services.arm_scheduler(body.interval_minutes).await).into_response()
}

pub async fn disarm(Extension(services): Extension<Arc<SyncService>>) -> axum::response::Response {
    Json(services.disarm_scheduler().await).into_response()
}
