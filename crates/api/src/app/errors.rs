use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockbridge_core::SyncError;

pub fn sync_error_to_response(err: SyncError) -> axum::response::Response {
    match err {
        SyncError::MappingNotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "mapping_not_found",
            format!("no mapping for storefront product {id}"),
        ),
        SyncError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        SyncError::ConfigurationMissing(msg) => {
            json_error(StatusCode::PRECONDITION_FAILED, "configuration_missing", msg)
        }
        e @ (SyncError::WarehouseUnavailable(_) | SyncError::WarehouseNotFound(_)) => {
            json_error(StatusCode::BAD_GATEWAY, "warehouse_error", e.to_string())
        }
        e @ SyncError::StorefrontUnavailable(_) => {
            json_error(StatusCode::BAD_GATEWAY, "storefront_error", e.to_string())
        }
        SyncError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path/query value with the domain's `FromStr`, as a 400 on failure.
pub fn parse_param<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = SyncError>,
{
    raw.parse::<T>().map_err(sync_error_to_response)
}
