use axum::{
    Router,
    routing::{delete, get, post},
};

pub mod catalog;
pub mod logs;
pub mod mappings;
pub mod scheduler;
pub mod settings;
pub mod stats;
pub mod system;

/// Router for every sync endpoint except `/health`.
pub fn router() -> Router {
    Router::new()
        .nest("/mappings", mappings::router())
        .route("/sync", post(mappings::sync_all))
        .route("/logs", get(logs::list_logs))
        .route("/logs/:storefront_id", delete(logs::clear_logs))
        .nest("/stats", stats::router())
        .route("/products", get(catalog::list_products))
        .route("/warehouse/search", post(catalog::search_warehouse))
        .route("/status", get(catalog::api_status))
        .route(
            "/scheduler",
            get(scheduler::status)
                .put(scheduler::arm)
                .delete(scheduler::disarm),
        )
        .route("/settings", get(settings::get_settings).put(settings::update_settings))
}
