//! HTTP API: router, handlers and request/response mapping over `SyncService`.

pub mod app;
pub mod middleware;
