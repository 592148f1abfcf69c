//! HTTP API - one route group per entity under `/api`.
//!
//! Every group follows the same verb contract: `GET` lists (filtered by query
//! parameters) or fetches one record, `POST` creates and answers `201`,
//! `PUT`/`PATCH` merge changes into the record named by `/{id}` or `?id=`,
//! and `DELETE` answers `{"success": true, "id": ...}`. Handlers are thin
//! wrappers around `core`.

mod accounts;
mod calendar;
mod curriculum;
pub mod error;
pub mod extract;
mod institution;
mod logbook;
mod students;
mod teachers;

#[cfg(test)]
mod tests;

use crate::{config::Settings, errors::Error, notify::Mailer};
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Loaded settings
    pub settings: Arc<Settings>,
    /// Outgoing email transport
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Bundles the handler dependencies.
    pub fn new(db: DatabaseConnection, settings: Settings, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            settings: Arc::new(settings),
            mailer,
        }
    }
}

/// Result type of every handler.
pub type ApiResult<T> = Result<T, Error>;

/// `201 Created` with the record as body.
pub fn created<T: Serialize>(record: T) -> Response {
    (StatusCode::CREATED, Json(record)).into_response()
}

/// Body of a successful delete.
pub fn deleted(id: Uuid) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "id": id }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(institution::routes())
        .merge(calendar::routes())
        .merge(curriculum::routes())
        .merge(accounts::routes())
        .merge(students::routes())
        .merge(teachers::routes())
        .merge(logbook::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
