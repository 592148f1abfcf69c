//! Log-book templates and entries, with CSV export and printable reports.

use super::{
    ApiResult, AppState, created, deleted,
    extract::{RecordId, ValidJson, ValidQuery},
};
use crate::{
    core::{
        logbook_entry::{self, EntryChanges, EntryFilter, NewEntry},
        logbook_template::{self, NewTemplate, TemplateChanges, TemplateFilter},
        transfer,
    },
    entities::{LogBookEntryModel, LogBookTemplateModel},
    errors::Error,
};
use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/logbook-templates",
            get(list_templates)
                .post(create_template)
                .put(update_template)
                .patch(update_template)
                .delete(delete_template),
        )
        .route(
            "/api/logbook-templates/:id",
            get(get_template)
                .put(update_template)
                .patch(update_template)
                .delete(delete_template),
        )
        .route(
            "/api/logbook-entries",
            get(list_entries)
                .post(create_entry)
                .put(update_entry)
                .patch(update_entry)
                .delete(delete_entry),
        )
        .route("/api/logbook-entries/export", get(export_entries))
        .route("/api/logbook-entries/print", get(print_entries))
        .route(
            "/api/logbook-entries/:id",
            get(get_entry)
                .put(update_entry)
                .patch(update_entry)
                .delete(delete_entry),
        )
}

async fn list_templates(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<TemplateFilter>,
) -> ApiResult<Json<Vec<LogBookTemplateModel>>> {
    logbook_template::list_templates(&state.db, &filter)
        .await
        .map(Json)
}

async fn get_template(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<LogBookTemplateModel>> {
    logbook_template::get_template(&state.db, id).await.map(Json)
}

async fn create_template(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewTemplate>,
) -> ApiResult<Response> {
    logbook_template::create_template(&state.db, input)
        .await
        .map(created)
}

async fn update_template(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<TemplateChanges>,
) -> ApiResult<Json<LogBookTemplateModel>> {
    logbook_template::update_template(&state.db, id, changes)
        .await
        .map(Json)
}

async fn delete_template(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<Value>> {
    logbook_template::delete_template(&state.db, id).await?;
    Ok(deleted(id))
}

async fn list_entries(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<EntryFilter>,
) -> ApiResult<Json<Vec<LogBookEntryModel>>> {
    logbook_entry::list_entries(&state.db, &filter).await.map(Json)
}

async fn get_entry(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<LogBookEntryModel>> {
    logbook_entry::get_entry(&state.db, id).await.map(Json)
}

async fn create_entry(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewEntry>,
) -> ApiResult<Response> {
    logbook_entry::create_entry(&state.db, input)
        .await
        .map(created)
}

async fn update_entry(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<EntryChanges>,
) -> ApiResult<Json<LogBookEntryModel>> {
    logbook_entry::update_entry(&state.db, id, changes)
        .await
        .map(Json)
}

async fn delete_entry(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<Value>> {
    logbook_entry::delete_entry(&state.db, id).await?;
    Ok(deleted(id))
}

async fn export_entries(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<EntryFilter>,
) -> ApiResult<Response> {
    let csv = transfer::export_entries_csv(&state.db, &filter).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"logbook-entries.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

async fn print_entries(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<EntryFilter>,
) -> ApiResult<Html<String>> {
    let Some(student_id) = filter.student_id else {
        return Err(Error::Validation {
            message: "Missing student id".to_string(),
            details: json!({ "studentId": "is required" }),
        });
    };
    transfer::render_print_report(&state.db, student_id)
        .await
        .map(Html)
}
