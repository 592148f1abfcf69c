//! Subjects and their syllabus modules.

use super::{
    ApiResult, AppState, created, deleted,
    extract::{RecordId, ValidJson, ValidQuery},
};
use crate::{
    core::{
        module::{self, ModuleChanges, ModuleFilter, NewModule},
        subject::{self, NewSubject, SubjectChanges, SubjectFilter},
    },
    entities::{ModuleModel, SubjectModel},
};
use axum::{Json, Router, extract::State, response::Response, routing::get};
use serde_json::Value;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/subjects",
            get(list_subjects)
                .post(create_subject)
                .put(update_subject)
                .patch(update_subject)
                .delete(delete_subject),
        )
        .route(
            "/api/subjects/:id",
            get(get_subject)
                .put(update_subject)
                .patch(update_subject)
                .delete(delete_subject),
        )
        .route(
            "/api/modules",
            get(list_modules)
                .post(create_module)
                .put(update_module)
                .patch(update_module)
                .delete(delete_module),
        )
        .route(
            "/api/modules/:id",
            get(get_module)
                .put(update_module)
                .patch(update_module)
                .delete(delete_module),
        )
}

async fn list_subjects(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<SubjectFilter>,
) -> ApiResult<Json<Vec<SubjectModel>>> {
    subject::list_subjects(&state.db, &filter).await.map(Json)
}

async fn get_subject(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<SubjectModel>> {
    subject::get_subject(&state.db, id).await.map(Json)
}

async fn create_subject(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewSubject>,
) -> ApiResult<Response> {
    subject::create_subject(&state.db, input).await.map(created)
}

async fn update_subject(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<SubjectChanges>,
) -> ApiResult<Json<SubjectModel>> {
    subject::update_subject(&state.db, id, changes).await.map(Json)
}

async fn delete_subject(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<Value>> {
    subject::delete_subject(&state.db, id).await?;
    Ok(deleted(id))
}

async fn list_modules(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<ModuleFilter>,
) -> ApiResult<Json<Vec<ModuleModel>>> {
    module::list_modules(&state.db, &filter).await.map(Json)
}

async fn get_module(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<ModuleModel>> {
    module::get_module(&state.db, id).await.map(Json)
}

async fn create_module(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewModule>,
) -> ApiResult<Response> {
    module::create_module(&state.db, input).await.map(created)
}

async fn update_module(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<ModuleChanges>,
) -> ApiResult<Json<ModuleModel>> {
    module::update_module(&state.db, id, changes).await.map(Json)
}

async fn delete_module(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<Value>> {
    module::delete_module(&state.db, id).await?;
    Ok(deleted(id))
}
