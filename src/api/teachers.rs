//! Teacher profiles, search and subject assignments.

use super::{
    ApiResult, AppState, created, deleted,
    extract::{RecordId, ValidJson, ValidQuery},
};
use crate::{
    core::{
        student::SearchQuery,
        teacher::{self, NewTeacher, TeacherChanges, TeacherFilter},
        teacher_subject::{self, SubjectAssignment, TeacherSubjectFilter},
    },
    entities::{TeacherProfileModel, TeacherSubjectModel},
};
use axum::{Json, Router, extract::State, response::Response, routing::get};
use serde_json::Value;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/teachers",
            get(list_teachers)
                .post(register_teacher)
                .put(update_teacher)
                .patch(update_teacher)
                .delete(delete_teacher),
        )
        .route("/api/teachers/search", get(search_teachers))
        .route(
            "/api/teachers/:id",
            get(get_teacher)
                .put(update_teacher)
                .patch(update_teacher)
                .delete(delete_teacher),
        )
        .route(
            "/api/teacher-subjects",
            get(list_assignments)
                .post(assign_subjects)
                .delete(delete_assignment),
        )
        .route(
            "/api/teacher-subjects/:id",
            get(get_assignment).delete(delete_assignment),
        )
}

async fn list_teachers(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<TeacherFilter>,
) -> ApiResult<Json<Vec<TeacherProfileModel>>> {
    teacher::list_teachers(&state.db, &filter).await.map(Json)
}

async fn search_teachers(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<SearchQuery>,
) -> ApiResult<Json<Vec<TeacherProfileModel>>> {
    teacher::search_teachers(&state.db, &query).await.map(Json)
}

async fn get_teacher(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<TeacherProfileModel>> {
    teacher::get_teacher(&state.db, id).await.map(Json)
}

async fn register_teacher(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewTeacher>,
) -> ApiResult<Response> {
    teacher::register_teacher(&state.db, state.mailer.as_ref(), &state.settings, input)
        .await
        .map(created)
}

async fn update_teacher(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<TeacherChanges>,
) -> ApiResult<Json<TeacherProfileModel>> {
    teacher::update_teacher(&state.db, &state.settings, id, changes)
        .await
        .map(Json)
}

async fn delete_teacher(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<Value>> {
    teacher::delete_teacher(&state.db, id).await?;
    Ok(deleted(id))
}

async fn list_assignments(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<TeacherSubjectFilter>,
) -> ApiResult<Json<Vec<TeacherSubjectModel>>> {
    teacher_subject::list_teacher_subjects(&state.db, &filter)
        .await
        .map(Json)
}

async fn get_assignment(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<TeacherSubjectModel>> {
    teacher_subject::get_teacher_subject(&state.db, id)
        .await
        .map(Json)
}

async fn assign_subjects(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<SubjectAssignment>,
) -> ApiResult<Response> {
    teacher_subject::assign_subjects(&state.db, input)
        .await
        .map(created)
}

async fn delete_assignment(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<Value>> {
    teacher_subject::delete_teacher_subject(&state.db, id).await?;
    Ok(deleted(id))
}
