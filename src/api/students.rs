//! Student profiles, verification, search, roster import and enrollments.

use super::{
    ApiResult, AppState, created, deleted,
    extract::{RecordId, ValidJson, ValidQuery},
};
use crate::{
    core::{
        student::{
            self, NewStudent, SearchQuery, StatusDecision, StudentChanges, StudentFilter,
            VerificationOutcome,
        },
        student_subject::{self, EnrollmentChanges, NewEnrollment, StudentSubjectFilter},
        transfer::{self, ImportReport, RosterImport},
    },
    entities::{StudentProfileModel, StudentSubjectModel},
};
use axum::{
    Json, Router,
    extract::State,
    response::Response,
    routing::{get, patch, post},
};
use serde_json::Value;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/students",
            get(list_students)
                .post(register_student)
                .put(update_student)
                .patch(update_student)
                .delete(delete_student),
        )
        .route("/api/students/search", get(search_students))
        .route("/api/students/import", post(import_students))
        .route(
            "/api/students/:id",
            get(get_student)
                .put(update_student)
                .patch(update_student)
                .delete(delete_student),
        )
        .route("/api/students/:id/verification", patch(review_student))
        .route(
            "/api/student-subjects",
            get(list_enrollments)
                .post(enroll_student)
                .put(update_enrollment)
                .patch(update_enrollment)
                .delete(delete_enrollment),
        )
        .route(
            "/api/student-subjects/:id",
            get(get_enrollment)
                .put(update_enrollment)
                .patch(update_enrollment)
                .delete(delete_enrollment),
        )
}

async fn list_students(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<StudentFilter>,
) -> ApiResult<Json<Vec<StudentProfileModel>>> {
    student::list_students(&state.db, &filter).await.map(Json)
}

async fn search_students(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<SearchQuery>,
) -> ApiResult<Json<Vec<StudentProfileModel>>> {
    student::search_students(&state.db, &query).await.map(Json)
}

async fn get_student(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<StudentProfileModel>> {
    student::get_student(&state.db, id).await.map(Json)
}

async fn register_student(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewStudent>,
) -> ApiResult<Response> {
    student::register_student(&state.db, state.mailer.as_ref(), &state.settings, input)
        .await
        .map(created)
}

async fn import_students(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RosterImport>,
) -> ApiResult<Json<ImportReport>> {
    transfer::import_students(&state.db, state.mailer.as_ref(), &state.settings, request)
        .await
        .map(Json)
}

async fn update_student(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<StudentChanges>,
) -> ApiResult<Json<StudentProfileModel>> {
    student::update_student(&state.db, &state.settings, id, changes)
        .await
        .map(Json)
}

async fn review_student(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(decision): ValidJson<StatusDecision>,
) -> ApiResult<Json<VerificationOutcome>> {
    student::review_student(&state.db, state.mailer.as_ref(), &state.settings, id, decision)
        .await
        .map(Json)
}

async fn delete_student(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<Value>> {
    student::delete_student(&state.db, id).await?;
    Ok(deleted(id))
}

async fn list_enrollments(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<StudentSubjectFilter>,
) -> ApiResult<Json<Vec<StudentSubjectModel>>> {
    student_subject::list_student_subjects(&state.db, &filter)
        .await
        .map(Json)
}

async fn get_enrollment(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<StudentSubjectModel>> {
    student_subject::get_student_subject(&state.db, id)
        .await
        .map(Json)
}

async fn enroll_student(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewEnrollment>,
) -> ApiResult<Response> {
    student_subject::enroll_student(&state.db, input)
        .await
        .map(created)
}

async fn update_enrollment(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<EnrollmentChanges>,
) -> ApiResult<Json<StudentSubjectModel>> {
    student_subject::update_student_subject(&state.db, id, changes)
        .await
        .map(Json)
}

async fn delete_enrollment(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<Value>> {
    student_subject::delete_student_subject(&state.db, id).await?;
    Ok(deleted(id))
}
