//! Colleges, courses and branches.

use super::{
    ApiResult, AppState, created, deleted,
    extract::{RecordId, ValidJson, ValidQuery},
};
use crate::{
    core::{
        branch::{self, BranchChanges, BranchFilter, NewBranch},
        college::{self, CollegeChanges, NewCollege},
        course::{self, CourseChanges, CourseFilter, NewCourse},
    },
    entities::{BranchModel, CollegeModel, CourseModel},
};
use axum::{Json, Router, extract::State, response::Response, routing::get};
use serde_json::Value;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/colleges",
            get(list_colleges)
                .post(create_college)
                .put(update_college)
                .patch(update_college)
                .delete(delete_college),
        )
        .route(
            "/api/colleges/:id",
            get(get_college)
                .put(update_college)
                .patch(update_college)
                .delete(delete_college),
        )
        .route(
            "/api/courses",
            get(list_courses)
                .post(create_course)
                .put(update_course)
                .patch(update_course)
                .delete(delete_course),
        )
        .route(
            "/api/courses/:id",
            get(get_course)
                .put(update_course)
                .patch(update_course)
                .delete(delete_course),
        )
        .route(
            "/api/branches",
            get(list_branches)
                .post(create_branch)
                .put(update_branch)
                .patch(update_branch)
                .delete(delete_branch),
        )
        .route(
            "/api/branches/:id",
            get(get_branch)
                .put(update_branch)
                .patch(update_branch)
                .delete(delete_branch),
        )
}

async fn list_colleges(State(state): State<AppState>) -> ApiResult<Json<Vec<CollegeModel>>> {
    college::list_colleges(&state.db).await.map(Json)
}

async fn get_college(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<CollegeModel>> {
    college::get_college(&state.db, id).await.map(Json)
}

async fn create_college(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewCollege>,
) -> ApiResult<Response> {
    college::create_college(&state.db, input).await.map(created)
}

async fn update_college(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<CollegeChanges>,
) -> ApiResult<Json<CollegeModel>> {
    college::update_college(&state.db, id, changes).await.map(Json)
}

async fn delete_college(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<Value>> {
    college::delete_college(&state.db, id).await?;
    Ok(deleted(id))
}

async fn list_courses(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<CourseFilter>,
) -> ApiResult<Json<Vec<CourseModel>>> {
    course::list_courses(&state.db, &filter).await.map(Json)
}

async fn get_course(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<CourseModel>> {
    course::get_course(&state.db, id).await.map(Json)
}

async fn create_course(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewCourse>,
) -> ApiResult<Response> {
    course::create_course(&state.db, input).await.map(created)
}

async fn update_course(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<CourseChanges>,
) -> ApiResult<Json<CourseModel>> {
    course::update_course(&state.db, id, changes).await.map(Json)
}

async fn delete_course(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<Value>> {
    course::delete_course(&state.db, id).await?;
    Ok(deleted(id))
}

async fn list_branches(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<BranchFilter>,
) -> ApiResult<Json<Vec<BranchModel>>> {
    branch::list_branches(&state.db, &filter).await.map(Json)
}

async fn get_branch(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<BranchModel>> {
    branch::get_branch(&state.db, id).await.map(Json)
}

async fn create_branch(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewBranch>,
) -> ApiResult<Response> {
    branch::create_branch(&state.db, input).await.map(created)
}

async fn update_branch(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<BranchChanges>,
) -> ApiResult<Json<BranchModel>> {
    branch::update_branch(&state.db, id, changes).await.map(Json)
}

async fn delete_branch(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<Value>> {
    branch::delete_branch(&state.db, id).await?;
    Ok(deleted(id))
}
