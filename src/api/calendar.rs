//! Academic years and phases.

use super::{
    ApiResult, AppState, created, deleted,
    extract::{RecordId, ValidJson, ValidQuery},
};
use crate::{
    core::{
        academic_year::{self, AcademicYearChanges, AcademicYearFilter, NewAcademicYear},
        phase::{self, NewPhase, PhaseChanges, PhaseFilter},
    },
    entities::{AcademicYearModel, PhaseModel},
};
use axum::{Json, Router, extract::State, response::Response, routing::get};
use serde_json::Value;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/academic-years",
            get(list_years)
                .post(create_year)
                .put(update_year)
                .patch(update_year)
                .delete(delete_year),
        )
        .route(
            "/api/academic-years/:id",
            get(get_year)
                .put(update_year)
                .patch(update_year)
                .delete(delete_year),
        )
        .route(
            "/api/phases",
            get(list_phases)
                .post(create_phase)
                .put(update_phase)
                .patch(update_phase)
                .delete(delete_phase),
        )
        .route(
            "/api/phases/:id",
            get(get_phase)
                .put(update_phase)
                .patch(update_phase)
                .delete(delete_phase),
        )
}

async fn list_years(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<AcademicYearFilter>,
) -> ApiResult<Json<Vec<AcademicYearModel>>> {
    academic_year::list_academic_years(&state.db, &filter)
        .await
        .map(Json)
}

async fn get_year(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<AcademicYearModel>> {
    academic_year::get_academic_year(&state.db, id).await.map(Json)
}

async fn create_year(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewAcademicYear>,
) -> ApiResult<Response> {
    academic_year::create_academic_year(&state.db, input)
        .await
        .map(created)
}

async fn update_year(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<AcademicYearChanges>,
) -> ApiResult<Json<AcademicYearModel>> {
    academic_year::update_academic_year(&state.db, id, changes)
        .await
        .map(Json)
}

async fn delete_year(State(state): State<AppState>, RecordId(id): RecordId) -> ApiResult<Json<Value>> {
    academic_year::delete_academic_year(&state.db, id).await?;
    Ok(deleted(id))
}

async fn list_phases(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<PhaseFilter>,
) -> ApiResult<Json<Vec<PhaseModel>>> {
    phase::list_phases(&state.db, &filter).await.map(Json)
}

async fn get_phase(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<PhaseModel>> {
    phase::get_phase(&state.db, id).await.map(Json)
}

async fn create_phase(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewPhase>,
) -> ApiResult<Response> {
    phase::create_phase(&state.db, input).await.map(created)
}

async fn update_phase(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<PhaseChanges>,
) -> ApiResult<Json<PhaseModel>> {
    phase::update_phase(&state.db, id, changes).await.map(Json)
}

async fn delete_phase(State(state): State<AppState>, RecordId(id): RecordId) -> ApiResult<Json<Value>> {
    phase::delete_phase(&state.db, id).await?;
    Ok(deleted(id))
}
