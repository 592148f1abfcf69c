//! User accounts, password changes and the post-login landing.

use super::{
    ApiResult, AppState, created, deleted,
    extract::{RecordId, ValidJson, ValidQuery},
};
use crate::{
    core::{
        landing::{self, Landing, LandingQuery},
        user::{self, NewUser, PasswordChange, UserChanges, UserFilter},
    },
    entities::UserModel,
};
use axum::{
    Json, Router,
    extract::State,
    response::Response,
    routing::{get, patch},
};
use serde_json::Value;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users",
            get(list_users)
                .post(create_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .route(
            "/api/users/:id",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .route("/api/users/:id/password", patch(change_password))
        .route("/api/session/landing", get(resolve_landing))
}

async fn list_users(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<UserFilter>,
) -> ApiResult<Json<Vec<UserModel>>> {
    user::list_users(&state.db, &filter).await.map(Json)
}

async fn get_user(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Json<UserModel>> {
    user::get_user(&state.db, id).await.map(Json)
}

async fn create_user(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<NewUser>,
) -> ApiResult<Response> {
    user::register_user(&state.db, state.mailer.as_ref(), &state.settings, input)
        .await
        .map(created)
}

async fn update_user(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(changes): ValidJson<UserChanges>,
) -> ApiResult<Json<UserModel>> {
    user::update_user(&state.db, id, changes).await.map(Json)
}

async fn change_password(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidJson(change): ValidJson<PasswordChange>,
) -> ApiResult<Json<UserModel>> {
    user::change_password(&state.db, id, change).await.map(Json)
}

async fn delete_user(State(state): State<AppState>, RecordId(id): RecordId) -> ApiResult<Json<Value>> {
    user::delete_user(&state.db, id).await?;
    Ok(deleted(id))
}

async fn resolve_landing(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<LandingQuery>,
) -> ApiResult<Json<Landing>> {
    landing::resolve_landing(&state.db, &query).await.map(Json)
}
