use axum::extract::{Path, State};
use axum::Json;
use photoshare_shared::{PhotoId, UserId};
use photoshare_store::UserSummary;
use serde::{Deserialize, Serialize};

use super::{AppState, JsonBody};
use crate::error::ServerError;
use crate::services::aggregation::{self, PhotoView};
use crate::services::mutations::{FavoriteChange, Registration};
use crate::session::CurrentUser;

#[derive(Serialize)]
pub struct RegisterResponse {
    login_name: String,
}

#[derive(Serialize)]
pub struct UserDetail {
    id: UserId,
    first_name: String,
    last_name: String,
    location: String,
    description: String,
    occupation: String,
}

#[derive(Deserialize)]
pub struct FavoriteRequest {
    #[serde(alias = "photoId")]
    photo_id: PhotoId,
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<Registration>,
) -> Result<Json<RegisterResponse>, ServerError> {
    let outcome = state.mutations.register(form).await?;
    Ok(Json(RegisterResponse {
        login_name: outcome.user().login_name.clone(),
    }))
}

pub async fn list(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<UserSummary>>, ServerError> {
    let users = state.db.call(|db| Ok(db.list_user_summaries()?)).await?;
    if users.is_empty() {
        return Err(ServerError::Internal("Missing users".to_string()));
    }
    Ok(Json(users))
}

pub async fn detail(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<UserDetail>, ServerError> {
    let id = UserId::parse(&id)?;
    let user = state
        .db
        .call(move |db| {
            db.find_user(id)?
                .ok_or_else(|| ServerError::BadRequest("Not found".to_string()))
        })
        .await?;

    Ok(Json(UserDetail {
        id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        location: user.location,
        description: user.description,
        occupation: user.occupation,
    }))
}

pub async fn delete_account(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let id = UserId::parse(&id)
        .map_err(|_| ServerError::NotFound("User not found or unauthorized.".to_string()))?;
    state.mutations.delete_account(id, current.id).await?;
    Ok(Json(serde_json::json!({
        "message": "User and associated data deleted successfully."
    })))
}

pub async fn favorites(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<PhotoView>>, ServerError> {
    let viewer = current.id;
    let photos = state
        .db
        .call(move |db| aggregation::favorite_photos(db, viewer))
        .await?;
    Ok(Json(photos))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonBody(req): JsonBody<FavoriteRequest>,
) -> Result<Json<Vec<PhotoId>>, ServerError> {
    let favorites = state
        .mutations
        .toggle_favorite(current.id, req.photo_id, FavoriteChange::Add)
        .await?;
    Ok(Json(favorites))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonBody(req): JsonBody<FavoriteRequest>,
) -> Result<Json<Vec<PhotoId>>, ServerError> {
    let favorites = state
        .mutations
        .toggle_favorite(current.id, req.photo_id, FavoriteChange::Remove)
        .await?;
    Ok(Json(favorites))
}
