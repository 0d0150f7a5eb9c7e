//! Profile endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use followers_common::AppResult;
use followers_core::ProfileView;
use serde::Serialize;

use crate::{extractors::MaybeAuthUser, middleware::AppState};

/// Profile response.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub is_owner: bool,
    pub following_id: Option<i64>,
    pub followers_count: u64,
    pub following_count: u64,
}

impl From<ProfileView> for ProfileResponse {
    fn from(view: ProfileView) -> Self {
        Self {
            id: view.profile.id,
            owner: view.owner,
            name: view.profile.name,
            content: view.profile.content,
            created_at: view.profile.created_at.to_rfc3339(),
            updated_at: view.profile.updated_at.map(|t| t.to_rfc3339()),
            is_owner: view.is_owner,
            following_id: view.following_id,
            followers_count: view.followers_count,
            following_count: view.following_count,
        }
    }
}

/// List profiles.
async fn list(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProfileResponse>>> {
    let views = state.profile_service.list(caller.user()).await?;
    Ok(Json(views.into_iter().map(ProfileResponse::from).collect()))
}

/// Get a profile.
async fn get_profile(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ProfileResponse>> {
    let view = state.profile_service.get(id, caller.user()).await?;
    Ok(Json(view.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles/", get(list))
        .route("/profiles/{id}/", get(get_profile))
}
