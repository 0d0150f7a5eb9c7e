//! Follow edge endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use followers_common::{AppError, AppResult};
use followers_core::FollowEdgeView;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::{AuthUser, MaybeAuthUser, ValidJson},
    middleware::AppState,
    response::{Created, no_content},
};

/// Create follow edge request.
///
/// The owner is always the authenticated caller, so only the target is read.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFollowEdgeRequest {
    #[validate(length(min = 1, max = 128))]
    pub followed: String,
}

/// Follow edge response.
#[derive(Debug, Serialize)]
pub struct FollowEdgeResponse {
    pub id: i64,
    pub owner: String,
    pub followed: String,
    pub created_at: String,
}

impl From<FollowEdgeView> for FollowEdgeResponse {
    fn from(view: FollowEdgeView) -> Self {
        Self {
            id: view.edge.id,
            owner: view.owner,
            followed: view.followed,
            created_at: view.edge.created_at.to_rfc3339(),
        }
    }
}

/// A `/followers/{key}/` segment: integers address edges, anything else a user.
enum FollowersKey {
    Edge(i64),
    Owner(String),
}

impl From<String> for FollowersKey {
    fn from(key: String) -> Self {
        match key.parse::<i64>() {
            Ok(id) => Self::Edge(id),
            Err(_) => Self::Owner(key),
        }
    }
}

fn into_responses(views: Vec<FollowEdgeView>) -> Vec<FollowEdgeResponse> {
    views.into_iter().map(FollowEdgeResponse::from).collect()
}

/// List all follow edges.
async fn list_all(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<FollowEdgeResponse>>> {
    let views = state.follow_edge_service.list_all(caller.user()).await?;
    Ok(Json(into_responses(views)))
}

/// Follow a user.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateFollowEdgeRequest>,
) -> AppResult<Created<FollowEdgeResponse>> {
    let view = state
        .follow_edge_service
        .create(Some(&user), &req.followed)
        .await?;
    Ok(Created(view.into()))
}

/// Retrieve an edge by id, or list the edges owned by a username.
async fn retrieve_or_list_by_owner(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Response> {
    match FollowersKey::from(key) {
        FollowersKey::Edge(id) => {
            let view = state
                .follow_edge_service
                .retrieve(id, caller.user())
                .await?;
            Ok(Json(FollowEdgeResponse::from(view)).into_response())
        }
        FollowersKey::Owner(owner) => {
            let views = state.follow_edge_service.list_by_owner(&owner).await?;
            Ok(Json(into_responses(views)).into_response())
        }
    }
}

/// Follow a user from an owner-scoped path.
///
/// The path owner is ignored; the caller is the owner.
async fn create_for_owner(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Result<ValidJson<CreateFollowEdgeRequest>, AppError>,
) -> AppResult<Created<FollowEdgeResponse>> {
    if let FollowersKey::Edge(id) = FollowersKey::from(key) {
        return Err(AppError::MethodNotAllowed(format!(
            "POST is not allowed on follow edge {id}"
        )));
    }

    let user = caller.0.ok_or(AppError::Unauthorized)?;
    let ValidJson(req) = body?;

    let view = state
        .follow_edge_service
        .create(Some(&user), &req.followed)
        .await?;
    Ok(Created(view.into()))
}

/// Delete (unfollow) an edge.
async fn delete(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    let id = match FollowersKey::from(key) {
        FollowersKey::Edge(id) => id,
        FollowersKey::Owner(owner) => {
            return Err(AppError::MethodNotAllowed(format!(
                "DELETE is not allowed on the follow list of {owner}"
            )));
        }
    };

    state.follow_edge_service.delete(id, caller.user()).await?;
    Ok(no_content())
}

/// List the edges pointing at a user.
async fn list_by_followed(
    State(state): State<AppState>,
    Path(followed_name): Path<String>,
) -> AppResult<Json<Vec<FollowEdgeResponse>>> {
    let views = state
        .follow_edge_service
        .list_by_followed(&followed_name)
        .await?;
    Ok(Json(into_responses(views)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/followers/", get(list_all).post(create))
        .route(
            "/followers/following/{followed_name}/",
            get(list_by_followed).post(create),
        )
        .route(
            "/followers/{key}/",
            get(retrieve_or_list_by_owner)
                .post(create_for_owner)
                .delete(delete),
        )
}
