//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use followers_common::AppError;
use followers_core::{FollowEdgeService, ProfileService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub follow_edge_service: FollowEdgeService,
    pub profile_service: ProfileService,
}

/// Authentication middleware.
///
/// A valid `Authorization: Bearer <token>` header puts the caller into the
/// request extensions. Missing or unknown tokens leave the request anonymous;
/// a failed lookup answers with the lookup error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(AppError::Unauthorized) => {
                tracing::debug!("Unknown bearer token, continuing anonymously");
            }
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
