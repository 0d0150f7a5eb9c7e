//! API endpoints.

mod followers;
mod profiles;

use axum::Router;

use crate::middleware::AppState;

pub use followers::{CreateFollowEdgeRequest, FollowEdgeResponse};
pub use profiles::ProfileResponse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(followers::router())
        .merge(profiles::router())
}
