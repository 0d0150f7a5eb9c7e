//! Follow edge service.

use std::collections::{BTreeSet, HashMap};

use crate::services::permission::{
    Access, authenticated_or_read_only, enforce, owner_or_read_only,
};
use chrono::Utc;
use followers_common::{AppError, AppResult};
use followers_db::{
    entities::{follow_edge, user},
    repositories::{FollowEdgeRepository, UserRepository},
};
use sea_orm::Set;

/// A follow edge together with the usernames of both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowEdgeView {
    pub edge: follow_edge::Model,
    /// Username of the follower.
    pub owner: String,
    /// Username of the followed user.
    pub followed: String,
}

/// Follow edge service for business logic.
#[derive(Clone)]
pub struct FollowEdgeService {
    follow_edge_repo: FollowEdgeRepository,
    user_repo: UserRepository,
}

impl FollowEdgeService {
    /// Create a new follow edge service.
    #[must_use]
    pub const fn new(follow_edge_repo: FollowEdgeRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_edge_repo,
            user_repo,
        }
    }

    /// List every follow edge, newest first.
    pub async fn list_all(&self, caller: Option<&user::Model>) -> AppResult<Vec<FollowEdgeView>> {
        enforce(authenticated_or_read_only, caller, Access::Read, None)?;

        let edges = self.follow_edge_repo.find_all().await?;
        self.pack_many(edges).await
    }

    /// List the edges owned by `owner_name` (who that user follows).
    ///
    /// An unknown username yields an empty list rather than an error.
    pub async fn list_by_owner(&self, owner_name: &str) -> AppResult<Vec<FollowEdgeView>> {
        let Some(owner) = self.user_repo.find_by_username(owner_name).await? else {
            return Ok(vec![]);
        };

        let edges = self.follow_edge_repo.find_by_owner(&owner.id).await?;
        self.pack_many(edges).await
    }

    /// List the edges pointing at `followed_name` (who follows that user).
    ///
    /// An unknown username yields an empty list rather than an error.
    pub async fn list_by_followed(&self, followed_name: &str) -> AppResult<Vec<FollowEdgeView>> {
        let Some(followed) = self.user_repo.find_by_username(followed_name).await? else {
            return Ok(vec![]);
        };

        let edges = self.follow_edge_repo.find_by_followed(&followed.id).await?;
        self.pack_many(edges).await
    }

    /// Follow `followed_name` as `caller`.
    ///
    /// The owner is always the caller; it is never taken from the request.
    pub async fn create(
        &self,
        caller: Option<&user::Model>,
        followed_name: &str,
    ) -> AppResult<FollowEdgeView> {
        enforce(authenticated_or_read_only, caller, Access::Write, None)?;
        let owner = caller.ok_or(AppError::Unauthorized)?;

        let followed = self
            .user_repo
            .find_by_username(followed_name)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "followed: user \"{followed_name}\" does not exist"
                ))
            })?;

        if owner.id == followed.id {
            return Err(AppError::Validation(
                "followed: you cannot follow yourself".to_string(),
            ));
        }

        if self
            .follow_edge_repo
            .exists(&owner.id, &followed.id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "already following {}",
                followed.username
            )));
        }

        let model = follow_edge::ActiveModel {
            owner_id: Set(owner.id.clone()),
            followed_id: Set(followed.id.clone()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let edge = match self.follow_edge_repo.create(model).await {
            Ok(edge) => edge,
            // Lost a race with a concurrent create of the same pair.
            Err(AppError::Database(detail)) => {
                if self.follow_edge_repo.exists(&owner.id, &followed.id).await? {
                    return Err(AppError::Conflict(format!(
                        "already following {}",
                        followed.username
                    )));
                }
                return Err(AppError::Database(detail));
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(edge_id = edge.id, owner = %owner.username, followed = %followed.username, "Created follow edge");

        Ok(FollowEdgeView {
            edge,
            owner: owner.username.clone(),
            followed: followed.username,
        })
    }

    /// Retrieve a single edge. Readable by any caller.
    pub async fn retrieve(
        &self,
        id: i64,
        caller: Option<&user::Model>,
    ) -> AppResult<FollowEdgeView> {
        let edge = self.get_edge(id).await?;
        enforce(owner_or_read_only, caller, Access::Read, Some(&edge))?;

        self.pack_one(edge).await
    }

    /// Delete an edge. Only its owner may do so.
    pub async fn delete(&self, id: i64, caller: Option<&user::Model>) -> AppResult<()> {
        let edge = self.get_edge(id).await?;
        enforce(owner_or_read_only, caller, Access::Write, Some(&edge))?;

        // Lost a race with another delete of the same edge.
        if !self.follow_edge_repo.delete(edge.id).await? {
            return Err(AppError::NotFound(format!("follow edge {id}")));
        }

        tracing::debug!(edge_id = edge.id, owner_id = %edge.owner_id, followed_id = %edge.followed_id, "Deleted follow edge");
        Ok(())
    }

    async fn get_edge(&self, id: i64) -> AppResult<follow_edge::Model> {
        self.follow_edge_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("follow edge {id}")))
    }

    async fn pack_one(&self, edge: follow_edge::Model) -> AppResult<FollowEdgeView> {
        let id = edge.id;
        self.pack_many(vec![edge])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("follow edge {id}")))
    }

    /// Resolve usernames for both ends of every edge with one user query.
    async fn pack_many(&self, edges: Vec<follow_edge::Model>) -> AppResult<Vec<FollowEdgeView>> {
        let ids: Vec<String> = edges
            .iter()
            .flat_map(|e| [e.owner_id.clone(), e.followed_id.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let usernames: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        // Edges whose users vanished mid-request are skipped (FKs cascade).
        Ok(edges
            .into_iter()
            .filter_map(|edge| {
                let owner = usernames.get(&edge.owner_id)?.clone();
                let followed = usernames.get(&edge.followed_id)?.clone();
                Some(FollowEdgeView {
                    edge,
                    owner,
                    followed,
                })
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            token: Some(format!("token_{id}")),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_edge(id: i64, owner_id: &str, followed_id: &str) -> follow_edge::Model {
        follow_edge::Model {
            id,
            owner_id: owner_id.to_string(),
            followed_id: followed_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service(edge_db: MockDatabase, user_db: MockDatabase) -> FollowEdgeService {
        FollowEdgeService::new(
            FollowEdgeRepository::new(Arc::new(edge_db.into_connection())),
            UserRepository::new(Arc::new(user_db.into_connection())),
        )
    }

    fn empty_db() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    #[tokio::test]
    async fn test_create_requires_authentication() {
        let service = service(empty_db(), empty_db());

        let result = service.create(None, "bob").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_create_assigns_caller_as_owner() {
        let alice = create_test_user("ua", "alice");
        let bob = create_test_user("ub", "bob");
        let edge = create_test_edge(1, "ua", "ub");

        let service = service(
            empty_db()
                .append_query_results([Vec::<follow_edge::Model>::new()])
                .append_query_results([[edge.clone()]]),
            empty_db().append_query_results([[bob]]),
        );

        let view = service.create(Some(&alice), "bob").await.unwrap();

        assert_eq!(view.edge.id, 1);
        assert_eq!(view.edge.owner_id, "ua");
        assert_eq!(view.owner, "alice");
        assert_eq!(view.followed, "bob");
    }

    #[tokio::test]
    async fn test_create_unknown_target_is_validation_error() {
        let alice = create_test_user("ua", "alice");

        let service = service(
            empty_db(),
            empty_db().append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service.create(Some(&alice), "nobody").await;

        match result {
            Err(AppError::Validation(msg)) => assert!(msg.starts_with("followed")),
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_create_self_follow_is_rejected() {
        let alice = create_test_user("ua", "alice");

        let service = service(
            empty_db(),
            empty_db().append_query_results([[alice.clone()]]),
        );

        let result = service.create(Some(&alice), "alice").await;

        match result {
            Err(AppError::Validation(msg)) => assert!(msg.contains("cannot follow yourself")),
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_create_duplicate_is_conflict() {
        let alice = create_test_user("ua", "alice");
        let bob = create_test_user("ub", "bob");
        let existing = create_test_edge(1, "ua", "ub");

        let service = service(
            empty_db().append_query_results([[existing]]),
            empty_db().append_query_results([[bob]]),
        );

        let result = service.create(Some(&alice), "bob").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_losing_insert_race_is_conflict() {
        let alice = create_test_user("ua", "alice");
        let bob = create_test_user("ub", "bob");
        let winner = create_test_edge(1, "ua", "ub");

        let service = service(
            empty_db()
                .append_query_results([Vec::<follow_edge::Model>::new()])
                .append_query_errors([DbErr::Custom(
                    "duplicate key value violates unique constraint".to_string(),
                )])
                .append_query_results([[winner]]),
            empty_db().append_query_results([[bob]]),
        );

        let result = service.create(Some(&alice), "bob").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_insert_failure_without_edge_is_database_error() {
        let alice = create_test_user("ua", "alice");
        let bob = create_test_user("ub", "bob");

        let service = service(
            empty_db()
                .append_query_results([Vec::<follow_edge::Model>::new()])
                .append_query_errors([DbErr::Custom("connection reset".to_string())])
                .append_query_results([Vec::<follow_edge::Model>::new()]),
            empty_db().append_query_results([[bob]]),
        );

        let result = service.create(Some(&alice), "bob").await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_retrieve_is_open_to_anonymous_callers() {
        let alice = create_test_user("ua", "alice");
        let bob = create_test_user("ub", "bob");
        let edge = create_test_edge(5, "ua", "ub");

        let service = service(
            empty_db().append_query_results([[edge]]),
            empty_db().append_query_results([[alice, bob]]),
        );

        let view = service.retrieve(5, None).await.unwrap();

        assert_eq!(view.edge.id, 5);
        assert_eq!(view.owner, "alice");
        assert_eq!(view.followed, "bob");
    }

    #[tokio::test]
    async fn test_retrieve_missing_is_not_found() {
        let service = service(
            empty_db().append_query_results([Vec::<follow_edge::Model>::new()]),
            empty_db(),
        );

        let result = service.retrieve(9999, None).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_forbidden() {
        let alice = create_test_user("ua", "alice");
        let carols = create_test_edge(3, "uc", "ub");

        // No exec result queued: a delete statement would fail the mock.
        let service = service(empty_db().append_query_results([[carols]]), empty_db());

        let result = service.delete(3, Some(&alice)).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_by_anonymous_is_unauthorized() {
        let carols = create_test_edge(3, "uc", "ub");

        let service = service(empty_db().append_query_results([[carols]]), empty_db());

        let result = service.delete(3, None).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_delete_by_owner_succeeds_once() {
        let alice = create_test_user("ua", "alice");
        let edge = create_test_edge(4, "ua", "ub");

        let service = service(
            empty_db()
                .append_query_results([[edge]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([Vec::<follow_edge::Model>::new()]),
            empty_db(),
        );

        service.delete(4, Some(&alice)).await.unwrap();
        let second = service.delete(4, Some(&alice)).await;

        assert!(matches!(second, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_owner_unknown_user_is_empty() {
        let service = service(
            empty_db(),
            empty_db().append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service.list_by_owner("ghost").await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_list_by_owner_returns_owned_edges() {
        let alice = create_test_user("ua", "alice");
        let bob = create_test_user("ub", "bob");
        let carol = create_test_user("uc", "carol");

        let service = service(
            empty_db().append_query_results([[
                create_test_edge(2, "ua", "uc"),
                create_test_edge(1, "ua", "ub"),
            ]]),
            empty_db()
                .append_query_results([[alice.clone()]])
                .append_query_results([[alice, bob, carol]]),
        );

        let result = service.list_by_owner("alice").await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|v| v.owner == "alice"));
        assert_eq!(result[0].followed, "carol");
        assert_eq!(result[1].followed, "bob");
    }

    #[tokio::test]
    async fn test_list_by_followed_returns_incoming_edges() {
        let alice = create_test_user("ua", "alice");
        let bob = create_test_user("ub", "bob");
        let carol = create_test_user("uc", "carol");

        let service = service(
            empty_db().append_query_results([[
                create_test_edge(2, "uc", "ub"),
                create_test_edge(1, "ua", "ub"),
            ]]),
            empty_db()
                .append_query_results([[bob.clone()]])
                .append_query_results([[alice, bob, carol]]),
        );

        let result = service.list_by_followed("bob").await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|v| v.followed == "bob"));
    }

    #[tokio::test]
    async fn test_list_all_empty_skips_user_lookup() {
        let service = service(
            empty_db().append_query_results([Vec::<follow_edge::Model>::new()]),
            empty_db(),
        );

        let result = service.list_all(None).await.unwrap();

        assert!(result.is_empty());
    }
}
