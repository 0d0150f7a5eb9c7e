//! Follow edge repository.

use std::sync::Arc;

use crate::entities::{FollowEdge, follow_edge};
use followers_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, SqlErr,
};

/// Follow edge repository for database operations.
#[derive(Clone)]
pub struct FollowEdgeRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowEdgeRepository {
    /// Create a new follow edge repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a follow edge by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<follow_edge::Model>> {
        FollowEdge::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a follow edge by owner and followed user.
    pub async fn find_by_pair(
        &self,
        owner_id: &str,
        followed_id: &str,
    ) -> AppResult<Option<follow_edge::Model>> {
        FollowEdge::find()
            .filter(follow_edge::Column::OwnerId.eq(owner_id))
            .filter(follow_edge::Column::FollowedId.eq(followed_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is following another user.
    pub async fn exists(&self, owner_id: &str, followed_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(owner_id, followed_id).await?.is_some())
    }

    /// List every follow edge, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<follow_edge::Model>> {
        FollowEdge::find()
            .order_by_desc(follow_edge::Column::CreatedAt)
            .order_by_desc(follow_edge::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List the edges a user owns (who the user follows), newest first.
    pub async fn find_by_owner(&self, owner_id: &str) -> AppResult<Vec<follow_edge::Model>> {
        FollowEdge::find()
            .filter(follow_edge::Column::OwnerId.eq(owner_id))
            .order_by_desc(follow_edge::Column::CreatedAt)
            .order_by_desc(follow_edge::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List the edges pointing at a user (who follows the user), newest first.
    pub async fn find_by_followed(&self, followed_id: &str) -> AppResult<Vec<follow_edge::Model>> {
        FollowEdge::find()
            .filter(follow_edge::Column::FollowedId.eq(followed_id))
            .order_by_desc(follow_edge::Column::CreatedAt)
            .order_by_desc(follow_edge::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new follow edge.
    ///
    /// A violation of the `(owner_id, followed_id)` unique index is reported
    /// as `Conflict`.
    pub async fn create(&self, model: follow_edge::ActiveModel) -> AppResult<follow_edge::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                AppError::Conflict(format!("follow edge already exists: {detail}"))
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Delete a follow edge by ID. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = FollowEdge::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Count the followers of a user.
    pub async fn count_by_followed(&self, followed_id: &str) -> AppResult<u64> {
        FollowEdge::find()
            .filter(follow_edge::Column::FollowedId.eq(followed_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the users a user follows.
    pub async fn count_by_owner(&self, owner_id: &str) -> AppResult<u64> {
        FollowEdge::find()
            .filter(follow_edge::Column::OwnerId.eq(owner_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_edge(id: i64, owner_id: &str, followed_id: &str) -> follow_edge::Model {
        follow_edge::Model {
            id,
            owner_id: owner_id.to_string(),
            followed_id: followed_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let edge = create_test_edge(1, "alice", "bob");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge.clone()]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let found = repo.find_by_id(1).await.unwrap().unwrap();

        assert_eq!(found.id, 1);
        assert_eq!(found.owner_id, "alice");
        assert_eq!(found.followed_id, "bob");
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow_edge::Model>::new()])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let result = repo.find_by_id(9999).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_exists() {
        let edge = create_test_edge(1, "alice", "bob");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge]])
                .append_query_results([Vec::<follow_edge::Model>::new()])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);

        assert!(repo.exists("alice", "bob").await.unwrap());
        assert!(!repo.exists("alice", "carol").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_all() {
        let e1 = create_test_edge(2, "alice", "bob");
        let e2 = create_test_edge(1, "carol", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[e1, e2]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let result = repo.find_all().await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, 2);
    }

    #[tokio::test]
    async fn test_find_by_owner() {
        let e1 = create_test_edge(1, "alice", "bob");
        let e2 = create_test_edge(2, "alice", "carol");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[e1, e2]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let result = repo.find_by_owner("alice").await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|e| e.owner_id == "alice"));
    }

    #[tokio::test]
    async fn test_find_by_followed() {
        let e1 = create_test_edge(1, "alice", "bob");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[e1]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let result = repo.find_by_followed("bob").await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].followed_id, "bob");
    }

    #[tokio::test]
    async fn test_create() {
        let edge = create_test_edge(7, "alice", "bob");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge.clone()]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let model = follow_edge::ActiveModel {
            owner_id: Set("alice".to_string()),
            followed_id: Set("bob".to_string()),
            created_at: Set(edge.created_at),
            ..Default::default()
        };
        let created = repo.create(model).await.unwrap();

        assert_eq!(created.id, 7);
    }

    #[tokio::test]
    async fn test_delete_reports_rows_affected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);

        assert!(repo.delete(1).await.unwrap());
        assert!(!repo.delete(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_count_by_followed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let count = repo.count_by_followed("bob").await.unwrap();

        assert_eq!(count, 3);
    }
}
