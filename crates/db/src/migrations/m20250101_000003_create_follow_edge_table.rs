//! Create follow edge table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FollowEdge::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FollowEdge::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FollowEdge::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(FollowEdge::FollowedId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(FollowEdge::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_edge_owner")
                            .from(FollowEdge::Table, FollowEdge::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_edge_followed")
                            .from(FollowEdge::Table, FollowEdge::FollowedId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (owner_id, followed_id) - prevent duplicate follows.
        // Also serves owner_id lookups through its leading column.
        manager
            .create_index(
                Index::create()
                    .name("idx_follow_edge_owner_followed")
                    .table(FollowEdge::Table)
                    .col(FollowEdge::OwnerId)
                    .col(FollowEdge::FollowedId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: followed_id (for listing followers)
        manager
            .create_index(
                Index::create()
                    .name("idx_follow_edge_followed_id")
                    .table(FollowEdge::Table)
                    .col(FollowEdge::FollowedId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for newest-first listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_follow_edge_created_at")
                    .table(FollowEdge::Table)
                    .col(FollowEdge::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FollowEdge::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FollowEdge {
    Table,
    Id,
    OwnerId,
    FollowedId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
