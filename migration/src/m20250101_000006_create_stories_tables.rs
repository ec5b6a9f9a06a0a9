use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_users_table::Users;
use crate::m20250101_000002_create_posts_and_hashtags::counter;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // =====================================================
        // stories
        // =====================================================
        manager
            .create_table(
                Table::create()
                    .table(Stories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stories::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Stories::UserId).uuid().not_null())
                    .col(ColumnDef::new(Stories::MediaUrl).string_len(255).not_null())
                    .col(ColumnDef::new(Stories::MediaType).string_len(20).not_null())
                    .col(ColumnDef::new(Stories::Caption).string_len(500).null())
                    .col(counter(Stories::ViewsCount))
                    .col(
                        ColumnDef::new(Stories::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Stories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Stories::Status)
                            .string_len(10)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Stories::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stories_user_id")
                            .from(Stories::Table, Stories::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .check(Expr::cust("media_type IN ('image', 'video')"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stories_expires_at")
                    .table(Stories::Table)
                    .col(Stories::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        // =====================================================
        // story_views
        // =====================================================
        manager
            .create_table(
                Table::create()
                    .table(StoryViews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StoryViews::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StoryViews::StoryId).uuid().not_null())
                    .col(ColumnDef::new(StoryViews::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(StoryViews::ViewedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_views_story_id")
                            .from(StoryViews::Table, StoryViews::StoryId)
                            .to(Stories::Table, Stories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_views_user_id")
                            .from(StoryViews::Table, StoryViews::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_story_views_pair")
                    .table(StoryViews::Table)
                    .col(StoryViews::StoryId)
                    .col(StoryViews::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StoryViews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Stories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Stories {
    Table,
    Id,
    UserId,
    MediaUrl,
    MediaType,
    Caption,
    ViewsCount,
    ExpiresAt,
    CreatedAt,
    Status,
    DeletedAt,
}

#[derive(DeriveIden)]
enum StoryViews {
    Table,
    Id,
    StoryId,
    UserId,
    ViewedAt,
}
