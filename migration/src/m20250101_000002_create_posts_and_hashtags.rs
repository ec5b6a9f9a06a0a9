use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // =====================================================
        // posts
        // =====================================================
        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Posts::UserId).uuid().not_null())
                    .col(ColumnDef::new(Posts::Caption).string_len(2200).null())
                    .col(ColumnDef::new(Posts::MediaUrl).string_len(255).null())
                    .col(
                        ColumnDef::new(Posts::MediaType)
                            .string_len(20)
                            .not_null()
                            .default("text"),
                    )
                    .col(ColumnDef::new(Posts::Location).string_len(100).null())
                    .col(
                        ColumnDef::new(Posts::IsPublic)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(counter(Posts::LikesCount))
                    .col(counter(Posts::CommentsCount))
                    .col(counter(Posts::SharesCount))
                    .col(counter(Posts::ViewsCount))
                    .col(
                        ColumnDef::new(Posts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Posts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Posts::Status)
                            .string_len(10)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Posts::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_user_id")
                            .from(Posts::Table, Posts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .check(Expr::cust("media_type IN ('image', 'video', 'text')"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_user_id_created_at")
                    .table(Posts::Table)
                    .col(Posts::UserId)
                    .col(Posts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // =====================================================
        // hashtags
        // =====================================================
        manager
            .create_table(
                Table::create()
                    .table(Hashtags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Hashtags::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Hashtags::Name).string_len(100).not_null())
                    .col(counter(Hashtags::PostCount))
                    .col(
                        ColumnDef::new(Hashtags::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Hashtags::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_hashtags_name")
                    .table(Hashtags::Table)
                    .col(Hashtags::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // =====================================================
        // post_hashtags join table
        // =====================================================
        manager
            .create_table(
                Table::create()
                    .table(PostHashtags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PostHashtags::PostId).uuid().not_null())
                    .col(ColumnDef::new(PostHashtags::HashtagId).uuid().not_null())
                    .col(
                        ColumnDef::new(PostHashtags::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(PostHashtags::PostId)
                            .col(PostHashtags::HashtagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_hashtags_post_id")
                            .from(PostHashtags::Table, PostHashtags::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_hashtags_hashtag_id")
                            .from(PostHashtags::Table, PostHashtags::HashtagId)
                            .to(Hashtags::Table, Hashtags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_hashtags_hashtag_id")
                    .table(PostHashtags::Table)
                    .col(PostHashtags::HashtagId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostHashtags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Hashtags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await
    }
}

pub(crate) fn counter<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .default(0)
        .to_owned()
}

#[derive(DeriveIden)]
pub(crate) enum Posts {
    Table,
    Id,
    UserId,
    Caption,
    MediaUrl,
    MediaType,
    Location,
    IsPublic,
    LikesCount,
    CommentsCount,
    SharesCount,
    ViewsCount,
    CreatedAt,
    UpdatedAt,
    Status,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Hashtags {
    Table,
    Id,
    Name,
    PostCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PostHashtags {
    Table,
    PostId,
    HashtagId,
    CreatedAt,
}
