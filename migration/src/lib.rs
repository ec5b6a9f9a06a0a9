pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_table;
mod m20250101_000002_create_posts_and_hashtags;
mod m20250101_000003_create_comments_table;
mod m20250101_000004_create_likes_table;
mod m20250101_000005_create_follows_table;
mod m20250101_000006_create_stories_tables;
mod m20250101_000007_create_messages_table;
mod m20250101_000008_create_notifications_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_table::Migration),
            Box::new(m20250101_000002_create_posts_and_hashtags::Migration),
            Box::new(m20250101_000003_create_comments_table::Migration),
            Box::new(m20250101_000004_create_likes_table::Migration),
            Box::new(m20250101_000005_create_follows_table::Migration),
            Box::new(m20250101_000006_create_stories_tables::Migration),
            Box::new(m20250101_000007_create_messages_table::Migration),
            Box::new(m20250101_000008_create_notifications_table::Migration),
        ]
    }
}
