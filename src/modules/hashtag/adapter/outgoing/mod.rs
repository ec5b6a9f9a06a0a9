mod hashtag_repository_postgres;
pub mod sea_orm_entity;

pub use hashtag_repository_postgres::HashtagRepositoryPostgres;
pub(crate) use hashtag_repository_postgres::{detach_posts, sync_post_hashtags};
