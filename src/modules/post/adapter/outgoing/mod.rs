mod post_repository_postgres;
pub mod sea_orm_entity;

pub use post_repository_postgres::PostRepositoryPostgres;
pub(crate) use post_repository_postgres::{
    adjust_post_counter, build_post_views, find_active_post, increment_visible_post,
    soft_delete_posts, visibility, visible_post_ids,
};
