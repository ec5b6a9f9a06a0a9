mod comment_repository_postgres;
pub mod sea_orm_entity;

pub use comment_repository_postgres::CommentRepositoryPostgres;
pub(crate) use comment_repository_postgres::{
    adjust_comment_likes, find_active_comment, increment_visible_comment_likes,
    soft_delete_comments,
};
