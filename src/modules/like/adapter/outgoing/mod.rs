mod like_repository_postgres;
pub mod sea_orm_entity;

pub use like_repository_postgres::LikeRepositoryPostgres;
pub(crate) use like_repository_postgres::remove_likes_by_user;
