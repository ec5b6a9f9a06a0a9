mod follow_repository_postgres;
pub mod sea_orm_entity;

pub use follow_repository_postgres::FollowRepositoryPostgres;
pub(crate) use follow_repository_postgres::accepted_following_ids;
