pub mod sea_orm_entity;
mod story_repository_postgres;

pub use story_repository_postgres::StoryRepositoryPostgres;
