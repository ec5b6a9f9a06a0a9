pub mod sea_orm_entity;
pub mod security;
mod user_repository_postgres;

pub use user_repository_postgres::UserRepositoryPostgres;
pub(crate) use user_repository_postgres::{
    active_user_ids, find_active_user, load_user_summaries, public_user_ids,
};
