mod notification_repository_postgres;
pub mod sea_orm_entity;

pub(crate) use notification_repository_postgres::{notify, notify_mentions};
pub use notification_repository_postgres::NotificationRepositoryPostgres;
