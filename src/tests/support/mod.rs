pub mod fixtures;
pub mod mocks;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use tempfile::TempDir;

use crate::post::application::domain::entities::{CreatePost, Post};
use crate::shared::clock::FixedClock;
use crate::shared::media::MediaType;
use crate::shared::store::Store;
use crate::user::application::domain::entities::{RegisterUser, User, UserId};
use crate::user::application::ports::outgoing::{HashError, PasswordHasher};
use crate::AppState;

/// Stores the password reversed; keeps SQLite tests fast.
pub struct PlainHasher;

#[async_trait]
impl PasswordHasher for PlainHasher {
    async fn hash_password(&self, password: &str) -> Result<String, HashError> {
        Ok(format!("plain${}", password.chars().rev().collect::<String>()))
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        Ok(self.hash_password(password).await? == hash)
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Fully migrated database behind every service.
pub struct TestApp {
    pub state: AppState,
    pub clock: FixedClock,
    _db_dir: Option<TempDir>,
}

impl TestApp {
    /// In-memory database on a single connection.
    pub async fn new() -> Self {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        // Every pooled connection to :memory: would be a separate database.
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        Self::connect(opt, None).await
    }

    /// Database file in a temporary directory, shared by a pool of
    /// `connections`, so transactions from concurrent calls overlap.
    pub async fn on_disk(connections: u32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("social.db").display());

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(connections)
            .min_connections(connections)
            .sqlx_logging(false);

        Self::connect(opt, Some(dir)).await
    }

    async fn connect(opt: ConnectOptions, dir: Option<TempDir>) -> Self {
        let db = Database::connect(opt).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let clock = FixedClock::new(start_time());
        let store = Store::new(Arc::new(db), Arc::new(clock.clone()));

        Self {
            state: AppState::new(store, Arc::new(PlainHasher)),
            clock,
            _db_dir: dir,
        }
    }

    pub async fn register(&self, username: &str) -> UserId {
        let user = self.register_user(username).await;
        UserId::from(user.id)
    }

    pub async fn register_user(&self, username: &str) -> User {
        self.state
            .users
            .register(RegisterUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password: "secret123".to_string(),
                full_name: username.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: UserId, caption: &str) -> Post {
        self.state
            .posts
            .create_post(
                author,
                CreatePost {
                    caption: Some(caption.to_string()),
                    media_url: None,
                    media_type: MediaType::Text,
                    location: None,
                    is_public: None,
                },
            )
            .await
            .unwrap()
    }
}
