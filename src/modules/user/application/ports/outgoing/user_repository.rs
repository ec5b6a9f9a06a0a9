use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::shared::store_error::StoreError;
use crate::user::application::domain::entities::{ProfileStats, User, UserCredentials};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    /// Already normalized to lowercase.
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
}

/// `None` keeps the column, `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub bio: Option<Option<String>>,
    pub profile_image_url: Option<Option<String>>,
    pub cover_image_url: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub is_private: Option<bool>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError>;

    /// Checks include tombstoned rows; uniqueness is global.
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;
    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;

    async fn profile_stats(
        &self,
        viewer: Option<Uuid>,
        user_id: Uuid,
    ) -> Result<ProfileStats, StoreError>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, StoreError>;
    async fn record_login(&self, user_id: Uuid) -> Result<(), StoreError>;
    async fn set_verified(&self, user_id: Uuid, verified: bool) -> Result<(), StoreError>;

    /// Tombstones the user and everything that hangs off them in one transaction.
    async fn soft_delete_user(&self, user_id: Uuid) -> Result<(), StoreError>;
}
