use async_trait::async_trait;

use crate::shared::error::SocialError;
use crate::user::application::domain::entities::{
    RegisterUser, UpdateProfile, User, UserId, UserProfile,
};

// Interface for the account use cases
#[async_trait]
pub trait IUserUseCases: Send + Sync {
    async fn register(&self, input: RegisterUser) -> Result<User, SocialError>;

    /// Verifies credentials and stamps `last_login_at`. Unknown email, wrong
    /// password and deleted accounts all fail with `InvalidCredentials`.
    async fn login(&self, email: &str, password: &str) -> Result<User, SocialError>;

    /// Email is only included when `viewer` is the profile owner.
    async fn get_profile(
        &self,
        viewer: Option<UserId>,
        user_id: UserId,
    ) -> Result<UserProfile, SocialError>;

    async fn find_by_username(
        &self,
        viewer: Option<UserId>,
        username: &str,
    ) -> Result<UserProfile, SocialError>;

    async fn update_profile(
        &self,
        user_id: UserId,
        update: UpdateProfile,
    ) -> Result<User, SocialError>;

    async fn record_login(&self, user_id: UserId) -> Result<(), SocialError>;

    async fn set_verified(&self, user_id: UserId) -> Result<(), SocialError>;

    /// Tombstones the account together with its posts, comments, stories,
    /// sent messages, likes and follows.
    async fn delete_user(&self, user_id: UserId) -> Result<(), SocialError>;
}
