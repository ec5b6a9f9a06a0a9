//! mockall doubles for ports shared by several service test modules.

use async_trait::async_trait;
use mockall::mock;
use uuid::Uuid;

use crate::post::application::domain::entities::{Post, PostView};
use crate::post::application::ports::outgoing::{NewPost, PostChanges, PostRepository};
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store_error::StoreError;
use crate::user::application::domain::entities::{ProfileStats, User, UserCredentials};
use crate::user::application::ports::outgoing::{
    HashError, NewUser, PasswordHasher, ProfileChanges, UserRepository,
};

mock! {
    pub UserRepo {}
    #[async_trait]
    impl UserRepository for UserRepo {
        async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
        async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
        async fn find_credentials_by_email(
            &self,
            email: &str,
        ) -> Result<Option<UserCredentials>, StoreError>;
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
        async fn soft_delete_user(&self, user_id: Uuid) -> Result<(), StoreError>;
    }
}

mock! {
    pub Hasher {}
    #[async_trait]
    impl PasswordHasher for Hasher {
        async fn hash_password(&self, password: &str) -> Result<String, HashError>;
        async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, HashError>;
    }
}

mock! {
    pub PostRepo {}
    #[async_trait]
    impl PostRepository for PostRepo {
        async fn create_post(&self, post: NewPost) -> Result<Post, StoreError>;
        async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, StoreError>;
        async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> Result<Post, StoreError>;
        async fn soft_delete_post(&self, post_id: Uuid) -> Result<(), StoreError>;
        async fn visible_post(
            &self,
            viewer: Option<Uuid>,
            post_id: Uuid,
        ) -> Result<Option<PostView>, StoreError>;
        async fn posts_by_user(
            &self,
            viewer: Option<Uuid>,
            user_id: Uuid,
            page: PageRequest,
        ) -> Result<PageResult<PostView>, StoreError>;
        async fn feed(&self, viewer: Uuid, page: PageRequest)
            -> Result<PageResult<PostView>, StoreError>;
        async fn posts_by_hashtag(
            &self,
            viewer: Option<Uuid>,
            hashtag: &str,
            page: PageRequest,
        ) -> Result<PageResult<PostView>, StoreError>;
        async fn increment_views(&self, viewer: Option<Uuid>, post_id: Uuid) -> Result<(), StoreError>;
        async fn increment_shares(&self, viewer: Option<Uuid>, post_id: Uuid) -> Result<(), StoreError>;
    }
}
