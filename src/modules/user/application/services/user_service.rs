use async_trait::async_trait;
use std::sync::Arc;

use crate::shared::constants::{
    BIO_MAX_LEN, FULL_NAME_MAX_LEN, LOCATION_MAX_LEN, URL_MAX_LEN, WEBSITE_MAX_LEN,
};
use crate::shared::error::SocialError;
use crate::shared::store_error::StoreError;
use crate::shared::validation::{
    check_email, check_len, check_max, check_password, check_username, normalize_email,
};
use crate::user::application::domain::entities::{
    RegisterUser, UpdateProfile, User, UserId, UserProfile,
};
use crate::user::application::ports::incoming::IUserUseCases;
use crate::user::application::ports::outgoing::{
    NewUser, PasswordHasher, ProfileChanges, UserRepository,
};

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("repository", &"<dyn UserRepository>")
            .field("hasher", &"<dyn PasswordHasher>")
            .finish()
    }
}

fn map_user_store_error(err: StoreError) -> SocialError {
    match err {
        StoreError::ConstraintViolation { field: "email" } => SocialError::EmailAlreadyUsed,
        StoreError::ConstraintViolation { field: "username" } => SocialError::UsernameAlreadyUsed,
        other => other.into(),
    }
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repository, hasher }
    }

    async fn profile_for(
        &self,
        viewer: Option<UserId>,
        user: User,
    ) -> Result<UserProfile, SocialError> {
        let stats = self
            .repository
            .profile_stats(viewer.map(|v| v.value()), user.id)
            .await
            .map_err(map_user_store_error)?;

        Ok(UserProfile::build(user, stats, viewer))
    }
}

#[async_trait]
impl IUserUseCases for UserService {
    async fn register(&self, input: RegisterUser) -> Result<User, SocialError> {
        let username = input.username.trim().to_string();
        let email = normalize_email(&input.email);
        let full_name = input.full_name.trim().to_string();

        check_username(&username)?;
        check_email(&email)?;
        check_password(&input.password)?;
        check_len("full_name", &full_name, 1, FULL_NAME_MAX_LEN)?;

        if self
            .repository
            .email_exists(&email)
            .await
            .map_err(map_user_store_error)?
        {
            return Err(SocialError::EmailAlreadyUsed);
        }
        if self
            .repository
            .username_exists(&username)
            .await
            .map_err(map_user_store_error)?
        {
            return Err(SocialError::UsernameAlreadyUsed);
        }

        let password_hash = self
            .hasher
            .hash_password(&input.password)
            .await
            .map_err(|e| SocialError::Internal(e.to_string()))?;

        // The unique indexes still decide a race between two registrations.
        let user = self
            .repository
            .create_user(NewUser {
                username,
                email,
                password_hash,
                full_name,
            })
            .await
            .map_err(map_user_store_error)?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, SocialError> {
        let email = normalize_email(email);

        let credentials = self
            .repository
            .find_credentials_by_email(&email)
            .await
            .map_err(map_user_store_error)?
            .filter(|c| c.is_active)
            .ok_or(SocialError::InvalidCredentials)?;

        let matches = self
            .hasher
            .verify_password(password, &credentials.password_hash)
            .await
            .map_err(|e| SocialError::Internal(e.to_string()))?;

        if !matches {
            tracing::warn!(user_id = %credentials.id, "Login rejected");
            return Err(SocialError::InvalidCredentials);
        }

        self.record_login(UserId::from(credentials.id)).await?;

        self.repository
            .find_by_id(credentials.id)
            .await
            .map_err(map_user_store_error)?
            .ok_or(SocialError::UserNotFound)
    }

    async fn get_profile(
        &self,
        viewer: Option<UserId>,
        user_id: UserId,
    ) -> Result<UserProfile, SocialError> {
        let user = self
            .repository
            .find_by_id(user_id.value())
            .await
            .map_err(map_user_store_error)?
            .ok_or(SocialError::UserNotFound)?;

        self.profile_for(viewer, user).await
    }

    async fn find_by_username(
        &self,
        viewer: Option<UserId>,
        username: &str,
    ) -> Result<UserProfile, SocialError> {
        let user = self
            .repository
            .find_by_username(username.trim())
            .await
            .map_err(map_user_store_error)?
            .ok_or(SocialError::UserNotFound)?;

        self.profile_for(viewer, user).await
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: UpdateProfile,
    ) -> Result<User, SocialError> {
        if let Some(full_name) = &update.full_name {
            check_len("full_name", full_name.trim(), 1, FULL_NAME_MAX_LEN)?;
        }
        check_max("bio", update.bio.as_value().map(String::as_str), BIO_MAX_LEN)?;
        check_max(
            "profile_image_url",
            update.profile_image_url.as_value().map(String::as_str),
            URL_MAX_LEN,
        )?;
        check_max(
            "cover_image_url",
            update.cover_image_url.as_value().map(String::as_str),
            URL_MAX_LEN,
        )?;
        check_max(
            "website",
            update.website.as_value().map(String::as_str),
            WEBSITE_MAX_LEN,
        )?;
        check_max(
            "location",
            update.location.as_value().map(String::as_str),
            LOCATION_MAX_LEN,
        )?;

        let changes = ProfileChanges {
            full_name: update.full_name.map(|n| n.trim().to_string()),
            bio: update.bio.into_change(),
            profile_image_url: update.profile_image_url.into_change(),
            cover_image_url: update.cover_image_url.into_change(),
            website: update.website.into_change(),
            location: update.location.into_change(),
            date_of_birth: update.date_of_birth.into_change(),
            is_private: update.is_private,
        };

        let user = self
            .repository
            .update_profile(user_id.value(), changes)
            .await
            .map_err(map_user_store_error)?;

        tracing::info!(user_id = %user_id, "Profile updated");
        Ok(user)
    }

    async fn record_login(&self, user_id: UserId) -> Result<(), SocialError> {
        self.repository
            .record_login(user_id.value())
            .await
            .map_err(map_user_store_error)
    }

    async fn set_verified(&self, user_id: UserId) -> Result<(), SocialError> {
        self.repository
            .set_verified(user_id.value(), true)
            .await
            .map_err(map_user_store_error)?;

        tracing::info!(user_id = %user_id, "User verified");
        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> Result<(), SocialError> {
        self.repository
            .soft_delete_user(user_id.value())
            .await
            .map_err(map_user_store_error)?;

        tracing::info!(user_id = %user_id, "User soft-deleted with dependents");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::application::domain::entities::{UserCredentials, UserRole};
    use crate::tests::support::mocks::{MockHasher, MockUserRepo};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_user(id: Uuid) -> User {
        let now = Utc::now();
        User {
            id,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            bio: None,
            profile_image_url: None,
            cover_image_url: None,
            website: None,
            location: None,
            date_of_birth: None,
            role: UserRole::User,
            is_verified: false,
            is_private: false,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn register_input() -> RegisterUser {
        RegisterUser {
            username: "alice".to_string(),
            email: "Alice@Example.com".to_string(),
            password: "secret123".to_string(),
            full_name: "Alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_email_and_hashes() {
        let mut repo = MockUserRepo::new();
        repo.expect_email_exists()
            .withf(|email| email == "alice@example.com")
            .returning(|_| Ok(false));
        repo.expect_username_exists().returning(|_| Ok(false));
        repo.expect_create_user()
            .withf(|u| u.email == "alice@example.com" && u.password_hash == "hashed")
            .returning(|_| Ok(sample_user(Uuid::new_v4())));

        let mut hasher = MockHasher::new();
        hasher
            .expect_hash_password()
            .returning(|_| Ok("hashed".to_string()));

        let service = UserService::new(Arc::new(repo), Arc::new(hasher));
        let user = service.register(register_input()).await.unwrap();

        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_register_duplicate_email_precheck() {
        let mut repo = MockUserRepo::new();
        repo.expect_email_exists().returning(|_| Ok(true));
        repo.expect_create_user().never();

        let service = UserService::new(Arc::new(repo), Arc::new(MockHasher::new()));
        let err = service.register(register_input()).await.unwrap_err();

        assert_eq!(err, SocialError::EmailAlreadyUsed);
    }

    #[tokio::test]
    async fn test_register_race_maps_constraint_to_username_taken() {
        let mut repo = MockUserRepo::new();
        repo.expect_email_exists().returning(|_| Ok(false));
        repo.expect_username_exists().returning(|_| Ok(false));
        repo.expect_create_user()
            .returning(|_| Err(StoreError::ConstraintViolation { field: "username" }));

        let mut hasher = MockHasher::new();
        hasher
            .expect_hash_password()
            .returning(|_| Ok("hashed".to_string()));

        let service = UserService::new(Arc::new(repo), Arc::new(hasher));
        let err = service.register(register_input()).await.unwrap_err();

        assert_eq!(err, SocialError::UsernameAlreadyUsed);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_username() {
        let service = UserService::new(Arc::new(MockUserRepo::new()), Arc::new(MockHasher::new()));
        let mut input = register_input();
        input.username = "no spaces".to_string();

        let err = service.register(input).await.unwrap_err();
        assert!(matches!(err, SocialError::Validation { field: "username", .. }));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let id = Uuid::new_v4();
        let mut repo = MockUserRepo::new();
        repo.expect_find_credentials_by_email().returning(move |_| {
            Ok(Some(UserCredentials {
                id,
                password_hash: "hash".to_string(),
                is_active: true,
            }))
        });
        repo.expect_record_login().never();

        let mut hasher = MockHasher::new();
        hasher.expect_verify_password().returning(|_, _| Ok(false));

        let service = UserService::new(Arc::new(repo), Arc::new(hasher));
        let err = service.login("alice@example.com", "nope").await.unwrap_err();

        assert_eq!(err, SocialError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_get_profile_missing_user() {
        let mut repo = MockUserRepo::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repo), Arc::new(MockHasher::new()));
        let err = service
            .get_profile(None, UserId::from(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert_eq!(err, SocialError::UserNotFound);
        assert_eq!(err.code(), "user_not_found");
    }

    #[tokio::test]
    async fn test_update_profile_passes_patch_semantics() {
        let id = Uuid::new_v4();
        let mut repo = MockUserRepo::new();
        repo.expect_update_profile()
            .withf(|_, c| {
                c.bio == Some(None)
                    && c.website == Some(Some("https://a.dev".to_string()))
                    && c.location.is_none()
            })
            .returning(move |_, _| Ok(sample_user(id)));

        let service = UserService::new(Arc::new(repo), Arc::new(MockHasher::new()));
        let update = UpdateProfile {
            bio: crate::shared::patch::PatchField::Null,
            website: crate::shared::patch::PatchField::Value("https://a.dev".to_string()),
            ..Default::default()
        };

        assert!(service.update_profile(UserId::from(id), update).await.is_ok());
    }
}
