use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::patch::PatchField;

/// Identity of the acting or viewing user. Every read that computes
/// per-viewer flags takes one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<UserId> for Uuid {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_private: bool,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Password hash kept apart from `User` so it never travels with profiles.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub password_hash: String,
    pub is_active: bool,
}

/// Compact author/actor card embedded in posts, comments and lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub profile_image_url: Option<String>,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProfileStats {
    pub followers_count: u64,
    pub following_count: u64,
    pub posts_count: u64,
    pub is_following: bool,
    pub is_followed_by: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    /// Only present when the viewer is the profile owner.
    pub email: Option<String>,
    pub full_name: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub is_verified: bool,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub followers_count: u64,
    pub following_count: u64,
    pub posts_count: u64,
    pub is_following: bool,
    pub is_followed_by: bool,
}

impl UserProfile {
    pub fn build(user: User, stats: ProfileStats, viewer: Option<UserId>) -> Self {
        let is_self = viewer.map(|v| v.value() == user.id).unwrap_or(false);
        Self {
            id: user.id,
            username: user.username,
            email: is_self.then_some(user.email),
            full_name: user.full_name,
            bio: user.bio,
            profile_image_url: user.profile_image_url,
            cover_image_url: user.cover_image_url,
            website: user.website,
            location: user.location,
            is_verified: user.is_verified,
            is_private: user.is_private,
            created_at: user.created_at,
            followers_count: stats.followers_count,
            following_count: stats.following_count,
            posts_count: stats.posts_count,
            is_following: stats.is_following,
            is_followed_by: stats.is_followed_by,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub bio: PatchField<String>,
    #[serde(default)]
    pub profile_image_url: PatchField<String>,
    #[serde(default)]
    pub cover_image_url: PatchField<String>,
    #[serde(default)]
    pub website: PatchField<String>,
    #[serde(default)]
    pub location: PatchField<String>,
    #[serde(default)]
    pub date_of_birth: PatchField<NaiveDate>,
    #[serde(default)]
    pub is_private: Option<bool>,
}
