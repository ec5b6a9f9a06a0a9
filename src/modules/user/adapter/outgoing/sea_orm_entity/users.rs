use sea_orm::entity::prelude::*;

use crate::shared::tombstone::{RowStatus, SoftDelete};
use crate::user::application::domain::entities::{User, UserCredentials, UserRole, UserSummary};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub date_of_birth: Option<Date>,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_private: bool,
    pub is_active: bool,
    pub last_login_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub status: RowStatus,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDelete for Entity {
    fn status_column() -> Column {
        Column::Status
    }

    fn deleted_at_column() -> Column {
        Column::DeletedAt
    }
}

impl Model {
    pub fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            bio: self.bio,
            profile_image_url: self.profile_image_url,
            cover_image_url: self.cover_image_url,
            website: self.website,
            location: self.location,
            date_of_birth: self.date_of_birth,
            role: self.role,
            is_verified: self.is_verified,
            is_private: self.is_private,
            is_active: self.is_active,
            last_login_at: self.last_login_at.map(|t| t.to_utc()),
            created_at: self.created_at.to_utc(),
            updated_at: self.updated_at.to_utc(),
        }
    }

    pub fn to_credentials(&self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            password_hash: self.password_hash.clone(),
            is_active: self.is_active,
        }
    }

    pub fn to_summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            profile_image_url: self.profile_image_url.clone(),
            is_verified: self.is_verified,
        }
    }
}
