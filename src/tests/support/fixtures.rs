use chrono::Utc;
use uuid::Uuid;

use crate::post::application::domain::entities::{Post, PostView};
use crate::shared::media::MediaType;
use crate::shared::tombstone::RowStatus;
use crate::user::adapter::outgoing::sea_orm_entity::users;
use crate::user::application::domain::entities::{UserRole, UserSummary};

pub fn summary(id: Uuid) -> UserSummary {
    UserSummary {
        id,
        username: format!("user{}", &id.simple().to_string()[..8]),
        full_name: "Test User".to_string(),
        profile_image_url: None,
        is_verified: false,
    }
}

pub fn post(id: Uuid, author_id: Uuid) -> Post {
    let now = Utc::now();
    Post {
        id,
        author_id,
        caption: Some("hello".to_string()),
        media_url: None,
        media_type: MediaType::Text,
        location: None,
        is_public: true,
        likes_count: 0,
        comments_count: 0,
        shares_count: 0,
        views_count: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn post_view(id: Uuid, author_id: Uuid) -> PostView {
    PostView {
        post: post(id, author_id),
        author: summary(author_id),
        hashtags: Vec::new(),
        is_liked: false,
    }
}

pub fn user_row(id: Uuid) -> users::Model {
    let now = Utc::now().fixed_offset();
    users::Model {
        id,
        username: "carol".to_string(),
        email: "carol@example.com".to_string(),
        password_hash: "hash".to_string(),
        full_name: "Carol".to_string(),
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
        status: RowStatus::Active,
        deleted_at: None,
    }
}
