use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::media::MediaType;
use crate::shared::patch::PatchField;
use crate::user::application::domain::entities::UserSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub media_type: MediaType,
    pub location: Option<String>,
    pub is_public: bool,
    pub likes_count: u64,
    pub comments_count: u64,
    pub shares_count: u64,
    pub views_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: UserSummary,
    pub hashtags: Vec<String>,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default = "default_media_type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

fn default_media_type() -> MediaType {
    MediaType::Text
}

impl Default for CreatePost {
    fn default() -> Self {
        Self {
            caption: None,
            media_url: None,
            media_type: MediaType::Text,
            location: None,
            is_public: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePost {
    #[serde(default)]
    pub caption: PatchField<String>,
    #[serde(default)]
    pub location: PatchField<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_post_defaults() {
        let input: CreatePost = serde_json::from_str(r#"{"caption": "hello"}"#).unwrap();

        assert_eq!(input.media_type, MediaType::Text);
        assert!(input.is_public.is_none());
        assert_eq!(input.caption.as_deref(), Some("hello"));
    }
}
