use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SocialError;
use crate::user::application::domain::entities::UserSummary;

/// What a like points at. Exactly one of post or comment, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum LikeTarget {
    Post(Uuid),
    Comment(Uuid),
}

impl LikeTarget {
    /// Builds a target from the two nullable columns of a like row or request.
    pub fn from_parts(
        post_id: Option<Uuid>,
        comment_id: Option<Uuid>,
    ) -> Result<Self, SocialError> {
        match (post_id, comment_id) {
            (Some(post_id), None) => Ok(LikeTarget::Post(post_id)),
            (None, Some(comment_id)) => Ok(LikeTarget::Comment(comment_id)),
            _ => Err(SocialError::InvalidLikeTarget),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            LikeTarget::Post(id) | LikeTarget::Comment(id) => *id,
        }
    }

    pub fn post_id(&self) -> Option<Uuid> {
        match self {
            LikeTarget::Post(id) => Some(*id),
            LikeTarget::Comment(_) => None,
        }
    }

    pub fn comment_id(&self) -> Option<Uuid> {
        match self {
            LikeTarget::Comment(id) => Some(*id),
            LikeTarget::Post(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: LikeTarget,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Liker {
    pub user: UserSummary,
    pub liked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_accepts_exactly_one_target() {
        let id = Uuid::new_v4();

        assert_eq!(LikeTarget::from_parts(Some(id), None), Ok(LikeTarget::Post(id)));
        assert_eq!(
            LikeTarget::from_parts(None, Some(id)),
            Ok(LikeTarget::Comment(id))
        );
    }

    #[test]
    fn test_from_parts_rejects_both_and_neither() {
        let id = Uuid::new_v4();

        assert_eq!(
            LikeTarget::from_parts(Some(id), Some(id)),
            Err(SocialError::InvalidLikeTarget)
        );
        assert_eq!(
            LikeTarget::from_parts(None, None),
            Err(SocialError::InvalidLikeTarget)
        );
    }

    #[test]
    fn test_target_accessors() {
        let id = Uuid::new_v4();
        let target = LikeTarget::Comment(id);

        assert_eq!(target.id(), id);
        assert_eq!(target.comment_id(), Some(id));
        assert_eq!(target.post_id(), None);
    }

    #[test]
    fn test_target_serializes_tagged() {
        let id = Uuid::nil();
        let json = serde_json::to_value(LikeTarget::Post(id)).unwrap();

        assert_eq!(json["type"], "post");
        assert_eq!(json["id"], id.to_string());
    }
}
