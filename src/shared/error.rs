use serde::Serialize;

use crate::shared::store_error::{entity, invariant, StoreError};

/// Error classes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    ConstraintViolation,
    DomainInvariantViolation,
    AlreadyExists,
    Unauthorized,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SocialError {
    // User errors
    #[error("user not found")]
    UserNotFound,
    #[error("email already in use")]
    EmailAlreadyUsed,
    #[error("username already in use")]
    UsernameAlreadyUsed,
    #[error("invalid credentials")]
    InvalidCredentials,

    // Post / comment errors
    #[error("post not found")]
    PostNotFound,
    #[error("comment not found")]
    CommentNotFound,
    #[error("replies must target a top-level comment of the same post")]
    InvalidParentComment,
    #[error("unauthorized to perform this action")]
    UnauthorizedAction,

    // Follow errors
    #[error("already following this user")]
    AlreadyFollowing,
    #[error("not following this user")]
    NotFollowing,
    #[error("cannot follow yourself")]
    CannotFollowSelf,
    #[error("follow request not found")]
    FollowRequestNotFound,

    // Like errors
    #[error("already liked")]
    AlreadyLiked,
    #[error("not liked yet")]
    NotLiked,
    #[error("a like must target exactly one of a post or a comment")]
    InvalidLikeTarget,

    // Message errors
    #[error("message not found")]
    MessageNotFound,
    #[error("cannot message yourself")]
    CannotMessageSelf,

    // Story errors
    #[error("story not found")]
    StoryNotFound,
    #[error("story has expired")]
    StoryExpired,

    #[error("notification not found")]
    NotificationNotFound,
    #[error("hashtag not found")]
    HashtagNotFound,

    // Validation / constraint errors
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("constraint violated on {field}")]
    ConstraintViolation { field: &'static str },

    /// Detail is logged, never displayed.
    #[error("internal server error")]
    Internal(String),
}

/// Serializable error payload: stable code plus a display message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub kind: ErrorKind,
    pub message: String,
}

impl SocialError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        SocialError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SocialError::UserNotFound => "user_not_found",
            SocialError::EmailAlreadyUsed => "email_already_used",
            SocialError::UsernameAlreadyUsed => "username_already_used",
            SocialError::InvalidCredentials => "invalid_credentials",
            SocialError::PostNotFound => "post_not_found",
            SocialError::CommentNotFound => "comment_not_found",
            SocialError::InvalidParentComment => "invalid_parent_comment",
            SocialError::UnauthorizedAction => "unauthorized_action",
            SocialError::AlreadyFollowing => "already_following",
            SocialError::NotFollowing => "not_following",
            SocialError::CannotFollowSelf => "cannot_follow_self",
            SocialError::FollowRequestNotFound => "follow_request_not_found",
            SocialError::AlreadyLiked => "already_liked",
            SocialError::NotLiked => "not_liked",
            SocialError::InvalidLikeTarget => "invalid_like_target",
            SocialError::MessageNotFound => "message_not_found",
            SocialError::CannotMessageSelf => "cannot_message_self",
            SocialError::StoryNotFound => "story_not_found",
            SocialError::StoryExpired => "story_expired",
            SocialError::NotificationNotFound => "notification_not_found",
            SocialError::HashtagNotFound => "hashtag_not_found",
            SocialError::Validation { .. } => "validation_failed",
            SocialError::ConstraintViolation { .. } => "constraint_violation",
            SocialError::Internal(_) => "internal_error",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SocialError::UserNotFound
            | SocialError::PostNotFound
            | SocialError::CommentNotFound
            | SocialError::FollowRequestNotFound
            | SocialError::MessageNotFound
            | SocialError::StoryNotFound
            | SocialError::StoryExpired
            | SocialError::NotificationNotFound
            | SocialError::HashtagNotFound
            | SocialError::NotFollowing
            | SocialError::NotLiked => ErrorKind::NotFound,

            SocialError::EmailAlreadyUsed
            | SocialError::UsernameAlreadyUsed
            | SocialError::AlreadyFollowing
            | SocialError::AlreadyLiked => ErrorKind::AlreadyExists,

            SocialError::CannotFollowSelf
            | SocialError::CannotMessageSelf
            | SocialError::InvalidLikeTarget
            | SocialError::InvalidParentComment => ErrorKind::DomainInvariantViolation,

            SocialError::Validation { .. } | SocialError::ConstraintViolation { .. } => {
                ErrorKind::ConstraintViolation
            }

            SocialError::InvalidCredentials | SocialError::UnauthorizedAction => {
                ErrorKind::Unauthorized
            }

            SocialError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<StoreError> for SocialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(name) => match name {
                entity::USER => SocialError::UserNotFound,
                entity::POST => SocialError::PostNotFound,
                entity::COMMENT => SocialError::CommentNotFound,
                entity::LIKE => SocialError::NotLiked,
                entity::FOLLOW => SocialError::NotFollowing,
                entity::STORY => SocialError::StoryNotFound,
                entity::MESSAGE => SocialError::MessageNotFound,
                entity::NOTIFICATION => SocialError::NotificationNotFound,
                entity::HASHTAG => SocialError::HashtagNotFound,
                other => SocialError::Internal(format!("unmapped entity: {other}")),
            },
            StoreError::ConstraintViolation { field } => {
                SocialError::ConstraintViolation { field }
            }
            StoreError::Invariant(rule) => match rule {
                invariant::COMMENT_PARENT => SocialError::InvalidParentComment,
                invariant::STORY_EXPIRED => SocialError::StoryExpired,
                other => SocialError::Internal(format!("unmapped invariant: {other}")),
            },
            StoreError::DatabaseError(msg) => {
                tracing::error!(error = %msg, "Store failure");
                SocialError::Internal(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error_hides_store_text() {
        let err = SocialError::from(StoreError::DatabaseError(
            "relation \"users\" does not exist".to_string(),
        ));

        assert_eq!(err.to_string(), "internal server error");
        assert_eq!(err.code(), "internal_error");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_not_found_maps_by_entity() {
        assert_eq!(
            SocialError::from(StoreError::NotFound(entity::STORY)),
            SocialError::StoryNotFound
        );
        assert_eq!(
            SocialError::from(StoreError::NotFound(entity::LIKE)),
            SocialError::NotLiked
        );
    }

    #[test]
    fn test_invariants_are_domain_errors() {
        let err = SocialError::from(StoreError::Invariant(invariant::COMMENT_PARENT));

        assert_eq!(err, SocialError::InvalidParentComment);
        assert_eq!(err.kind(), ErrorKind::DomainInvariantViolation);
    }

    #[test]
    fn test_body_serializes_stable_code() {
        let body = SocialError::CannotFollowSelf.body();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["code"], "cannot_follow_self");
        assert_eq!(json["kind"], "domain_invariant_violation");
        assert_eq!(json["message"], "cannot follow yourself");
    }
}
