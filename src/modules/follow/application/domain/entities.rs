use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::application::domain::entities::UserSummary;

/// Follows of private accounts wait for approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
}

impl FollowStatus {
    pub fn for_target(target_is_private: bool) -> Self {
        if target_is_private {
            FollowStatus::Pending
        } else {
            FollowStatus::Accepted
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub status: FollowStatus,
    pub created_at: DateTime<Utc>,
}

/// One row of a followers, following or pending-requests list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowEntry {
    pub user: UserSummary,
    pub status: FollowStatus,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Relationship {
    pub is_following: bool,
    pub is_followed_by: bool,
    /// The viewer asked to follow and is still waiting.
    pub pending: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_targets_start_pending() {
        assert_eq!(FollowStatus::for_target(true), FollowStatus::Pending);
        assert_eq!(FollowStatus::for_target(false), FollowStatus::Accepted);
    }
}
