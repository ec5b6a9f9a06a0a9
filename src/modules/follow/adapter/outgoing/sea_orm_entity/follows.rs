use sea_orm::entity::prelude::*;

use crate::follow::application::domain::entities::{Follow, FollowStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "follows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub status: FollowStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn to_domain(self) -> Follow {
        Follow {
            id: self.id,
            follower_id: self.follower_id,
            following_id: self.following_id,
            status: self.status,
            created_at: self.created_at.to_utc(),
        }
    }
}
