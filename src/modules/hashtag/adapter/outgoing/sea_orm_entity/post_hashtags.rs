use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post_hashtags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub post_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub hashtag_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hashtags::Entity",
        from = "Column::HashtagId",
        to = "super::hashtags::Column::Id",
        on_delete = "Cascade"
    )]
    Hashtags,
}

impl Related<super::hashtags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hashtags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
