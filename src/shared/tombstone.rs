use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, StringLen};
use sea_orm::{Select, UpdateMany};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a soft-deletable row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

/// Entities whose rows are tombstoned instead of removed.
pub trait SoftDelete: EntityTrait {
    fn status_column() -> Self::Column;
    fn deleted_at_column() -> Self::Column;

    /// UPDATE that tombstones every still-active row matched by later filters.
    fn soft_delete_many(at: DateTimeWithTimeZone) -> UpdateMany<Self> {
        Self::update_many()
            .col_expr(Self::status_column(), Expr::value(RowStatus::Deleted))
            .col_expr(Self::deleted_at_column(), Expr::value(at))
            .filter(Self::status_column().eq(RowStatus::Active))
    }
}

/// Every read path goes through `.active()`; there is no other tombstone filter.
pub trait ActiveOnly {
    fn active(self) -> Self;
}

impl<E> ActiveOnly for Select<E>
where
    E: SoftDelete,
{
    fn active(self) -> Self {
        self.filter(E::status_column().eq(RowStatus::Active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::post::adapter::outgoing::sea_orm_entity::posts;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_active_filter_renders_status_predicate() {
        let sql = posts::Entity::find()
            .active()
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""posts"."status" = 'active'"#), "{sql}");
    }

    #[test]
    fn test_soft_delete_many_only_touches_active_rows() {
        let now = chrono::Utc::now().fixed_offset();
        let sql = posts::Entity::soft_delete_many(now)
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""status" = 'deleted'"#), "{sql}");
        assert!(sql.contains(r#""posts"."status" = 'active'"#), "{sql}");
    }
}
