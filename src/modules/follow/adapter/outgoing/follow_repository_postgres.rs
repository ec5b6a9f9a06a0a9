use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use super::sea_orm_entity::follows;
use crate::follow::application::domain::entities::{
    Follow, FollowEntry, FollowStatus, Relationship,
};
use crate::follow::application::ports::outgoing::FollowRepository;
use crate::notification::adapter::outgoing::notify;
use crate::notification::application::domain::entities::{NewNotification, NotificationType};
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store::{finish, Store};
use crate::shared::store_error::{entity, ConstraintKey, StoreError};
use crate::user::adapter::outgoing::{active_user_ids, find_active_user, load_user_summaries};

const FOLLOW_KEYS: &[ConstraintKey] = &[ConstraintKey {
    field: "follow",
    index: "idx_follows_pair",
    columns: "follows.follower_id, follows.following_id",
}];

/// Ids of accounts `viewer` follows with an accepted request.
pub(crate) fn accepted_following_ids(viewer: Uuid) -> SelectStatement {
    Query::select()
        .column(follows::Column::FollowingId)
        .from(follows::Entity)
        .and_where(follows::Column::FollowerId.eq(viewer))
        .and_where(follows::Column::Status.eq(FollowStatus::Accepted))
        .to_owned()
}

/// Which side of the pair a list shows.
#[derive(Debug, Clone, Copy)]
enum Side {
    Followers,
    Following,
}

#[derive(Clone)]
pub struct FollowRepositoryPostgres {
    store: Store,
}

impl FollowRepositoryPostgres {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    async fn insert_follow(
        txn: &DatabaseTransaction,
        follower_id: Uuid,
        following_id: Uuid,
        now: DateTimeWithTimeZone,
    ) -> Result<follows::Model, StoreError> {
        find_active_user(txn, follower_id)
            .await?
            .ok_or(StoreError::NotFound(entity::USER))?;
        let target = find_active_user(txn, following_id)
            .await?
            .ok_or(StoreError::NotFound(entity::USER))?;

        let model = follows::ActiveModel {
            id: Set(Uuid::new_v4()),
            follower_id: Set(follower_id),
            following_id: Set(following_id),
            status: Set(FollowStatus::for_target(target.is_private)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|e| StoreError::classify(e, FOLLOW_KEYS))?;

        notify(
            txn,
            now,
            NewNotification::new(following_id, follower_id, NotificationType::Follow),
        )
        .await?;

        Ok(model)
    }

    async fn page_of_entries(
        &self,
        query: Select<follows::Entity>,
        side: Side,
        page: PageRequest,
    ) -> Result<PageResult<FollowEntry>, StoreError> {
        let conn = self.store.conn();
        let query = match side {
            Side::Followers => {
                query.filter(follows::Column::FollowerId.in_subquery(active_user_ids()))
            }
            Side::Following => {
                query.filter(follows::Column::FollowingId.in_subquery(active_user_ids()))
            }
        };

        let total = query.clone().count(conn).await?;
        let rows = query
            .order_by_desc(follows::Column::CreatedAt)
            .order_by_desc(follows::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await?;

        let other = |row: &follows::Model| match side {
            Side::Followers => row.follower_id,
            Side::Following => row.following_id,
        };
        let users = load_user_summaries(conn, rows.iter().map(other)).await?;

        let items = rows
            .iter()
            .filter_map(|row| {
                users.get(&other(row)).map(|user| FollowEntry {
                    user: user.clone(),
                    status: row.status,
                    since: row.created_at.to_utc(),
                })
            })
            .collect();

        Ok(PageResult::new(items, page, total))
    }

    async fn find_pair(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<Option<follows::Model>, StoreError> {
        Ok(follows::Entity::find()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FollowingId.eq(following_id))
            .one(self.store.conn())
            .await?)
    }
}

#[async_trait]
impl FollowRepository for FollowRepositoryPostgres {
    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<Follow, StoreError> {
        let now = self.store.now();
        let txn = self.store.begin().await?;
        let result = Self::insert_follow(&txn, follower_id, following_id, now).await;
        finish(txn, result).await.map(follows::Model::to_domain)
    }

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<(), StoreError> {
        let removed = follows::Entity::delete_many()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FollowingId.eq(following_id))
            .exec(self.store.conn())
            .await?;

        if removed.rows_affected == 0 {
            return Err(StoreError::NotFound(entity::FOLLOW));
        }
        Ok(())
    }

    async fn accept_request(
        &self,
        owner_id: Uuid,
        follower_id: Uuid,
    ) -> Result<Follow, StoreError> {
        let now = self.store.now();
        let accepted = follows::Entity::update_many()
            .col_expr(follows::Column::Status, Expr::value(FollowStatus::Accepted))
            .col_expr(follows::Column::UpdatedAt, Expr::value(now))
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FollowingId.eq(owner_id))
            .filter(follows::Column::Status.eq(FollowStatus::Pending))
            .exec(self.store.conn())
            .await?;

        if accepted.rows_affected == 0 {
            return Err(StoreError::NotFound(entity::FOLLOW));
        }

        self.find_pair(follower_id, owner_id)
            .await?
            .map(follows::Model::to_domain)
            .ok_or(StoreError::NotFound(entity::FOLLOW))
    }

    async fn reject_request(&self, owner_id: Uuid, follower_id: Uuid) -> Result<(), StoreError> {
        let removed = follows::Entity::delete_many()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FollowingId.eq(owner_id))
            .filter(follows::Column::Status.eq(FollowStatus::Pending))
            .exec(self.store.conn())
            .await?;

        if removed.rows_affected == 0 {
            return Err(StoreError::NotFound(entity::FOLLOW));
        }
        Ok(())
    }

    async fn followers(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<FollowEntry>, StoreError> {
        let query = follows::Entity::find()
            .filter(follows::Column::FollowingId.eq(user_id))
            .filter(follows::Column::Status.eq(FollowStatus::Accepted));
        self.page_of_entries(query, Side::Followers, page).await
    }

    async fn following(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<FollowEntry>, StoreError> {
        let query = follows::Entity::find()
            .filter(follows::Column::FollowerId.eq(user_id))
            .filter(follows::Column::Status.eq(FollowStatus::Accepted));
        self.page_of_entries(query, Side::Following, page).await
    }

    async fn pending_requests(
        &self,
        owner_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<FollowEntry>, StoreError> {
        let query = follows::Entity::find()
            .filter(follows::Column::FollowingId.eq(owner_id))
            .filter(follows::Column::Status.eq(FollowStatus::Pending));
        self.page_of_entries(query, Side::Followers, page).await
    }

    async fn relationship(&self, viewer: Uuid, other: Uuid) -> Result<Relationship, StoreError> {
        let outgoing = self.find_pair(viewer, other).await?;
        let incoming = self.find_pair(other, viewer).await?;

        Ok(Relationship {
            is_following: outgoing
                .as_ref()
                .is_some_and(|f| f.status == FollowStatus::Accepted),
            is_followed_by: incoming.is_some_and(|f| f.status == FollowStatus::Accepted),
            pending: outgoing.is_some_and(|f| f.status == FollowStatus::Pending),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::sea_query::PostgresQueryBuilder;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn repo(db: MockDatabase) -> FollowRepositoryPostgres {
        FollowRepositoryPostgres::new(Store::with_system_clock(Arc::new(db.into_connection())))
    }

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    fn follow_row(follower_id: Uuid, following_id: Uuid, status: FollowStatus) -> follows::Model {
        let now = Utc::now().fixed_offset();
        follows::Model {
            id: Uuid::new_v4(),
            follower_id,
            following_id,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_accepted_following_ids_filters_status() {
        let viewer = Uuid::new_v4();
        let sql = accepted_following_ids(viewer).to_string(PostgresQueryBuilder);

        assert!(sql.contains(r#""status" = 'accepted'"#), "{sql}");
        assert!(sql.contains(&viewer.to_string()), "{sql}");
    }

    #[test]
    fn test_classify_duplicate_pair() {
        let err = DbErr::Custom(
            "UNIQUE constraint failed: follows.follower_id, follows.following_id".to_string(),
        );

        assert_eq!(
            StoreError::classify(err, FOLLOW_KEYS),
            StoreError::ConstraintViolation { field: "follow" }
        );
    }

    #[tokio::test]
    async fn test_unfollow_absent_pair_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(0)]);

        let err = repo(db)
            .unfollow(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::NotFound(entity::FOLLOW));
    }

    #[tokio::test]
    async fn test_accept_without_pending_request() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(0)]);

        let err = repo(db)
            .accept_request(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::NotFound(entity::FOLLOW));
    }

    #[tokio::test]
    async fn test_accept_returns_updated_pair() {
        let owner = Uuid::new_v4();
        let follower = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1)])
            .append_query_results([vec![follow_row(follower, owner, FollowStatus::Accepted)]]);

        let follow = repo(db).accept_request(owner, follower).await.unwrap();

        assert_eq!(follow.status, FollowStatus::Accepted);
        assert_eq!(follow.following_id, owner);
    }

    #[tokio::test]
    async fn test_relationship_reports_pending_request() {
        let viewer = Uuid::new_v4();
        let other = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            vec![follow_row(viewer, other, FollowStatus::Pending)],
            vec![follow_row(other, viewer, FollowStatus::Accepted)],
        ]);

        let rel = repo(db).relationship(viewer, other).await.unwrap();

        assert!(!rel.is_following);
        assert!(rel.pending);
        assert!(rel.is_followed_by);
    }
}
