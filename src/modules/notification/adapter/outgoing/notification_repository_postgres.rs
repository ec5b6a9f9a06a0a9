use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::sea_orm_entity::notifications;
use crate::notification::application::domain::entities::{
    NewNotification, Notification, NotificationType,
};
use crate::notification::application::ports::outgoing::NotificationRepository;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store::Store;
use crate::shared::store_error::{entity, StoreError};
use crate::shared::tombstone::{ActiveOnly, RowStatus};
use crate::user::adapter::outgoing::sea_orm_entity::users;
use crate::user::adapter::outgoing::{active_user_ids, load_user_summaries};

/// Writes a notification on the caller's connection, usually an open
/// transaction. Self-actions are skipped and yield `None`.
pub(crate) async fn notify<C: ConnectionTrait>(
    conn: &C,
    now: DateTimeWithTimeZone,
    new: NewNotification,
) -> Result<Option<Uuid>, DbErr> {
    if new.is_self_action() {
        return Ok(None);
    }

    let id = Uuid::new_v4();
    notifications::ActiveModel {
        id: Set(id),
        recipient_id: Set(new.recipient_id),
        actor_id: Set(new.actor_id),
        notification_type: Set(new.kind),
        post_id: Set(new.post_id),
        comment_id: Set(new.comment_id),
        is_read: Set(false),
        created_at: Set(now),
        status: Set(RowStatus::Active),
        deleted_at: Set(None),
    }
    .insert(conn)
    .await?;

    Ok(Some(id))
}

/// Mention notifications for every active user named in `usernames`.
pub(crate) async fn notify_mentions<C: ConnectionTrait>(
    conn: &C,
    now: DateTimeWithTimeZone,
    actor_id: Uuid,
    usernames: &[String],
    post_id: Uuid,
    comment_id: Option<Uuid>,
) -> Result<u64, DbErr> {
    if usernames.is_empty() {
        return Ok(0);
    }

    let recipients: Vec<Uuid> = users::Entity::find()
        .active()
        .filter(users::Column::Username.is_in(usernames.iter().cloned()))
        .select_only()
        .column(users::Column::Id)
        .into_tuple()
        .all(conn)
        .await?;

    let mut sent = 0;
    for recipient_id in recipients {
        let mut new =
            NewNotification::new(recipient_id, actor_id, NotificationType::Mention).on_post(post_id);
        if let Some(comment_id) = comment_id {
            new = new.on_comment(comment_id);
        }
        if notify(conn, now, new).await?.is_some() {
            sent += 1;
        }
    }
    Ok(sent)
}

#[derive(Clone)]
pub struct NotificationRepositoryPostgres {
    store: Store,
}

impl NotificationRepositoryPostgres {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NotificationRepository for NotificationRepositoryPostgres {
    async fn list(
        &self,
        recipient_id: Uuid,
        page: PageRequest,
        unread_only: bool,
    ) -> Result<PageResult<Notification>, StoreError> {
        let conn = self.store.conn();

        let mut query = notifications::Entity::find()
            .active()
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .filter(notifications::Column::ActorId.in_subquery(active_user_ids()));
        if unread_only {
            query = query.filter(notifications::Column::IsRead.eq(false));
        }

        let total = query.clone().count(conn).await?;
        let rows = query
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await?;

        let actors = load_user_summaries(conn, rows.iter().map(|n| n.actor_id)).await?;

        let items = rows
            .into_iter()
            .filter_map(|n| {
                let actor = actors.get(&n.actor_id)?.clone();
                Some(Notification {
                    id: n.id,
                    recipient_id: n.recipient_id,
                    actor,
                    kind: n.notification_type,
                    post_id: n.post_id,
                    comment_id: n.comment_id,
                    is_read: n.is_read,
                    created_at: n.created_at.to_utc(),
                })
            })
            .collect();

        Ok(PageResult::new(items, page, total))
    }

    async fn unread_count(&self, recipient_id: Uuid) -> Result<u64, StoreError> {
        let count = notifications::Entity::find()
            .active()
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .filter(notifications::Column::IsRead.eq(false))
            .filter(notifications::Column::ActorId.in_subquery(active_user_ids()))
            .count(self.store.conn())
            .await?;
        Ok(count)
    }

    async fn mark_read(
        &self,
        recipient_id: Uuid,
        notification_id: Uuid,
    ) -> Result<(), StoreError> {
        let conn = self.store.conn();

        let found = notifications::Entity::find_by_id(notification_id)
            .active()
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .one(conn)
            .await?
            .ok_or(StoreError::NotFound(entity::NOTIFICATION))?;

        if found.is_read {
            return Ok(());
        }

        notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::Id.eq(found.id))
            .exec(conn)
            .await?;

        Ok(())
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64, StoreError> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .filter(notifications::Column::IsRead.eq(false))
            .filter(notifications::Column::Status.eq(RowStatus::Active))
            .exec(self.store.conn())
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction};
    use std::sync::Arc;

    fn model(recipient_id: Uuid, is_read: bool) -> notifications::Model {
        notifications::Model {
            id: Uuid::new_v4(),
            recipient_id,
            actor_id: Uuid::new_v4(),
            notification_type: NotificationType::Follow,
            post_id: None,
            comment_id: None,
            is_read,
            created_at: Utc::now().fixed_offset(),
            status: RowStatus::Active,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_notify_skips_self_action() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let me = Uuid::new_v4();

        let result = notify(
            &db,
            Utc::now().fixed_offset(),
            NewNotification::new(me, me, NotificationType::Like),
        )
        .await
        .unwrap();

        assert!(result.is_none());
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_notify_inserts_row() {
        let recipient = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model(recipient, false)]])
            .into_connection();

        let result = notify(
            &db,
            Utc::now().fixed_offset(),
            NewNotification::new(recipient, Uuid::new_v4(), NotificationType::Follow),
        )
        .await
        .unwrap();

        assert!(result.is_some());
        let log: Vec<Transaction> = db.into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_foreign_notification_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<notifications::Model>::new()])
            .into_connection();

        let repo = NotificationRepositoryPostgres::new(Store::with_system_clock(Arc::new(db)));
        let result = repo.mark_read(Uuid::new_v4(), Uuid::new_v4()).await;

        assert_eq!(
            result.unwrap_err(),
            StoreError::NotFound(entity::NOTIFICATION)
        );
    }

    #[tokio::test]
    async fn test_mark_read_already_read_is_noop() {
        let recipient = Uuid::new_v4();
        let row = model(recipient, true);
        let id = row.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![row]])
            .into_connection();

        let repo = NotificationRepositoryPostgres::new(Store::with_system_clock(Arc::new(db)));
        assert!(repo.mark_read(recipient, id).await.is_ok());
    }

    #[tokio::test]
    async fn test_mark_all_read_returns_updated_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 4,
            }])
            .into_connection();

        let repo = NotificationRepositoryPostgres::new(Store::with_system_clock(Arc::new(db)));
        assert_eq!(repo.mark_all_read(Uuid::new_v4()).await.unwrap(), 4);
    }
}
