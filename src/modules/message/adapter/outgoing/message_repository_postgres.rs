use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::sea_orm_entity::messages;
use crate::message::application::domain::entities::{Conversation, Message};
use crate::message::application::ports::outgoing::{MessageRepository, NewMessage};
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store::Store;
use crate::shared::store_error::{entity, StoreError};
use crate::shared::tombstone::{ActiveOnly, RowStatus, SoftDelete};
use crate::user::adapter::outgoing::{active_user_ids, find_active_user, load_user_summaries};

/// Messages exchanged between `a` and `b`, in either direction.
fn between(a: Uuid, b: Uuid) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(messages::Column::SenderId.eq(a))
                .add(messages::Column::ReceiverId.eq(b)),
        )
        .add(
            Condition::all()
                .add(messages::Column::SenderId.eq(b))
                .add(messages::Column::ReceiverId.eq(a)),
        )
}

fn unread_for(reader: Uuid) -> Select<messages::Entity> {
    messages::Entity::find()
        .active()
        .filter(messages::Column::ReceiverId.eq(reader))
        .filter(messages::Column::IsRead.eq(false))
        .filter(messages::Column::SenderId.in_subquery(active_user_ids()))
}

#[derive(Clone)]
pub struct MessageRepositoryPostgres {
    store: Store,
}

impl MessageRepositoryPostgres {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    async fn partners(&self, viewer: Uuid) -> Result<HashSet<Uuid>, StoreError> {
        let conn = self.store.conn();

        let sent_to: Vec<Uuid> = messages::Entity::find()
            .active()
            .filter(messages::Column::SenderId.eq(viewer))
            .select_only()
            .column(messages::Column::ReceiverId)
            .distinct()
            .into_tuple()
            .all(conn)
            .await?;

        let received_from: Vec<Uuid> = messages::Entity::find()
            .active()
            .filter(messages::Column::ReceiverId.eq(viewer))
            .select_only()
            .column(messages::Column::SenderId)
            .distinct()
            .into_tuple()
            .all(conn)
            .await?;

        Ok(sent_to.into_iter().chain(received_from).collect())
    }
}

#[async_trait]
impl MessageRepository for MessageRepositoryPostgres {
    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let conn = self.store.conn();

        find_active_user(conn, message.sender_id)
            .await?
            .ok_or(StoreError::NotFound(entity::USER))?;
        find_active_user(conn, message.receiver_id)
            .await?
            .ok_or(StoreError::NotFound(entity::USER))?;

        let model = messages::ActiveModel {
            id: Set(Uuid::new_v4()),
            sender_id: Set(message.sender_id),
            receiver_id: Set(message.receiver_id),
            content: Set(message.content),
            media_url: Set(message.media_url),
            media_type: Set(message.media_type),
            is_read: Set(false),
            read_at: Set(None),
            created_at: Set(self.store.now()),
            status: Set(RowStatus::Active),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await?;

        Ok(model.to_domain())
    }

    async fn find_message(&self, message_id: Uuid) -> Result<Option<Message>, StoreError> {
        let found = messages::Entity::find_by_id(message_id)
            .active()
            .one(self.store.conn())
            .await?;
        Ok(found.map(messages::Model::to_domain))
    }

    async fn mark_read(&self, message_id: Uuid) -> Result<Message, StoreError> {
        let conn = self.store.conn();

        messages::Entity::update_many()
            .col_expr(messages::Column::IsRead, Expr::value(true))
            .col_expr(messages::Column::ReadAt, Expr::value(self.store.now()))
            .filter(messages::Column::Id.eq(message_id))
            .filter(messages::Column::Status.eq(RowStatus::Active))
            .filter(messages::Column::IsRead.eq(false))
            .exec(conn)
            .await?;

        self.find_message(message_id)
            .await?
            .ok_or(StoreError::NotFound(entity::MESSAGE))
    }

    async fn mark_conversation_read(&self, reader: Uuid, other: Uuid) -> Result<u64, StoreError> {
        let updated = messages::Entity::update_many()
            .col_expr(messages::Column::IsRead, Expr::value(true))
            .col_expr(messages::Column::ReadAt, Expr::value(self.store.now()))
            .filter(messages::Column::ReceiverId.eq(reader))
            .filter(messages::Column::SenderId.eq(other))
            .filter(messages::Column::Status.eq(RowStatus::Active))
            .filter(messages::Column::IsRead.eq(false))
            .exec(self.store.conn())
            .await?;
        Ok(updated.rows_affected)
    }

    async fn conversation(
        &self,
        viewer: Uuid,
        other: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<Message>, StoreError> {
        let conn = self.store.conn();
        let query = messages::Entity::find()
            .active()
            .filter(between(viewer, other));

        let total = query.clone().count(conn).await?;
        let items = query
            .order_by_desc(messages::Column::CreatedAt)
            .order_by_desc(messages::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await?
            .into_iter()
            .map(messages::Model::to_domain)
            .collect();

        Ok(PageResult::new(items, page, total))
    }

    async fn conversations(&self, viewer: Uuid) -> Result<Vec<Conversation>, StoreError> {
        let conn = self.store.conn();
        let partners = self.partners(viewer).await?;
        let summaries = load_user_summaries(conn, partners.iter().copied()).await?;

        let unread: HashMap<Uuid, u64> = unread_for(viewer)
            .select_only()
            .column(messages::Column::SenderId)
            .column_as(Expr::col(messages::Column::Id).count(), "unread")
            .group_by(messages::Column::SenderId)
            .into_tuple::<(Uuid, i64)>()
            .all(conn)
            .await?
            .into_iter()
            .map(|(sender, n)| (sender, n.max(0) as u64))
            .collect();

        let mut conversations = Vec::with_capacity(summaries.len());
        for (partner_id, partner) in summaries {
            let last = messages::Entity::find()
                .active()
                .filter(between(viewer, partner_id))
                .order_by_desc(messages::Column::CreatedAt)
                .order_by_desc(messages::Column::Id)
                .one(conn)
                .await?;

            if let Some(last) = last {
                conversations.push(Conversation {
                    partner,
                    last_message: last.to_domain(),
                    unread_count: unread.get(&partner_id).copied().unwrap_or(0),
                });
            }
        }

        conversations.sort_by(|a, b| {
            b.last_message
                .created_at
                .cmp(&a.last_message.created_at)
                .then_with(|| b.last_message.id.cmp(&a.last_message.id))
        });
        Ok(conversations)
    }

    async fn unread_count(&self, viewer: Uuid) -> Result<u64, StoreError> {
        Ok(unread_for(viewer).count(self.store.conn()).await?)
    }

    async fn soft_delete_message(&self, message_id: Uuid) -> Result<(), StoreError> {
        let removed = messages::Entity::soft_delete_many(self.store.now())
            .filter(messages::Column::Id.eq(message_id))
            .exec(self.store.conn())
            .await?;

        if removed.rows_affected == 0 {
            return Err(StoreError::NotFound(entity::MESSAGE));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::fixtures::user_row;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait};
    use std::sync::Arc;

    fn repo(db: MockDatabase) -> MessageRepositoryPostgres {
        MessageRepositoryPostgres::new(Store::with_system_clock(Arc::new(db.into_connection())))
    }

    fn message_row(id: Uuid, is_read: bool) -> messages::Model {
        let now = Utc::now().fixed_offset();
        messages::Model {
            id,
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            content: "hey".to_string(),
            media_url: None,
            media_type: None,
            is_read,
            read_at: is_read.then_some(now),
            created_at: now,
            status: RowStatus::Active,
            deleted_at: None,
        }
    }

    #[test]
    fn test_between_matches_both_directions() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let sql = messages::Entity::find()
            .filter(between(a, b))
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert_eq!(sql.matches(&a.to_string()).count(), 2, "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results([vec![message_row(id, true)]]);

        let message = repo(db).mark_read(id).await.unwrap();

        assert!(message.is_read);
        assert!(message.read_at.is_some());
    }

    #[tokio::test]
    async fn test_send_to_missing_receiver() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            vec![user_row(Uuid::new_v4())],
            Vec::new(),
        ]);

        let err = repo(db)
            .create_message(NewMessage {
                sender_id: Uuid::new_v4(),
                receiver_id: Uuid::new_v4(),
                content: "hello".to_string(),
                media_url: None,
                media_type: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::NotFound(entity::USER));
    }

    #[tokio::test]
    async fn test_delete_missing_message() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]);

        let err = repo(db)
            .soft_delete_message(Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::NotFound(entity::MESSAGE));
    }
}
