use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::sea_orm_entity::users;
use crate::comment::adapter::outgoing::soft_delete_comments;
use crate::comment::adapter::outgoing::sea_orm_entity::comments;
use crate::follow::adapter::outgoing::sea_orm_entity::follows;
use crate::follow::application::domain::entities::FollowStatus;
use crate::like::adapter::outgoing::remove_likes_by_user;
use crate::message::adapter::outgoing::sea_orm_entity::messages;
use crate::notification::adapter::outgoing::sea_orm_entity::notifications;
use crate::post::adapter::outgoing::sea_orm_entity::posts;
use crate::post::adapter::outgoing::soft_delete_posts;
use crate::shared::store::{finish, Store};
use crate::shared::store_error::{entity, ConstraintKey, StoreError};
use crate::shared::tombstone::{ActiveOnly, RowStatus, SoftDelete};
use crate::story::adapter::outgoing::sea_orm_entity::stories;
use crate::user::application::domain::entities::{
    ProfileStats, User, UserCredentials, UserRole, UserSummary,
};
use crate::user::application::ports::outgoing::{NewUser, ProfileChanges, UserRepository};

const USER_KEYS: &[ConstraintKey] = &[
    ConstraintKey {
        field: "email",
        index: "idx_users_email",
        columns: "users.email",
    },
    ConstraintKey {
        field: "username",
        index: "idx_users_username",
        columns: "users.username",
    },
];

#[derive(Clone)]
pub struct UserRepositoryPostgres {
    store: Store,
}

impl UserRepositoryPostgres {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    async fn cascade_delete(
        txn: &DatabaseTransaction,
        user_id: Uuid,
        now: sea_orm::prelude::DateTimeWithTimeZone,
    ) -> Result<(), StoreError> {
        let tombstoned = users::Entity::soft_delete_many(now)
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(user_id))
            .exec(txn)
            .await?;

        if tombstoned.rows_affected == 0 {
            return Err(StoreError::NotFound(entity::USER));
        }

        // Likes first so counters on surviving posts and comments drop.
        remove_likes_by_user(txn, user_id, now).await?;

        soft_delete_posts(txn, Condition::all().add(posts::Column::UserId.eq(user_id)), now)
            .await?;

        soft_delete_comments(
            txn,
            Condition::all().add(comments::Column::UserId.eq(user_id)),
            now,
        )
        .await?;

        stories::Entity::soft_delete_many(now)
            .filter(stories::Column::UserId.eq(user_id))
            .exec(txn)
            .await?;

        messages::Entity::soft_delete_many(now)
            .filter(messages::Column::SenderId.eq(user_id))
            .exec(txn)
            .await?;

        notifications::Entity::soft_delete_many(now)
            .filter(
                Condition::any()
                    .add(notifications::Column::RecipientId.eq(user_id))
                    .add(notifications::Column::ActorId.eq(user_id)),
            )
            .exec(txn)
            .await?;

        follows::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(follows::Column::FollowerId.eq(user_id))
                    .add(follows::Column::FollowingId.eq(user_id)),
            )
            .exec(txn)
            .await?;

        Ok(())
    }
}

/// Active user row, if any.
pub(crate) async fn find_active_user<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find_by_id(user_id)
        .active()
        .one(conn)
        .await
}

/// Summaries for the given ids; tombstoned users are left out.
pub(crate) async fn load_user_summaries<C, I>(
    conn: &C,
    ids: I,
) -> Result<HashMap<Uuid, UserSummary>, DbErr>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = Uuid>,
{
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = users::Entity::find()
        .active()
        .filter(users::Column::Id.is_in(ids))
        .all(conn)
        .await?;

    Ok(rows.iter().map(|u| (u.id, u.to_summary())).collect())
}

/// Subquery selecting the ids of every non-tombstoned user.
pub(crate) fn active_user_ids() -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(users::Column::Id)
        .from(users::Entity)
        .and_where(users::Column::Status.eq(RowStatus::Active))
        .to_owned()
}

/// Active accounts whose content is visible to everyone.
pub(crate) fn public_user_ids() -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(users::Column::Id)
        .from(users::Entity)
        .and_where(users::Column::Status.eq(RowStatus::Active))
        .and_where(users::Column::IsPrivate.eq(false))
        .to_owned()
}

#[async_trait]
impl UserRepository for UserRepositoryPostgres {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let now = self.store.now();

        let active = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            full_name: Set(user.full_name),
            bio: Set(None),
            profile_image_url: Set(None),
            cover_image_url: Set(None),
            website: Set(None),
            location: Set(None),
            date_of_birth: Set(None),
            role: Set(UserRole::User),
            is_verified: Set(false),
            is_private: Set(false),
            is_active: Set(true),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            status: Set(RowStatus::Active),
            deleted_at: Set(None),
        };

        let inserted = active
            .insert(self.store.conn())
            .await
            .map_err(|e| StoreError::classify(e, USER_KEYS))?;

        Ok(inserted.to_domain())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let found = find_active_user(self.store.conn(), user_id).await?;
        Ok(found.map(users::Model::to_domain))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let found = users::Entity::find()
            .active()
            .filter(users::Column::Username.eq(username))
            .one(self.store.conn())
            .await?;

        Ok(found.map(users::Model::to_domain))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let found = users::Entity::find()
            .active()
            .filter(users::Column::Email.eq(email))
            .one(self.store.conn())
            .await?;

        Ok(found.as_ref().map(users::Model::to_credentials))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(self.store.conn())
            .await?;
        Ok(count > 0)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(self.store.conn())
            .await?;
        Ok(count > 0)
    }

    async fn profile_stats(
        &self,
        viewer: Option<Uuid>,
        user_id: Uuid,
    ) -> Result<ProfileStats, StoreError> {
        let conn = self.store.conn();

        let followers_count = follows::Entity::find()
            .filter(follows::Column::FollowingId.eq(user_id))
            .filter(follows::Column::Status.eq(FollowStatus::Accepted))
            .filter(follows::Column::FollowerId.in_subquery(active_user_ids()))
            .count(conn)
            .await?;

        let following_count = follows::Entity::find()
            .filter(follows::Column::FollowerId.eq(user_id))
            .filter(follows::Column::Status.eq(FollowStatus::Accepted))
            .filter(follows::Column::FollowingId.in_subquery(active_user_ids()))
            .count(conn)
            .await?;

        let posts_count = posts::Entity::find()
            .active()
            .filter(posts::Column::UserId.eq(user_id))
            .count(conn)
            .await?;

        let (is_following, is_followed_by) = match viewer {
            Some(viewer) if viewer != user_id => {
                let edges = follows::Entity::find()
                    .filter(follows::Column::Status.eq(FollowStatus::Accepted))
                    .filter(
                        Condition::any()
                            .add(
                                Condition::all()
                                    .add(follows::Column::FollowerId.eq(viewer))
                                    .add(follows::Column::FollowingId.eq(user_id)),
                            )
                            .add(
                                Condition::all()
                                    .add(follows::Column::FollowerId.eq(user_id))
                                    .add(follows::Column::FollowingId.eq(viewer)),
                            ),
                    )
                    .all(conn)
                    .await?;

                (
                    edges.iter().any(|f| f.follower_id == viewer),
                    edges.iter().any(|f| f.follower_id == user_id),
                )
            }
            _ => (false, false),
        };

        Ok(ProfileStats {
            followers_count,
            following_count,
            posts_count,
            is_following,
            is_followed_by,
        })
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, StoreError> {
        let conn = self.store.conn();

        let existing = find_active_user(conn, user_id)
            .await?
            .ok_or(StoreError::NotFound(entity::USER))?;

        let mut active: users::ActiveModel = existing.into();

        if let Some(full_name) = changes.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(bio) = changes.bio {
            active.bio = Set(bio);
        }
        if let Some(url) = changes.profile_image_url {
            active.profile_image_url = Set(url);
        }
        if let Some(url) = changes.cover_image_url {
            active.cover_image_url = Set(url);
        }
        if let Some(website) = changes.website {
            active.website = Set(website);
        }
        if let Some(location) = changes.location {
            active.location = Set(location);
        }
        if let Some(dob) = changes.date_of_birth {
            active.date_of_birth = Set(dob);
        }
        if let Some(is_private) = changes.is_private {
            active.is_private = Set(is_private);
        }
        active.updated_at = Set(self.store.now());

        let updated = active
            .update(conn)
            .await
            .map_err(|e| StoreError::classify(e, USER_KEYS))?;

        Ok(updated.to_domain())
    }

    async fn record_login(&self, user_id: Uuid) -> Result<(), StoreError> {
        let now = self.store.now();

        let result = users::Entity::update_many()
            .col_expr(users::Column::LastLoginAt, Expr::value(now))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::Status.eq(RowStatus::Active))
            .exec(self.store.conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(entity::USER));
        }
        Ok(())
    }

    async fn set_verified(&self, user_id: Uuid, verified: bool) -> Result<(), StoreError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::IsVerified, Expr::value(verified))
            .col_expr(users::Column::UpdatedAt, Expr::value(self.store.now()))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::Status.eq(RowStatus::Active))
            .exec(self.store.conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(entity::USER));
        }
        Ok(())
    }

    async fn soft_delete_user(&self, user_id: Uuid) -> Result<(), StoreError> {
        let now = self.store.now();
        let txn = self.store.begin().await?;
        let result = Self::cascade_delete(&txn, user_id, now).await;
        finish(txn, result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn fixed_store(db: sea_orm::DatabaseConnection) -> Store {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap());
        Store::new(Arc::new(db), Arc::new(clock))
    }

    fn user_model(id: Uuid) -> users::Model {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap().fixed_offset();
        users::Model {
            id,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Alice".to_string(),
            bio: None,
            profile_image_url: None,
            cover_image_url: None,
            website: None,
            location: None,
            date_of_birth: None,
            role: UserRole::User,
            is_verified: false,
            is_private: false,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            status: RowStatus::Active,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user_model(id)]])
            .into_connection();

        let repo = UserRepositoryPostgres::new(fixed_store(db));
        let created = repo
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
                full_name: "Alice".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(created.id, id);
        assert_eq!(created.username, "alice");
        assert_eq!(created.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email_is_constraint_violation() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors(vec![DbErr::Custom(
                "duplicate key value violates unique constraint \"idx_users_email\"".to_string(),
            )])
            .into_connection();

        let repo = UserRepositoryPostgres::new(fixed_store(db));
        let result = repo
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
                full_name: "Alice".to_string(),
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            StoreError::ConstraintViolation { field: "email" }
        );
    }

    #[tokio::test]
    async fn test_find_by_username_returns_none_when_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<users::Model>::new()])
            .into_connection();

        let repo = UserRepositoryPostgres::new(fixed_store(db));
        let found = repo.find_by_username("ghost").await.unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_record_login_missing_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = UserRepositoryPostgres::new(fixed_store(db));
        let result = repo.record_login(Uuid::new_v4()).await;

        assert_eq!(result.unwrap_err(), StoreError::NotFound(entity::USER));
    }

    #[tokio::test]
    async fn test_soft_delete_user_rolls_back_when_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = UserRepositoryPostgres::new(fixed_store(db));
        let result = repo.soft_delete_user(Uuid::new_v4()).await;

        assert_eq!(result.unwrap_err(), StoreError::NotFound(entity::USER));
    }
}
