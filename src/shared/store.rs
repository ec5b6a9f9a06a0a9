use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::sync::Arc;

use crate::shared::clock::{Clock, SystemClock};
use crate::shared::store_error::StoreError;

/// Explicit persistence handle: connection pool plus the clock used for
/// default timestamps. Cloned into every adapter; there is no global handle.
#[derive(Clone)]
pub struct Store {
    db: Arc<DatabaseConnection>,
    clock: Arc<dyn Clock>,
}

impl Store {
    pub fn new(db: Arc<DatabaseConnection>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn with_system_clock(db: Arc<DatabaseConnection>) -> Self {
        Self::new(db, Arc::new(SystemClock))
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn now(&self) -> DateTimeWithTimeZone {
        self.clock.now().fixed_offset()
    }

    pub async fn begin(&self) -> Result<DatabaseTransaction, StoreError> {
        self.db.begin().await.map_err(StoreError::from)
    }
}

/// Commit on success, roll back on failure. The caller's error wins over a
/// failed rollback.
pub async fn finish<T>(
    txn: DatabaseTransaction,
    result: Result<T, StoreError>,
) -> Result<T, StoreError> {
    match result {
        Ok(value) => {
            txn.commit().await.map_err(StoreError::from)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(e)
        }
    }
}
