//! PostgreSQL-backed [`LedgerRepository`] implementation using Diesel.
//!
//! The transactions table is append-only; this adapter exposes no update or
//! delete path on purpose.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ledger::LedgerEntry;
use crate::domain::ports::{LedgerRepository, StoreError};
use crate::domain::user::UserId;

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewTransactionRow, TransactionRow};
use super::pool::DbPool;
use super::schema::transactions;

/// Diesel-backed implementation of the ledger port.
#[derive(Clone)]
pub struct DieselLedgerRepository {
    pool: DbPool,
}

impl DieselLedgerRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerRepository for DieselLedgerRepository {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(transactions::table)
            .values(NewTransactionRow::from_domain(entry))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn recent_for_user(
        &self,
        user: UserId,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TransactionRow> = transactions::table
            .filter(transactions::user_id.eq(user.as_uuid()))
            .order(transactions::created_at.desc())
            .limit(limit)
            .select(TransactionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn amounts_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<(String, BigDecimal)>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        transactions::table
            .filter(transactions::user_id.eq(user.as_uuid()))
            .select((transactions::kind, transactions::amount))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}
