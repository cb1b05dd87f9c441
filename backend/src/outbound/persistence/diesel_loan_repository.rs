//! PostgreSQL-backed [`LoanRepository`] implementation using Diesel.
//!
//! Approve/reject is a compare-and-set `UPDATE ... WHERE status` so racing
//! admins are serialized by the row write itself. Disbursement runs inside a
//! database transaction holding a `FOR UPDATE` lock on the loan row: the
//! ledger insert and the status update commit together or not at all.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ledger::{EntryId, EntryKind, LedgerEntry};
use crate::domain::loan::{Loan, LoanId, LoanStatus};
use crate::domain::ports::{
    DisburseOutcome, LoanRepository, PendingLoan, StoreError, TransitionOutcome,
};
use crate::domain::user::UserId;

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::lower;
use super::models::{LoanRow, NewLoanRow, NewTransactionRow};
use super::pool::DbPool;
use super::schema::{loans, transactions, users};

/// Diesel-backed implementation of the loans port.
#[derive(Clone)]
pub struct DieselLoanRepository {
    pool: DbPool,
}

impl DieselLoanRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Decision changeset: `decision_note` stays untouched when `None`.
#[derive(AsChangeset)]
#[diesel(table_name = loans)]
struct LoanDecision<'a> {
    status: &'a str,
    decision_note: Option<&'a str>,
}

/// Error carrier for the disbursement transaction closure. Diesel requires
/// the closure error to be convertible from its own error type so commit and
/// rollback failures propagate.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Store(StoreError),
}

impl From<diesel::result::Error> for TxError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

impl TxError {
    fn into_store(self) -> StoreError {
        match self {
            Self::Diesel(err) => map_diesel_error(err),
            Self::Store(err) => err,
        }
    }
}

#[async_trait]
impl LoanRepository for DieselLoanRepository {
    async fn insert(&self, loan: &Loan) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(loans::table)
            .values(NewLoanRow::from_domain(loan))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find(&self, id: LoanId) -> Result<Option<Loan>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<LoanRow> = loans::table
            .find(*id.as_uuid())
            .select(LoanRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(LoanRow::into_domain).transpose()
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Loan>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LoanRow> = loans::table
            .filter(loans::user_id.eq(user.as_uuid()))
            .order(loans::created_at.desc())
            .select(LoanRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(LoanRow::into_domain).collect()
    }

    async fn list_all(&self) -> Result<Vec<Loan>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LoanRow> = loans::table
            .order(loans::created_at.desc())
            .select(LoanRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(LoanRow::into_domain).collect()
    }

    async fn list_pending(&self) -> Result<Vec<PendingLoan>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(LoanRow, Option<String>)> = loans::table
            .left_join(users::table)
            .filter(lower(loans::status).eq_any(LoanStatus::Pending.stored_spellings()))
            .order(loans::created_at.desc())
            .select((LoanRow::as_select(), users::full_name.nullable()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|(row, full_name)| {
                Ok(PendingLoan {
                    loan: row.into_domain()?,
                    full_name,
                })
            })
            .collect()
    }

    async fn transition(
        &self,
        id: LoanId,
        to: LoanStatus,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated: Option<LoanRow> = diesel::update(
            loans::table.filter(
                loans::id
                    .eq(id.as_uuid())
                    .and(lower(loans::status).eq_any(LoanStatus::Pending.stored_spellings())),
            ),
        )
        .set(LoanDecision {
            status: to.as_str(),
            decision_note: note,
        })
        .returning(LoanRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        if let Some(row) = updated {
            return Ok(TransitionOutcome::Applied(row.into_domain()?));
        }
        // The compare-and-set missed: either the loan is absent or it was
        // not pending at the moment of the update.
        match self.find(id).await? {
            None => Ok(TransitionOutcome::NotFound),
            Some(loan) => Ok(TransitionOutcome::WrongState(loan.status)),
        }
    }

    async fn disburse(&self, id: LoanId) -> Result<DisburseOutcome, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<DisburseOutcome, TxError, _>(|conn| {
            async move {
                let row: Option<LoanRow> = loans::table
                    .find(*id.as_uuid())
                    .select(LoanRow::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let Some(row) = row else {
                    return Ok(DisburseOutcome::NotFound);
                };
                let loan = row.into_domain().map_err(TxError::Store)?;
                if loan.status != LoanStatus::Approved {
                    return Ok(DisburseOutcome::WrongState(loan.status));
                }

                let entry = LedgerEntry {
                    id: EntryId::generate(),
                    user_id: loan.user_id,
                    kind: EntryKind::LoanDisbursement,
                    amount: loan.amount_requested.clone(),
                    loan_id: Some(loan.id),
                    created_at: Utc::now(),
                };
                diesel::insert_into(transactions::table)
                    .values(NewTransactionRow::from_domain(&entry))
                    .execute(conn)
                    .await?;

                let activated: LoanRow = diesel::update(loans::table.find(*id.as_uuid()))
                    .set(loans::status.eq(LoanStatus::Active.as_str()))
                    .returning(LoanRow::as_returning())
                    .get_result(conn)
                    .await?;
                let loan = activated.into_domain().map_err(TxError::Store)?;
                Ok(DisburseOutcome::Disbursed { loan, entry })
            }
            .scope_boxed()
        })
        .await
        .map_err(TxError::into_store)
    }
}
