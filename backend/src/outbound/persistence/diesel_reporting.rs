//! PostgreSQL-backed [`ReportingQuery`] implementation using Diesel.
//!
//! Pure read-only projection over users and loans. Every filter matches
//! case-insensitively against the historical status spellings so drifted
//! rows still count under their canonical state.

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::loan::LoanStatus;
use crate::domain::ports::{DashboardStats, ReportingQuery, StoreError};
use crate::domain::user::Role;

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::lower;
use super::pool::DbPool;
use super::schema::{loans, users};

/// Diesel-backed implementation of the reporting port.
#[derive(Clone)]
pub struct DieselReportingQuery {
    pool: DbPool,
}

impl DieselReportingQuery {
    /// Create a new reporting adapter with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Lowercased spellings counting as "passed review and not rejected".
fn active_spellings() -> Vec<&'static str> {
    let mut spellings = LoanStatus::Approved.stored_spellings().to_vec();
    spellings.extend_from_slice(LoanStatus::Active.stored_spellings());
    spellings
}

#[async_trait]
impl ReportingQuery for DieselReportingQuery {
    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let borrower_count: i64 = users::table
            .filter(lower(users::role).eq(Role::Borrower.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let active_loan_count: i64 = loans::table
            .filter(lower(loans::status).eq_any(active_spellings()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let pending_approval_count: i64 = loans::table
            .filter(lower(loans::status).eq_any(LoanStatus::Pending.stored_spellings()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rejected_count: i64 = loans::table
            .filter(lower(loans::status).eq_any(LoanStatus::Rejected.stored_spellings()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        // Only loans that actually reached disbursement count here.
        let total_disbursed: Option<BigDecimal> = loans::table
            .filter(lower(loans::status).eq_any(LoanStatus::Active.stored_spellings()))
            .select(diesel::dsl::sum(loans::amount_requested))
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(DashboardStats {
            borrower_count,
            active_loan_count,
            pending_approval_count,
            rejected_count,
            total_disbursed: total_disbursed.unwrap_or_else(BigDecimal::zero),
        })
    }
}
