//! Ledger reads, balance derivation, and dashboard reporting.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use tracing::instrument;

use super::error::DomainError;
use super::ledger::{self, EntryId, LedgerEntry, LedgerValidationError};
use super::loan::LoanId;
use super::ports::{DashboardStats, LedgerRepository, ReportingQuery};
use super::user::UserId;

/// Default page size for the recent-transactions endpoint.
pub const DEFAULT_RECENT_LIMIT: i64 = 10;

/// Read/append operations over the transactions table plus the admin
/// reporting projection.
#[derive(Clone)]
pub struct LedgerService {
    entries: Arc<dyn LedgerRepository>,
    reporting: Arc<dyn ReportingQuery>,
}

impl LedgerService {
    /// Create the service over the ledger and reporting ports.
    pub fn new(entries: Arc<dyn LedgerRepository>, reporting: Arc<dyn ReportingQuery>) -> Self {
        Self { entries, reporting }
    }

    /// Append a money-movement event after validating amount and kind.
    #[instrument(skip_all, fields(user_id = %user))]
    pub async fn record(
        &self,
        user: UserId,
        kind: &str,
        amount: BigDecimal,
        loan_id: Option<LoanId>,
    ) -> Result<LedgerEntry, DomainError> {
        let kind = ledger::validate_entry(kind, &amount).map_err(|err| match err {
            LedgerValidationError::NonPositiveAmount => {
                DomainError::invalid_request("amount must be greater than zero")
            }
            LedgerValidationError::UnknownKind(unknown) => {
                DomainError::invalid_request(unknown.to_string())
            }
        })?;
        let entry = LedgerEntry {
            id: EntryId::generate(),
            user_id: user,
            kind,
            amount,
            loan_id,
            created_at: Utc::now(),
        };
        self.entries.append(&entry).await?;
        Ok(entry)
    }

    /// Current balance: the signed fold over all of the user's entries.
    ///
    /// Always re-derived; there is no stored balance field to drift.
    pub async fn balance(&self, user: UserId) -> Result<BigDecimal, DomainError> {
        let rows = self.entries.amounts_for_user(user).await?;
        Ok(ledger::balance_of(
            user,
            rows.iter().map(|(kind, amount)| (kind.as_str(), amount)),
        ))
    }

    /// Most recent entries for the user, newest first.
    pub async fn recent(
        &self,
        user: UserId,
        limit: Option<i64>,
    ) -> Result<Vec<LedgerEntry>, DomainError> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).max(1);
        Ok(self.entries.recent_for_user(user, limit).await?)
    }

    /// Admin dashboard counters. Tolerates an empty dataset.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, DomainError> {
        Ok(self.reporting.dashboard_stats().await?)
    }
}
