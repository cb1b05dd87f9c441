//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to talk to driven adapters (the
//! relational store). Each trait exposes strongly typed errors so adapters
//! map their failures into predictable variants instead of returning a
//! catch-all.
//!
//! The compound lifecycle operations live here on purpose: approve/reject is
//! a compare-and-set against the stored status, and disburse is a single
//! transactional unit pairing the ledger insert with the status update. The
//! adapters own the locking; the services own the error semantics.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use super::error::DomainError;
use super::ledger::LedgerEntry;
use super::loan::{Loan, LoanId, LoanStatus};
use super::user::{User, UserId};

/// Failures surfaced by store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Connection refused or dropped.
    #[error("store connection failed: {message}")]
    Connection {
        /// Adapter-provided detail; safe to log, not returned to clients.
        message: String,
    },
    /// Checkout or statement exceeded its bounded timeout.
    #[error("store timed out: {message}")]
    Timeout {
        /// Adapter-provided detail.
        message: String,
    },
    /// Query failed or a stored row failed domain validation.
    #[error("store query failed: {message}")]
    Query {
        /// Adapter-provided detail.
        message: String,
    },
}

impl StoreError {
    /// Connection-class failure.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Timeout-class failure.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Query-class failure.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Map onto the transport-facing taxonomy: connectivity and timeouts are
    /// `Unavailable`, everything else is internal.
    #[must_use]
    pub fn into_domain(self) -> DomainError {
        match self {
            Self::Connection { message } | Self::Timeout { message } => {
                DomainError::unavailable(format!("store unavailable: {message}"))
            }
            Self::Query { message } => DomainError::internal(format!("store error: {message}")),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        value.into_domain()
    }
}

/// Failure inserting a new user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserInsertError {
    /// Another user already owns this email (case-insensitive).
    #[error("email already registered")]
    EmailTaken,
    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Users table port.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Email uniqueness is enforced by the store so two
    /// racing registrations cannot both create a row.
    async fn insert(&self, user: &User) -> Result<(), UserInsertError>;

    /// Look up a user by normalized (lowercase) email.
    async fn find_by_email(&self, normalized_email: &str) -> Result<Option<User>, StoreError>;

    /// Look up a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
}

/// Outcome of a compare-and-set status transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The transition applied; here is the updated loan.
    Applied(Loan),
    /// No loan with that identifier exists.
    NotFound,
    /// The loan exists but is not in the required source state.
    WrongState(LoanStatus),
}

/// Outcome of the atomic disbursement operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DisburseOutcome {
    /// Both the ledger insert and the status update committed.
    Disbursed {
        /// Loan now in `active`.
        loan: Loan,
        /// The paired `loan_disbursement` ledger entry.
        entry: LedgerEntry,
    },
    /// No loan with that identifier exists.
    NotFound,
    /// The loan exists but was not `approved`.
    WrongState(LoanStatus),
}

/// Pending loan joined with the borrower's display name for review screens.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingLoan {
    /// The loan awaiting decision.
    #[serde(flatten)]
    pub loan: Loan,
    /// Borrower display name, when the owning user still resolves.
    pub full_name: Option<String>,
}

/// Loans table port.
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// Persist a freshly validated application (status `pending`).
    async fn insert(&self, loan: &Loan) -> Result<(), StoreError>;

    /// Look up a loan by identifier.
    async fn find(&self, id: LoanId) -> Result<Option<Loan>, StoreError>;

    /// All loans owned by `user`, newest first.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Loan>, StoreError>;

    /// All loans, newest first.
    async fn list_all(&self) -> Result<Vec<Loan>, StoreError>;

    /// Loans whose stored status normalizes to pending, newest first, joined
    /// with the borrower's name.
    async fn list_pending(&self) -> Result<Vec<PendingLoan>, StoreError>;

    /// Compare-and-set `pending` → `to` (`approved` or `rejected`). The
    /// store serializes racing calls; the loser observes
    /// [`TransitionOutcome::WrongState`].
    async fn transition(
        &self,
        id: LoanId,
        to: LoanStatus,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, StoreError>;

    /// Atomically append the disbursement ledger entry and move the loan
    /// `approved` → `active`. Both writes commit together or neither does.
    async fn disburse(&self, id: LoanId) -> Result<DisburseOutcome, StoreError>;
}

/// Transactions table port.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Append one entry. The ledger is append-only; this port has no update
    /// or delete operation.
    async fn append(&self, entry: &LedgerEntry) -> Result<(), StoreError>;

    /// Most recent entries for `user`, newest first, bounded by `limit`.
    async fn recent_for_user(
        &self,
        user: UserId,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Raw `(stored_type, amount)` pairs for `user`. The balance fold stays
    /// in the domain so the unknown-kind policy lives in exactly one place.
    async fn amounts_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<(String, BigDecimal)>, StoreError>;
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Users with role `borrower`.
    pub borrower_count: i64,
    /// Loans in `approved` or `active`.
    pub active_loan_count: i64,
    /// Loans still awaiting a decision.
    pub pending_approval_count: i64,
    /// Loans rejected by an admin.
    pub rejected_count: i64,
    /// Sum of `amount_requested` over loans that reached disbursement.
    #[schema(value_type = String, example = "125000")]
    pub total_disbursed: BigDecimal,
}

/// Read-only reporting projection over users and loans.
#[async_trait]
pub trait ReportingQuery: Send + Sync {
    /// Compute the dashboard counters. An empty dataset yields all zeros.
    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError>;
}
