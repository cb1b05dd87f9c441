//! Loan entity and lifecycle states.
//!
//! The status machine is deliberately tiny and one-directional:
//!
//! ```text
//! pending ──► approved ──► active
//!    └──────► rejected
//! ```
//!
//! `active` and `rejected` are terminal; `approved` may never be skipped on
//! the way to `active`. Historical databases carry drifted spellings
//! (`pending_approval`, `APPROVED_PENDING_DISBURSE`, `REJECTED`, ...);
//! [`LoanStatus::parse`] folds those into the canonical four on read, and
//! only canonical lowercase spellings are ever written.

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Opaque loan identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct LoanId(Uuid);

impl LoanId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for LoanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Canonical lifecycle states. No other string is ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// Initial state after a borrower applies.
    Pending,
    /// Passed admin review; awaiting disbursement.
    Approved,
    /// Disbursed. Terminal.
    Active,
    /// Declined by an admin. Terminal.
    Rejected,
}

impl LoanStatus {
    /// Canonical lowercase spelling used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Rejected => "rejected",
        }
    }

    /// Lowercased historical spellings that fold into this state. Store
    /// adapters use these for case-insensitive SQL matching; keep in sync
    /// with [`LoanStatus::parse`].
    #[must_use]
    pub const fn stored_spellings(&self) -> &'static [&'static str] {
        match self {
            Self::Pending => &["pending", "pending_approval", "pendingapproval", "pending approval"],
            Self::Approved => &["approved", "approved_pending_disburse"],
            Self::Active => &["active", "disbursed"],
            Self::Rejected => &["rejected"],
        }
    }

    /// Fold a stored status string into the canonical set.
    ///
    /// Matching is case-insensitive and ignores spaces and underscores, so
    /// `PENDING_APPROVAL`, `pending approval`, and `pendingapproval` all read
    /// as [`LoanStatus::Pending`]. A string outside the known variants is a
    /// data-migration concern, not a fifth state, and surfaces as an error.
    pub fn parse(raw: &str) -> Result<Self, UnknownLoanStatus> {
        let folded: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "pending" | "pendingapproval" => Ok(Self::Pending),
            "approved" | "approvedpendingdisburse" => Ok(Self::Approved),
            "active" | "disbursed" => Ok(Self::Active),
            "rejected" => Ok(Self::Rejected),
            _ => Err(UnknownLoanStatus(raw.to_owned())),
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored loan status string that does not normalize to any known state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown loan status: {0}")]
pub struct UnknownLoanStatus(pub String);

/// Loan application row. Mutated only by admin transition actions; never
/// deleted.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    /// Stable identifier.
    pub id: LoanId,
    /// Borrowing user.
    pub user_id: UserId,
    /// Requested principal. Strictly positive.
    #[schema(value_type = String, example = "50000")]
    pub amount_requested: BigDecimal,
    /// Free-text purpose supplied by the borrower.
    pub purpose: String,
    /// Repayment term in months. Strictly positive.
    pub term_months: i32,
    /// Current lifecycle state.
    pub status: LoanStatus,
    /// Optional note captured when an admin rejects the loan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_note: Option<String>,
    /// Application timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validation failures for loan applications.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoanValidationError {
    /// Requested amount was missing, zero, or negative.
    #[error("amount requested must be greater than zero")]
    NonPositiveAmount,
    /// Purpose was missing or blank once trimmed.
    #[error("purpose must not be empty")]
    EmptyPurpose,
    /// Term was missing, zero, or negative.
    #[error("repayment term must be a positive number of months")]
    NonPositiveTerm,
}

/// Validated input for [`crate::domain::LoanService::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoanApplication {
    amount_requested: BigDecimal,
    purpose: String,
    term_months: i32,
}

impl LoanApplication {
    /// Validate the raw application fields.
    pub fn new(
        amount_requested: BigDecimal,
        purpose: &str,
        term_months: i32,
    ) -> Result<Self, LoanValidationError> {
        if amount_requested <= BigDecimal::zero() {
            return Err(LoanValidationError::NonPositiveAmount);
        }
        let trimmed = purpose.trim();
        if trimmed.is_empty() {
            return Err(LoanValidationError::EmptyPurpose);
        }
        if term_months <= 0 {
            return Err(LoanValidationError::NonPositiveTerm);
        }
        Ok(Self {
            amount_requested,
            purpose: trimmed.to_owned(),
            term_months,
        })
    }

    /// Requested principal.
    #[must_use]
    pub const fn amount_requested(&self) -> &BigDecimal {
        &self.amount_requested
    }

    /// Trimmed purpose text.
    #[must_use]
    pub fn purpose(&self) -> &str {
        self.purpose.as_str()
    }

    /// Repayment term in months.
    #[must_use]
    pub const fn term_months(&self) -> i32 {
        self.term_months
    }
}
