//! Append-only ledger of money-movement events and the balance fold.
//!
//! A user's balance is never stored; it is always re-derived as the signed
//! sum of that user's entries. Deposits and loan disbursements count
//! positive, withdrawals and loan payments negative.

use std::fmt;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use super::loan::LoanId;
use super::user::UserId;

/// Opaque ledger entry identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
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

/// The four semantic buckets every stored transaction type normalizes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Cash paid into the user's account.
    Deposit,
    /// Cash taken out of the user's account.
    Withdrawal,
    /// Approved loan funds released to the borrower.
    LoanDisbursement,
    /// Repayment against an active loan.
    LoanPayment,
}

impl EntryKind {
    /// Canonical snake_case spelling used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::LoanDisbursement => "loan_disbursement",
            Self::LoanPayment => "loan_payment",
        }
    }

    /// Fold a stored type string into a bucket.
    ///
    /// Matching ignores case, spaces, and underscores and accepts the
    /// historical aliases (`cash_deposit`, `withdraw`, `loan_issued`, ...).
    pub fn parse(raw: &str) -> Result<Self, UnknownEntryKind> {
        let folded: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "deposit" | "cashdeposit" => Ok(Self::Deposit),
            "withdrawal" | "cashwithdrawal" | "withdraw" => Ok(Self::Withdrawal),
            "loandisbursement" | "loanissued" => Ok(Self::LoanDisbursement),
            "loanpayment" => Ok(Self::LoanPayment),
            _ => Err(UnknownEntryKind(raw.to_owned())),
        }
    }

    /// Sign applied to this bucket in the balance fold.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Deposit | Self::LoanDisbursement)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored transaction type that does not normalize to any bucket.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction type: {0}")]
pub struct UnknownEntryKind(pub String);

/// One append-only money-movement record.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Stable identifier.
    pub id: EntryId,
    /// Owning user.
    pub user_id: UserId,
    /// Semantic bucket.
    pub kind: EntryKind,
    /// Moved amount. Strictly positive; direction comes from `kind`.
    #[schema(value_type = String, example = "50000")]
    pub amount: BigDecimal,
    /// Loan that produced this entry, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<LoanId>,
    /// Append timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validation failure when recording a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerValidationError {
    /// Amount was zero or negative.
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    /// Type string did not normalize to a bucket.
    #[error(transparent)]
    UnknownKind(#[from] UnknownEntryKind),
}

/// Validate the raw fields of a new ledger entry.
pub fn validate_entry(
    kind: &str,
    amount: &BigDecimal,
) -> Result<EntryKind, LedgerValidationError> {
    if *amount <= BigDecimal::zero() {
        return Err(LedgerValidationError::NonPositiveAmount);
    }
    Ok(EntryKind::parse(kind)?)
}

/// Fold stored `(type, amount)` pairs into a signed balance.
///
/// Policy: a stored type string that fails to normalize contributes zero to
/// the sum and is logged at `warn`, leaving a trail for data migration
/// without corrupting the balance.
pub fn balance_of<'a, I>(user_id: UserId, rows: I) -> BigDecimal
where
    I: IntoIterator<Item = (&'a str, &'a BigDecimal)>,
{
    let mut balance = BigDecimal::zero();
    for (raw_kind, amount) in rows {
        match EntryKind::parse(raw_kind) {
            Ok(kind) if kind.is_credit() => balance += amount,
            Ok(_) => balance -= amount,
            Err(err) => {
                warn!(user_id = %user_id, kind = raw_kind, error = %err,
                    "unrecognized transaction type contributes zero to balance");
            }
        }
    }
    balance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("decimal")
    }

    #[rstest]
    #[case("deposit", EntryKind::Deposit)]
    #[case("DEPOSIT", EntryKind::Deposit)]
    #[case("cash_deposit", EntryKind::Deposit)]
    #[case("cash deposit", EntryKind::Deposit)]
    #[case("withdrawal", EntryKind::Withdrawal)]
    #[case("withdraw", EntryKind::Withdrawal)]
    #[case("cash_withdrawal", EntryKind::Withdrawal)]
    #[case("loan_disbursement", EntryKind::LoanDisbursement)]
    #[case("Loan Disbursement", EntryKind::LoanDisbursement)]
    #[case("loan_issued", EntryKind::LoanDisbursement)]
    #[case("loan_payment", EntryKind::LoanPayment)]
    #[case("loan payment", EntryKind::LoanPayment)]
    fn parse_folds_variants(#[case] raw: &str, #[case] expected: EntryKind) {
        assert_eq!(EntryKind::parse(raw).expect("known kind"), expected);
    }

    #[rstest]
    fn parse_rejects_unknown() {
        assert!(EntryKind::parse("transfer").is_err());
    }

    #[rstest]
    fn balance_applies_signs() {
        let user = UserId::generate();
        let d1 = dec("100");
        let d2 = dec("40");
        let d3 = dec("50000");
        let d4 = dec("2500");
        let rows = vec![
            ("deposit", &d1),
            ("withdrawal", &d2),
            ("loan_disbursement", &d3),
            ("loan_payment", &d4),
        ];
        assert_eq!(balance_of(user, rows), dec("47560"));
    }

    #[rstest]
    fn unknown_kinds_contribute_zero() {
        let user = UserId::generate();
        let d1 = dec("100");
        let d2 = dec("999");
        let rows = vec![("deposit", &d1), ("mystery_credit", &d2)];
        assert_eq!(balance_of(user, rows), dec("100"));
    }

    #[rstest]
    fn empty_ledger_balances_to_zero() {
        assert_eq!(balance_of(UserId::generate(), Vec::new()), dec("0"));
    }

    #[rstest]
    #[case("deposit", "0", LedgerValidationError::NonPositiveAmount)]
    #[case("deposit", "-1", LedgerValidationError::NonPositiveAmount)]
    fn validate_entry_rejects_non_positive_amounts(
        #[case] kind: &str,
        #[case] amount: &str,
        #[case] expected: LedgerValidationError,
    ) {
        assert_eq!(
            validate_entry(kind, &dec(amount)).expect_err("invalid"),
            expected
        );
    }

    #[rstest]
    fn validate_entry_rejects_unknown_kind() {
        assert!(matches!(
            validate_entry("transfer", &dec("10")),
            Err(LedgerValidationError::UnknownKind(_))
        ));
    }
}
