//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types run through
//! the validating constructors so drifted stored strings (roles, statuses)
//! are normalized or rejected in exactly one place.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::ledger::{EntryId, EntryKind, LedgerEntry};
use crate::domain::loan::{Loan, LoanId, LoanStatus};
use crate::domain::ports::StoreError;
use crate::domain::user::{EmailAddress, Role, User, UserId};

use super::schema::{loans, transactions, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Validate a stored row into the domain entity.
    pub fn into_domain(self) -> Result<User, StoreError> {
        let role = Role::parse(&self.role)
            .map_err(|err| StoreError::query(format!("users.role: {err}")))?;
        let email = EmailAddress::new(&self.email)
            .map_err(|err| StoreError::query(format!("users.email: {err}")))?;
        Ok(User {
            id: UserId::from_uuid(self.id),
            full_name: self.full_name,
            email,
            password_hash: self.password_hash,
            role,
            created_at: self.created_at,
        })
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewUserRow<'a> {
    pub fn from_domain(user: &'a User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            full_name: user.full_name.as_str(),
            email: user.email.as_str(),
            password_hash: user.password_hash.as_str(),
            role: user.role.as_str(),
            created_at: user.created_at,
        }
    }
}

/// Row struct for reading from the loans table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = loans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LoanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount_requested: BigDecimal,
    pub purpose: String,
    pub term_months: i32,
    pub status: String,
    pub decision_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LoanRow {
    /// Validate a stored row into the domain entity, folding historical
    /// status spellings into the canonical enum.
    pub fn into_domain(self) -> Result<Loan, StoreError> {
        let status = LoanStatus::parse(&self.status)
            .map_err(|err| StoreError::query(format!("loans.status: {err}")))?;
        Ok(Loan {
            id: LoanId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            amount_requested: self.amount_requested,
            purpose: self.purpose,
            term_months: self.term_months,
            status,
            decision_note: self.decision_note,
            created_at: self.created_at,
        })
    }
}

/// Insertable struct for creating new loan records.
#[derive(Debug, Insertable)]
#[diesel(table_name = loans)]
pub(crate) struct NewLoanRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount_requested: &'a BigDecimal,
    pub purpose: &'a str,
    pub term_months: i32,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewLoanRow<'a> {
    pub fn from_domain(loan: &'a Loan) -> Self {
        Self {
            id: *loan.id.as_uuid(),
            user_id: *loan.user_id.as_uuid(),
            amount_requested: &loan.amount_requested,
            purpose: loan.purpose.as_str(),
            term_months: loan.term_months,
            status: loan.status.as_str(),
            created_at: loan.created_at,
        }
    }
}

/// Row struct for reading from the transactions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub amount: BigDecimal,
    pub loan_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRow {
    /// Validate a stored row into the domain entity.
    ///
    /// Recent-transaction listings surface drifted type strings as errors;
    /// the balance fold tolerates them instead (it reads raw pairs, not this
    /// conversion).
    pub fn into_domain(self) -> Result<LedgerEntry, StoreError> {
        let kind = EntryKind::parse(&self.kind)
            .map_err(|err| StoreError::query(format!("transactions.type: {err}")))?;
        Ok(LedgerEntry {
            id: EntryId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            kind,
            amount: self.amount,
            loan_id: self.loan_id.map(LoanId::from_uuid),
            created_at: self.created_at,
        })
    }
}

/// Insertable struct for appending ledger entries.
#[derive(Debug, Insertable)]
#[diesel(table_name = transactions)]
pub(crate) struct NewTransactionRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: &'a str,
    pub amount: &'a BigDecimal,
    pub loan_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewTransactionRow<'a> {
    pub fn from_domain(entry: &'a LedgerEntry) -> Self {
        Self {
            id: *entry.id.as_uuid(),
            user_id: *entry.user_id.as_uuid(),
            kind: entry.kind.as_str(),
            amount: &entry.amount,
            loan_id: entry.loan_id.map(|id| *id.as_uuid()),
            created_at: entry.created_at,
        }
    }
}
