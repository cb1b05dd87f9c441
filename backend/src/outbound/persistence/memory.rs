//! In-memory implementation of the persistence ports.
//!
//! One mutex guards the whole dataset, which gives the same observable
//! serialization guarantees as the row-locked PostgreSQL adapters: racing
//! transitions are ordered and disbursement is all-or-nothing. Unit and HTTP
//! integration tests run against this store; it also backs local
//! experimentation without a database.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;

use crate::domain::ledger::{EntryId, EntryKind, LedgerEntry};
use crate::domain::loan::{Loan, LoanId, LoanStatus};
use crate::domain::ports::{
    DashboardStats, DisburseOutcome, LedgerRepository, LoanRepository, PendingLoan,
    ReportingQuery, StoreError, TransitionOutcome, UserInsertError, UserRepository,
};
use crate::domain::user::{Role, User, UserId};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    loans: Vec<Loan>,
    entries: Vec<LedgerEntry>,
}

/// Shared in-memory dataset implementing every persistence port.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    fail_next_disburse: AtomicBool,
}

impl InMemoryStore {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test panicked mid-write.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    /// Snapshot of a loan by id.
    #[must_use]
    pub fn loan(&self, id: LoanId) -> Option<Loan> {
        self.lock().loans.iter().find(|l| l.id == id).cloned()
    }

    /// Snapshot of a user's ledger entries, oldest first.
    #[must_use]
    pub fn entries_for(&self, user: UserId) -> Vec<LedgerEntry> {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.user_id == user)
            .cloned()
            .collect()
    }

    /// Arm a one-shot failure inside the next disbursement, after the status
    /// check but before any write. Exercises the all-or-nothing guarantee.
    pub fn fail_next_disburse(&self) {
        self.fail_next_disburse.store(true, Ordering::SeqCst);
    }

    /// Store a fully formed user row directly; used by tests to seed admins.
    pub fn seed_user(&self, user: User) {
        self.lock().users.push(user);
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &User) -> Result<(), UserInsertError> {
        let mut inner = self.lock();
        let normalized = user.email.normalized();
        if inner.users.iter().any(|u| u.email.normalized() == normalized) {
            return Err(UserInsertError::EmailTaken);
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn find_by_email(&self, normalized_email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.email.normalized() == normalized_email)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl LoanRepository for InMemoryStore {
    async fn insert(&self, loan: &Loan) -> Result<(), StoreError> {
        self.lock().loans.push(loan.clone());
        Ok(())
    }

    async fn find(&self, id: LoanId) -> Result<Option<Loan>, StoreError> {
        Ok(self.loan(id))
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Loan>, StoreError> {
        Ok(self
            .lock()
            .loans
            .iter()
            .rev()
            .filter(|l| l.user_id == user)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Loan>, StoreError> {
        Ok(self.lock().loans.iter().rev().cloned().collect())
    }

    async fn list_pending(&self) -> Result<Vec<PendingLoan>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .loans
            .iter()
            .rev()
            .filter(|l| l.status == LoanStatus::Pending)
            .map(|l| PendingLoan {
                loan: l.clone(),
                full_name: inner
                    .users
                    .iter()
                    .find(|u| u.id == l.user_id)
                    .map(|u| u.full_name.clone()),
            })
            .collect())
    }

    async fn transition(
        &self,
        id: LoanId,
        to: LoanStatus,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut inner = self.lock();
        let Some(loan) = inner.loans.iter_mut().find(|l| l.id == id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if loan.status != LoanStatus::Pending {
            return Ok(TransitionOutcome::WrongState(loan.status));
        }
        loan.status = to;
        if let Some(text) = note {
            loan.decision_note = Some(text.to_owned());
        }
        Ok(TransitionOutcome::Applied(loan.clone()))
    }

    async fn disburse(&self, id: LoanId) -> Result<DisburseOutcome, StoreError> {
        let mut inner = self.lock();
        let Some(position) = inner.loans.iter().position(|l| l.id == id) else {
            return Ok(DisburseOutcome::NotFound);
        };
        let current = inner.loans[position].status;
        if current != LoanStatus::Approved {
            return Ok(DisburseOutcome::WrongState(current));
        }
        if self.fail_next_disburse.swap(false, Ordering::SeqCst) {
            // Nothing has been written yet; the caller observes a store
            // failure and both tables stay untouched.
            return Err(StoreError::timeout("injected disbursement failure"));
        }
        let loan = &mut inner.loans[position];
        loan.status = LoanStatus::Active;
        let loan = loan.clone();
        let entry = LedgerEntry {
            id: EntryId::generate(),
            user_id: loan.user_id,
            kind: EntryKind::LoanDisbursement,
            amount: loan.amount_requested.clone(),
            loan_id: Some(loan.id),
            created_at: Utc::now(),
        };
        inner.entries.push(entry.clone());
        Ok(DisburseOutcome::Disbursed { loan, entry })
    }
}

#[async_trait]
impl LedgerRepository for InMemoryStore {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        self.lock().entries.push(entry.clone());
        Ok(())
    }

    async fn recent_for_user(
        &self,
        user: UserId,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(self
            .lock()
            .entries
            .iter()
            .rev()
            .filter(|e| e.user_id == user)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn amounts_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<(String, BigDecimal)>, StoreError> {
        Ok(self
            .lock()
            .entries
            .iter()
            .filter(|e| e.user_id == user)
            .map(|e| (e.kind.as_str().to_owned(), e.amount.clone()))
            .collect())
    }
}

#[async_trait]
impl ReportingQuery for InMemoryStore {
    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let inner = self.lock();
        let count = |pred: &dyn Fn(&&Loan) -> bool| inner.loans.iter().filter(pred).count() as i64;
        let total_disbursed = inner
            .loans
            .iter()
            .filter(|l| l.status == LoanStatus::Active)
            .map(|l| l.amount_requested.clone())
            .sum();
        Ok(DashboardStats {
            borrower_count: inner
                .users
                .iter()
                .filter(|u| u.role == Role::Borrower)
                .count() as i64,
            active_loan_count: count(&|l| {
                matches!(l.status, LoanStatus::Approved | LoanStatus::Active)
            }),
            pending_approval_count: count(&|l| l.status == LoanStatus::Pending),
            rejected_count: count(&|l| l.status == LoanStatus::Rejected),
            total_disbursed,
        })
    }
}
