//! Loan lifecycle engine.
//!
//! Validates preconditions, delegates the stateful part to the loan
//! repository port, and turns port outcomes into the error taxonomy. The
//! repository owns atomicity (compare-and-set transitions, transactional
//! disbursement); this service owns the semantics.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use super::error::DomainError;
use super::ledger::LedgerEntry;
use super::loan::{Loan, LoanApplication, LoanId, LoanStatus};
use super::ports::{DisburseOutcome, LoanRepository, PendingLoan, TransitionOutcome};
use super::user::UserId;

/// Lifecycle operations over the loans table.
#[derive(Clone)]
pub struct LoanService {
    loans: Arc<dyn LoanRepository>,
}

impl LoanService {
    /// Create the service over a loan repository.
    pub fn new(loans: Arc<dyn LoanRepository>) -> Self {
        Self { loans }
    }

    /// Create a new application in `pending` for the borrower.
    #[instrument(skip_all, fields(user_id = %borrower))]
    pub async fn apply(
        &self,
        borrower: UserId,
        application: LoanApplication,
    ) -> Result<Loan, DomainError> {
        let loan = Loan {
            id: LoanId::generate(),
            user_id: borrower,
            amount_requested: application.amount_requested().clone(),
            purpose: application.purpose().to_owned(),
            term_months: application.term_months(),
            status: LoanStatus::Pending,
            decision_note: None,
            created_at: Utc::now(),
        };
        self.loans.insert(&loan).await?;
        info!(loan_id = %loan.id, "loan application created");
        Ok(loan)
    }

    /// All loans owned by the borrower, newest first.
    pub async fn list_mine(&self, borrower: UserId) -> Result<Vec<Loan>, DomainError> {
        Ok(self.loans.list_for_user(borrower).await?)
    }

    /// All loans, newest first. Admin only; the gate runs in the adapter.
    pub async fn list_all(&self) -> Result<Vec<Loan>, DomainError> {
        Ok(self.loans.list_all().await?)
    }

    /// Loans awaiting decision, newest first, with borrower names.
    pub async fn list_pending(&self) -> Result<Vec<PendingLoan>, DomainError> {
        Ok(self.loans.list_pending().await?)
    }

    /// `pending` → `approved`. Re-approving an already approved loan fails
    /// with a conflict rather than succeeding as a no-op.
    #[instrument(skip(self), fields(loan_id = %id))]
    pub async fn approve(&self, id: LoanId) -> Result<Loan, DomainError> {
        self.transition(id, LoanStatus::Approved, None).await
    }

    /// `pending` → `rejected`, capturing the optional reviewer note.
    #[instrument(skip(self, note), fields(loan_id = %id))]
    pub async fn reject(&self, id: LoanId, note: Option<&str>) -> Result<Loan, DomainError> {
        self.transition(id, LoanStatus::Rejected, note).await
    }

    async fn transition(
        &self,
        id: LoanId,
        to: LoanStatus,
        note: Option<&str>,
    ) -> Result<Loan, DomainError> {
        match self.loans.transition(id, to, note).await? {
            TransitionOutcome::Applied(loan) => {
                info!(loan_id = %id, status = %to, "loan transitioned");
                Ok(loan)
            }
            TransitionOutcome::NotFound => Err(DomainError::not_found("loan not found")),
            TransitionOutcome::WrongState(current) => Err(invalid_transition(current, to)),
        }
    }

    /// `approved` → `active` plus the paired disbursement ledger entry, as a
    /// single atomic unit. A loan that was never approved cannot be
    /// disbursed, so `pending` loans fail here exactly like terminal ones.
    #[instrument(skip(self), fields(loan_id = %id))]
    pub async fn disburse(&self, id: LoanId) -> Result<(Loan, LedgerEntry), DomainError> {
        match self.loans.disburse(id).await? {
            DisburseOutcome::Disbursed { loan, entry } => {
                info!(loan_id = %id, user_id = %loan.user_id, "loan disbursed");
                Ok((loan, entry))
            }
            DisburseOutcome::NotFound => Err(DomainError::not_found("loan not found")),
            DisburseOutcome::WrongState(current) => {
                Err(invalid_transition(current, LoanStatus::Active))
            }
        }
    }
}

fn invalid_transition(current: LoanStatus, requested: LoanStatus) -> DomainError {
    DomainError::conflict(format!(
        "loan is {current}; cannot transition to {requested}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ledger::EntryKind;
    use crate::outbound::persistence::memory::InMemoryStore;
    use bigdecimal::BigDecimal;
    use rstest::rstest;
    use std::str::FromStr;

    fn application(amount: &str) -> LoanApplication {
        LoanApplication::new(
            BigDecimal::from_str(amount).expect("decimal"),
            "working capital",
            12,
        )
        .expect("valid application")
    }

    fn service(store: &Arc<InMemoryStore>) -> LoanService {
        LoanService::new(store.clone())
    }

    #[rstest]
    #[actix_rt::test]
    async fn full_lifecycle_apply_approve_disburse() {
        let store = Arc::new(InMemoryStore::default());
        let service = service(&store);
        let borrower = UserId::generate();

        let loan = service
            .apply(borrower, application("50000"))
            .await
            .expect("apply");
        assert_eq!(loan.status, LoanStatus::Pending);

        let approved = service.approve(loan.id).await.expect("approve");
        assert_eq!(approved.status, LoanStatus::Approved);
        assert!(store.entries_for(borrower).is_empty());

        let (active, entry) = service.disburse(loan.id).await.expect("disburse");
        assert_eq!(active.status, LoanStatus::Active);
        assert_eq!(entry.kind, EntryKind::LoanDisbursement);
        assert_eq!(entry.loan_id, Some(loan.id));
        assert_eq!(entry.amount, loan.amount_requested);
        assert_eq!(store.entries_for(borrower).len(), 1);
    }

    #[rstest]
    #[actix_rt::test]
    async fn approve_requires_pending() {
        let store = Arc::new(InMemoryStore::default());
        let service = service(&store);
        let loan = service
            .apply(UserId::generate(), application("1000"))
            .await
            .expect("apply");
        let _ = service.approve(loan.id).await.expect("first approve");

        let err = service.approve(loan.id).await.expect_err("re-approve fails");
        assert_eq!(err.code(), ErrorCode::Conflict);

        let unchanged = store.loan(loan.id).expect("loan present");
        assert_eq!(unchanged.status, LoanStatus::Approved);
    }

    #[rstest]
    #[actix_rt::test]
    async fn disburse_requires_approved() {
        let store = Arc::new(InMemoryStore::default());
        let service = service(&store);
        let borrower = UserId::generate();
        let loan = service
            .apply(borrower, application("1000"))
            .await
            .expect("apply");

        let err = service.disburse(loan.id).await.expect_err("pending loan");
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert!(store.entries_for(borrower).is_empty());
        assert_eq!(store.loan(loan.id).expect("present").status, LoanStatus::Pending);
    }

    #[rstest]
    #[actix_rt::test]
    async fn reject_is_terminal() {
        let store = Arc::new(InMemoryStore::default());
        let service = service(&store);
        let loan = service
            .apply(UserId::generate(), application("1000"))
            .await
            .expect("apply");

        let rejected = service
            .reject(loan.id, Some("insufficient history"))
            .await
            .expect("reject");
        assert_eq!(rejected.status, LoanStatus::Rejected);
        assert_eq!(rejected.decision_note.as_deref(), Some("insufficient history"));

        let err = service.approve(loan.id).await.expect_err("terminal");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[actix_rt::test]
    async fn unknown_loan_is_not_found() {
        let service = service(&Arc::new(InMemoryStore::default()));
        let err = service.approve(LoanId::generate()).await.expect_err("absent");
        assert_eq!(err.code(), ErrorCode::NotFound);
        let err = service.disburse(LoanId::generate()).await.expect_err("absent");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[actix_rt::test]
    async fn racing_approvals_yield_one_winner() {
        let store = Arc::new(InMemoryStore::default());
        let service = service(&store);
        let loan = service
            .apply(UserId::generate(), application("1000"))
            .await
            .expect("apply");

        let first = service.approve(loan.id);
        let second = service.approve(loan.id);
        let (a, b) = futures::join!(first, second);
        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one approval must win");
        let loser = if a.is_err() { a } else { b };
        assert_eq!(loser.expect_err("loser").code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[actix_rt::test]
    async fn disburse_failure_leaves_no_partial_state() {
        let store = Arc::new(InMemoryStore::default());
        let service = service(&store);
        let borrower = UserId::generate();
        let loan = service
            .apply(borrower, application("50000"))
            .await
            .expect("apply");
        let _ = service.approve(loan.id).await.expect("approve");

        store.fail_next_disburse();
        let err = service.disburse(loan.id).await.expect_err("injected failure");
        assert_eq!(err.code(), ErrorCode::Unavailable);
        // All-or-nothing: no ledger entry and the loan is still approved.
        assert!(store.entries_for(borrower).is_empty());
        assert_eq!(store.loan(loan.id).expect("present").status, LoanStatus::Approved);

        let (active, _) = service.disburse(loan.id).await.expect("retry succeeds");
        assert_eq!(active.status, LoanStatus::Active);
        assert_eq!(store.entries_for(borrower).len(), 1);
    }
}
