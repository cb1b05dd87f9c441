//! Port-level behaviour tests over the in-memory store.
//!
//! These exercise the repository contracts directly, below the HTTP layer:
//! compare-and-set transitions under races, all-or-nothing disbursement, and
//! the newest-first ordering guarantees the services rely on.

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use rstest::rstest;

use microlend::domain::ports::{
    DisburseOutcome, LedgerRepository, LoanRepository, TransitionOutcome,
};
use microlend::domain::{
    EntryId, EntryKind, LedgerEntry, Loan, LoanId, LoanStatus, UserId,
};
use microlend::outbound::persistence::InMemoryStore;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("decimal")
}

fn pending_loan(user: UserId) -> Loan {
    Loan {
        id: LoanId::generate(),
        user_id: user,
        amount_requested: dec("50000"),
        purpose: "working capital".to_owned(),
        term_months: 12,
        status: LoanStatus::Pending,
        decision_note: None,
        created_at: Utc::now(),
    }
}

#[rstest]
#[actix_rt::test]
async fn racing_transitions_admit_exactly_one_winner() {
    let store = Arc::new(InMemoryStore::default());
    let loan = pending_loan(UserId::generate());
    store.insert(&loan).await.expect("insert");

    let (first, second) = futures::join!(
        store.transition(loan.id, LoanStatus::Approved, None),
        store.transition(loan.id, LoanStatus::Rejected, Some("raced")),
    );
    let outcomes = [first.expect("first"), second.expect("second")];

    let applied = outcomes
        .iter()
        .filter(|o| matches!(o, TransitionOutcome::Applied(_)))
        .count();
    let refused = outcomes
        .iter()
        .filter(|o| matches!(o, TransitionOutcome::WrongState(_)))
        .count();
    assert_eq!(applied, 1);
    assert_eq!(refused, 1);
}

#[rstest]
#[actix_rt::test]
async fn disburse_is_all_or_nothing() {
    let store = Arc::new(InMemoryStore::default());
    let user = UserId::generate();
    let loan = pending_loan(user);
    store.insert(&loan).await.expect("insert");
    let outcome = store
        .transition(loan.id, LoanStatus::Approved, None)
        .await
        .expect("approve");
    assert!(matches!(outcome, TransitionOutcome::Applied(_)));

    store.fail_next_disburse();
    store.disburse(loan.id).await.expect_err("injected failure");

    // Neither table moved: loan still approved, ledger empty.
    let snapshot = store.loan(loan.id).expect("loan exists");
    assert_eq!(snapshot.status, LoanStatus::Approved);
    assert!(store.entries_for(user).is_empty());

    // The retry pairs both writes.
    let outcome = store.disburse(loan.id).await.expect("retry");
    let DisburseOutcome::Disbursed { loan, entry } = outcome else {
        panic!("expected disbursement");
    };
    assert_eq!(loan.status, LoanStatus::Active);
    assert_eq!(entry.kind, EntryKind::LoanDisbursement);
    assert_eq!(entry.amount, dec("50000"));
    assert_eq!(entry.loan_id, Some(loan.id));
    assert_eq!(store.entries_for(user).len(), 1);
}

#[rstest]
#[actix_rt::test]
async fn disburse_refuses_non_approved_states() {
    let store = Arc::new(InMemoryStore::default());
    let loan = pending_loan(UserId::generate());
    store.insert(&loan).await.expect("insert");

    let outcome = store.disburse(loan.id).await.expect("pending loan");
    assert_eq!(outcome, DisburseOutcome::WrongState(LoanStatus::Pending));

    let outcome = store.disburse(LoanId::generate()).await.expect("missing");
    assert_eq!(outcome, DisburseOutcome::NotFound);
}

#[rstest]
#[actix_rt::test]
async fn recent_entries_are_newest_first_and_bounded() {
    let store = Arc::new(InMemoryStore::default());
    let user = UserId::generate();
    for n in 1..=4 {
        let entry = LedgerEntry {
            id: EntryId::generate(),
            user_id: user,
            kind: EntryKind::Deposit,
            amount: dec(&n.to_string()),
            loan_id: None,
            created_at: Utc::now(),
        };
        store.append(&entry).await.expect("append");
    }

    let recent = store.recent_for_user(user, 2).await.expect("recent");
    let amounts: Vec<BigDecimal> = recent.into_iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![dec("4"), dec("3")]);

    let other = store
        .recent_for_user(UserId::generate(), 10)
        .await
        .expect("other user");
    assert!(other.is_empty());
}
