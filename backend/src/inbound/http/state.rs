//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O: tests build
//! the same state over the in-memory store.

use std::sync::Arc;

use crate::domain::{AccountService, LedgerService, LoanService, TokenCodec};
use crate::outbound::persistence::{
    DbPool, DieselLedgerRepository, DieselLoanRepository, DieselReportingQuery,
    DieselUserRepository, InMemoryStore,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Registration, login, profile.
    pub accounts: AccountService,
    /// Loan lifecycle engine.
    pub loans: LoanService,
    /// Ledger reads and reporting.
    pub ledger: LedgerService,
    /// Token verifier used by the bearer extractor.
    pub tokens: TokenCodec,
}

impl HttpState {
    /// Build state over the shared in-memory store. Integration tests and
    /// database-less local runs use this constructor.
    #[must_use]
    pub fn in_memory(store: Arc<InMemoryStore>, tokens: TokenCodec) -> Self {
        Self {
            accounts: AccountService::new(store.clone(), tokens.clone()),
            loans: LoanService::new(store.clone()),
            ledger: LedgerService::new(store.clone(), store),
            tokens,
        }
    }

    /// Build state over the PostgreSQL adapters sharing one pool.
    #[must_use]
    pub fn with_database(pool: DbPool, tokens: TokenCodec) -> Self {
        Self {
            accounts: AccountService::new(
                Arc::new(DieselUserRepository::new(pool.clone())),
                tokens.clone(),
            ),
            loans: LoanService::new(Arc::new(DieselLoanRepository::new(pool.clone()))),
            ledger: LedgerService::new(
                Arc::new(DieselLedgerRepository::new(pool.clone())),
                Arc::new(DieselReportingQuery::new(pool)),
            ),
            tokens,
        }
    }
}
