//! Persistence adapters implementing the domain ports.
//!
//! The Diesel adapters talk to PostgreSQL through the async pool; the
//! in-memory store implements the same ports for tests and local runs
//! without a database.

pub mod diesel_ledger_repository;
pub mod diesel_loan_repository;
pub mod diesel_reporting;
pub mod diesel_user_repository;
mod error_mapping;
pub mod memory;
pub mod models;
pub mod pool;
pub mod schema;

pub use diesel_ledger_repository::DieselLedgerRepository;
pub use diesel_loan_repository::DieselLoanRepository;
pub use diesel_reporting::DieselReportingQuery;
pub use diesel_user_repository::DieselUserRepository;
pub use memory::InMemoryStore;
pub use pool::{DbPool, PoolConfig, PoolError};

diesel::define_sql_function! {
    /// SQL `lower()` used for case-insensitive email and status matching.
    fn lower(value: diesel::sql_types::Text) -> diesel::sql_types::Text;
}
