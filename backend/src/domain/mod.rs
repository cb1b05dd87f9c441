//! Domain core: entities, lifecycle services, and ports.
//!
//! Everything in this module is transport agnostic. The HTTP adapter maps
//! requests into these types and errors back out; the persistence adapters
//! implement the ports in [`ports`].

pub mod account_service;
pub mod auth;
pub mod error;
pub mod ledger;
pub mod ledger_service;
pub mod loan;
pub mod loan_service;
pub mod ports;
pub mod user;

pub use self::account_service::AccountService;
pub use self::auth::{LoginCredentials, LoginValidationError, Principal, TokenCodec};
pub use self::error::{DomainError, ErrorCode};
pub use self::ledger::{EntryId, EntryKind, LedgerEntry, UnknownEntryKind};
pub use self::ledger_service::{LedgerService, DEFAULT_RECENT_LIMIT};
pub use self::loan::{Loan, LoanApplication, LoanId, LoanStatus, LoanValidationError};
pub use self::loan_service::LoanService;
pub use self::user::{EmailAddress, RegistrationDraft, Role, User, UserId, UserValidationError};
