//! HTTP adapter: handlers, extractors, and error mapping.
//!
//! Handlers translate between JSON payloads and domain types; all business
//! rules live behind the services in [`crate::domain`]. Route registration
//! happens in [`crate::server`].

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod bearer;
pub mod error;
pub mod health;
pub mod loans;
pub mod state;

pub use self::error::{ApiError, ApiResult};
pub use self::health::HealthState;
pub use self::state::HttpState;
