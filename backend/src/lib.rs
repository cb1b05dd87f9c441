//! Micro-lending backend library.
//!
//! Layout follows a hexagonal split: `domain` holds entities, services, and
//! ports; `inbound` adapts HTTP onto the services; `outbound` implements the
//! ports against PostgreSQL or memory; `server` wires the pieces together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use doc::ApiDoc;
pub use middleware::Trace;
