//! Driving adapters: everything that calls into the domain.

pub mod http;
