//! # Counter Core
//!
//! The domain layer of the 1mb presence counter.
//! This crate contains the vote and rate-limit rules with zero infrastructure dependencies;
//! the key-value store and event sink are reached through the traits in [`ports`].

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use error::BackendError;
pub use service::CounterService;
