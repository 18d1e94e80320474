//! Domain-level error types.

use thiserror::Error;

/// Key-value backend failures.
///
/// Carries the underlying detail for logs; callers at the HTTP edge must
/// never forward it to clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Store returned an error: {0}")]
    Store(String),

    #[error("Store unreachable: {0}")]
    Transport(String),

    #[error("Malformed store response: {0}")]
    Decode(String),
}
