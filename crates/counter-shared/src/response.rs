//! Error bodies returned by the counter API.

use serde::{Deserialize, Serialize};

/// `{"error": "..."}` - carries a fixed, client-safe message only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self::new("Method not allowed")
    }

    pub fn internal_error() -> Self {
        Self::new("Internal error")
    }
}
