//! Domain entities - the counter, rate-limit records and hashed identities.

mod counter;
mod health;
mod identity;

pub use counter::{
    COUNT_KEY, RATE_LIMIT_SENTINEL, RATE_LIMIT_TTL, UNKNOWN_CLIENT, VoteOrdering, VoteOutcome,
    VoteStatus, parse_count,
};
pub use health::{HealthReport, HealthStatus};
pub use identity::{IDENTITY_SALT, IdentityHash, IdentityHasher};
