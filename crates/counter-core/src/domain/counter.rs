use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;

/// Key of the shared counter.
pub const COUNT_KEY: &str = "count";

/// Value stored in a rate-limit record; only its presence matters.
pub const RATE_LIMIT_SENTINEL: &str = "1";

/// How long a rate-limit record keeps an identity from counting again.
pub const RATE_LIMIT_TTL: Duration = Duration::from_secs(86_400);

/// Identifier used when the trusted client-IP header is missing.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Interpret a stored counter value.
///
/// Absent, negative or unparseable values count as zero. Leading digits are
/// honoured (`"12abc"` reads as 12), matching lenient integer parsing.
pub fn parse_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => {
            let trimmed = s.trim_start();
            let digits: &str = trimmed
                .find(|c: char| !c.is_ascii_digit())
                .map_or(trimmed, |end| &trimmed[..end]);
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

/// Whether a vote moved the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteStatus {
    Counted,
    AlreadyCounted,
}

impl VoteStatus {
    pub fn message(self) -> &'static str {
        match self {
            VoteStatus::Counted => "Counted",
            VoteStatus::AlreadyCounted => "Already counted",
        }
    }
}

/// Result of a vote attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub count: u64,
    pub status: VoteStatus,
}

/// Order in which the counter increment and the rate-limit mark happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteOrdering {
    /// `INCR` first, then `SET ... EX`. A failed mark leaves the vote counted
    /// and the identity free to count again in this window.
    #[default]
    IncrementThenMark,
    /// `SET ... EX NX` first, then `INCR` only when the claim succeeded. A
    /// failed increment loses the vote for this window.
    ClaimThenIncrement,
}

impl FromStr for VoteOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "increment-then-mark" => Ok(VoteOrdering::IncrementThenMark),
            "claim-then-increment" => Ok(VoteOrdering::ClaimThenIncrement),
            other => Err(format!("unknown vote ordering: {other}")),
        }
    }
}
