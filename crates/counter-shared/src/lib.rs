//! # Counter Shared
//!
//! Wire types and presentation helpers shared by the counter service and its clients.

pub mod dto;
pub mod format;
pub mod response;

pub use format::format_count;
pub use response::ErrorBody;
