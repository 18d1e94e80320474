//! Middleware modules.

pub mod cors;
pub mod error;
pub mod request_log;

pub use cors::{Cors, CorsPolicy};
pub use error::{AppError, AppResult};
pub use request_log::RequestLog;
