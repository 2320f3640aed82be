//! Unified error handling
//!
//! Error codes, the application error type, and the API response shape
//! shared by every crate in the workspace.

pub mod category;
pub mod codes;
pub mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
