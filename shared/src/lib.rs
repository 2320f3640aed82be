//! Shared types for the hall framework
//!
//! Common types used across crates: data model entities, unified error
//! codes, response structures, and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ApiResponse, ErrorCode};
