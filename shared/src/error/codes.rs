//! Unified error codes
//!
//! All error codes used across the workspace, organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Payment session errors
//! - 5xxx: Settlement errors
//! - 6xxx: Goods / inventory errors
//! - 7xxx: Ticket / barcode errors
//! - 9xxx: System errors

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Bearer token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// SHOP role grant is missing its shop id
    ShopIdRequired = 2101,
    /// Role name is not one of the known roles
    InvalidRole = 2102,

    // ==================== 4xxx: Session ====================
    /// Payment session not found
    SessionNotFound = 4001,
    /// Payment session has already been settled
    SessionAlreadyPaid = 4002,
    /// Submitted order has no lines
    SessionEmptyOrder = 4003,

    // ==================== 5xxx: Settlement ====================
    /// Settlement failed
    PaymentFailed = 5001,
    /// Paid amount does not equal the session total
    WrongAmount = 5002,

    // ==================== 6xxx: Goods / Inventory ====================
    /// Goods not found
    GoodsNotFound = 6001,
    /// One or more ordered goods are no longer available
    ItemsGone = 6003,
    /// Order pricing failed (one or more goods unreadable)
    PricingFailed = 6101,

    // ==================== 7xxx: Ticket / Barcode ====================
    /// Ticket not found
    TicketNotFound = 7001,
    /// Shop has no provisioned ticket sequence
    SequenceNotProvisioned = 7002,
    /// Stored ticket sequence could not produce a next number
    TicketNumGenerationFailed = 7003,
    /// Ticket issuance failed
    IssueFailed = 7004,
    /// Requested ticket status transition is not allowed
    InvalidStatusTransition = 7005,
    /// Barcode matched no shop or no candidate ticket
    BarcodeNoMatch = 7101,
    /// Barcode matched more than one shop or ticket
    BarcodeAmbiguous = 7102,
    /// Shop not found
    ShopNotFound = 7201,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenInvalid => "Bearer token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::ShopIdRequired => "SHOP role requires a shop id",
            ErrorCode::InvalidRole => "Unknown role",

            // Session
            ErrorCode::SessionNotFound => "Payment session not found",
            ErrorCode::SessionAlreadyPaid => "Payment session has already been paid",
            ErrorCode::SessionEmptyOrder => "Order has no lines",

            // Settlement
            ErrorCode::PaymentFailed => "Settlement failed",
            ErrorCode::WrongAmount => "Paid amount does not match the session total",

            // Goods / Inventory
            ErrorCode::GoodsNotFound => "Goods not found",
            ErrorCode::ItemsGone => "One or more items are no longer available",
            ErrorCode::PricingFailed => "Failed to price the order",

            // Ticket / Barcode
            ErrorCode::TicketNotFound => "Ticket not found",
            ErrorCode::SequenceNotProvisioned => "Shop has no ticket sequence",
            ErrorCode::TicketNumGenerationFailed => "Failed to generate the next ticket number",
            ErrorCode::IssueFailed => "Failed to issue tickets",
            ErrorCode::InvalidStatusTransition => "Ticket status transition not allowed",
            ErrorCode::BarcodeNoMatch => "Barcode did not match",
            ErrorCode::BarcodeAmbiguous => "Barcode matched more than one target",
            ErrorCode::ShopNotFound => "Shop not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }

    /// HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::Success => StatusCode::OK,

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidRequest
            | ErrorCode::SessionEmptyOrder
            | ErrorCode::ShopIdRequired
            | ErrorCode::InvalidRole => StatusCode::BAD_REQUEST,

            ErrorCode::NotAuthenticated | ErrorCode::TokenInvalid => StatusCode::UNAUTHORIZED,

            ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,

            ErrorCode::NotFound
            | ErrorCode::SessionNotFound
            | ErrorCode::GoodsNotFound
            | ErrorCode::TicketNotFound
            | ErrorCode::SequenceNotProvisioned
            | ErrorCode::BarcodeNoMatch
            | ErrorCode::ShopNotFound => StatusCode::NOT_FOUND,

            ErrorCode::AlreadyExists
            | ErrorCode::SessionAlreadyPaid
            | ErrorCode::WrongAmount
            | ErrorCode::ItemsGone
            | ErrorCode::InvalidStatusTransition => StatusCode::CONFLICT,

            ErrorCode::PricingFailed => StatusCode::UNPROCESSABLE_ENTITY,

            ErrorCode::Unknown
            | ErrorCode::PaymentFailed
            | ErrorCode::TicketNumGenerationFailed
            | ErrorCode::IssueFailed
            | ErrorCode::BarcodeAmbiguous
            | ErrorCode::InternalError
            | ErrorCode::DatabaseError
            | ErrorCode::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2101 => Ok(ErrorCode::ShopIdRequired),
            2102 => Ok(ErrorCode::InvalidRole),

            // Session
            4001 => Ok(ErrorCode::SessionNotFound),
            4002 => Ok(ErrorCode::SessionAlreadyPaid),
            4003 => Ok(ErrorCode::SessionEmptyOrder),

            // Settlement
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::WrongAmount),

            // Goods / Inventory
            6001 => Ok(ErrorCode::GoodsNotFound),
            6003 => Ok(ErrorCode::ItemsGone),
            6101 => Ok(ErrorCode::PricingFailed),

            // Ticket / Barcode
            7001 => Ok(ErrorCode::TicketNotFound),
            7002 => Ok(ErrorCode::SequenceNotProvisioned),
            7003 => Ok(ErrorCode::TicketNumGenerationFailed),
            7004 => Ok(ErrorCode::IssueFailed),
            7005 => Ok(ErrorCode::InvalidStatusTransition),
            7101 => Ok(ErrorCode::BarcodeNoMatch),
            7102 => Ok(ErrorCode::BarcodeAmbiguous),
            7201 => Ok(ErrorCode::ShopNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
