//! Error categories
//!
//! Coarse grouping of error codes, derived from the numeric range.
//! Used for logging decisions (system errors are always logged) and for
//! clients that only care about the broad class of a failure.

use super::codes::ErrorCode;

/// Broad category of an error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 0xxx: validation, not-found, generic request problems
    General,
    /// 1xxx: authentication
    Auth,
    /// 2xxx: permissions and role grants
    Permission,
    /// 4xxx: payment sessions
    Session,
    /// 5xxx: payment settlement
    Payment,
    /// 6xxx: goods, inventory, pricing
    Goods,
    /// 7xxx: tickets, sequences, barcodes
    Ticket,
    /// 9xxx: system / storage / configuration
    System,
}

impl ErrorCode {
    /// Category of this error code, by numeric range
    pub const fn category(&self) -> ErrorCategory {
        match self.code() {
            0..=999 => ErrorCategory::General,
            1000..=1999 => ErrorCategory::Auth,
            2000..=2999 => ErrorCategory::Permission,
            4000..=4999 => ErrorCategory::Session,
            5000..=5999 => ErrorCategory::Payment,
            6000..=6999 => ErrorCategory::Goods,
            7000..=7999 => ErrorCategory::Ticket,
            _ => ErrorCategory::System,
        }
    }
}
