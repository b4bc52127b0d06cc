//! Error taxonomy shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of every failure the fund reports.
///
/// Crate-specific error enums carry the details and map onto one of these
/// kinds, so callers can branch on the category without matching every
/// variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A request or expert lookup missed.
    NotFound,
    /// The entity is not in the status the operation requires.
    InvalidState,
    /// The payer's token balance is below the amount.
    InsufficientFunds,
    /// The payer has not authorised the fund for the amount.
    InsufficientAllowance,
    /// The token collaborator rejected the transfer itself.
    TransferFailed,
    /// A refund claim with no recorded donation.
    NothingToWithdraw,
    /// The caller lacks the capability for this operation.
    Unauthorized,
    /// An argument or configuration value is out of range.
    InvalidArgument,
    /// Persisted state could not be decoded or failed verification.
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::InvalidState => "invalid state",
            Self::InsufficientFunds => "insufficient funds",
            Self::InsufficientAllowance => "insufficient allowance",
            Self::TransferFailed => "transfer failed",
            Self::NothingToWithdraw => "nothing to withdraw",
            Self::Unauthorized => "unauthorized",
            Self::InvalidArgument => "invalid argument",
            Self::Storage => "storage",
        };
        f.write_str(s)
    }
}
