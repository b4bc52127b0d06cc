use edu_types::{Address, TokenAmount};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("{holder} holds {available}, transfer needs {needed}")]
    InsufficientBalance {
        holder: Address,
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("{owner} authorised {available}, transfer needs {needed}")]
    InsufficientAllowance {
        owner: Address,
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("custody holds {available}, payout needs {needed}")]
    InsufficientCustody {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("token backend rejected the transfer: {0}")]
    Rejected(String),
}
