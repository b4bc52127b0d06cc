use edu_token::TokenError;
use edu_types::{Address, CourseStatus, ErrorKind, ExpertId, RoundId, TokenAmount};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{caller} is not the administrator")]
    NotAdmin { caller: Address },

    #[error("no registration request from {0}")]
    RequestNotFound(Address),

    #[error("registration request from {0} is already pending")]
    AlreadyPending(Address),

    #[error("{0} is already a registered expert")]
    AlreadyApproved(Address),

    #[error("expert {0} not found")]
    ExpertNotFound(ExpertId),

    #[error("expert {id} is {status:?} and no longer actionable this round")]
    NotActionable { id: ExpertId, status: CourseStatus },

    #[error("expert {id} is {status:?}, donations are closed for this round")]
    CourseClosed { id: ExpertId, status: CourseStatus },

    #[error("course of expert {0} is not canceled")]
    NotCanceled(ExpertId),

    #[error("round {0} is already active")]
    RoundAlreadyActive(RoundId),

    #[error("round id {0} was already used")]
    RoundIdReused(RoundId),

    #[error("no funding round is active")]
    NoActiveRound,

    #[error("round {round} has paid all {slots} reward slots")]
    RewardSlotsExhausted { round: RoundId, slots: u32 },

    #[error("custody holds {available}, payout needs {needed}")]
    CustodyShortfall {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("insufficient allowance: need {needed}, authorised {available}")]
    InsufficientAllowance {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("token transfer failed: {0}")]
    TransferFailed(#[source] TokenError),

    #[error("{voter} has nothing to withdraw from expert {id}")]
    NothingToWithdraw { id: ExpertId, voter: Address },

    #[error("donation of {amount} is below the minimum of {minimum}")]
    BelowMinimumDonation {
        amount: TokenAmount,
        minimum: TokenAmount,
    },

    #[error("token amount overflow")]
    AmountOverflow,

    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl PlatformError {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAdmin { .. } => ErrorKind::Unauthorized,
            Self::RequestNotFound(_) | Self::ExpertNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyPending(_)
            | Self::AlreadyApproved(_)
            | Self::NotActionable { .. }
            | Self::CourseClosed { .. }
            | Self::NotCanceled(_)
            | Self::RoundAlreadyActive(_)
            | Self::RoundIdReused(_)
            | Self::NoActiveRound
            | Self::RewardSlotsExhausted { .. }
            | Self::CustodyShortfall { .. } => ErrorKind::InvalidState,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::InsufficientAllowance { .. } => ErrorKind::InsufficientAllowance,
            Self::TransferFailed(_) => ErrorKind::TransferFailed,
            Self::NothingToWithdraw { .. } => ErrorKind::NothingToWithdraw,
            Self::BelowMinimumDonation { .. }
            | Self::AmountOverflow
            | Self::InvalidAddress(_)
            | Self::Config(_) => ErrorKind::InvalidArgument,
            Self::Snapshot(_) => ErrorKind::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_are_invalid_state() {
        let err = PlatformError::NotActionable {
            id: ExpertId::new(0),
            status: CourseStatus::Done,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(
            PlatformError::AlreadyPending(Address::new("a")).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            PlatformError::RoundAlreadyActive(RoundId::new(1)).kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn test_transfer_failure_keeps_source() {
        let err = PlatformError::TransferFailed(TokenError::Rejected("offline".into()));
        assert_eq!(err.kind(), ErrorKind::TransferFailed);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display_names_the_expert() {
        let err = PlatformError::ExpertNotFound(ExpertId::new(10));
        assert_eq!(err.to_string(), "expert 10 not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
