//! Core of the EDU fund.
//!
//! Contributors donate a stable token to vote for approved experts. A single
//! administrator approves expert registrations, runs fixed-budget funding
//! rounds, pays each expert its collected donations plus a share of the
//! budget, and cancels courses so voters can reclaim what they gave.
//!
//! All state is owned by [`EducationPlatform`], the single serialized
//! mutator. The components below are plain state holders it drives:
//!
//! - [`RegistrationRegistry`]: pending and approved registration requests
//! - [`ExpertLedger`]: experts, their per-round balance and donation records
//! - [`RoundController`]: the active funding round and round history
//! - [`distribution`]: reward and refund payouts with rollback on failure

pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod experts;
pub mod registry;
pub mod round;
pub mod snapshot;

pub use config::PlatformConfig;
pub use distribution::{CarriedRefund, RefundBook, RefundPayout, RefundSource, RewardPayout};
pub use engine::EducationPlatform;
pub use error::PlatformError;
pub use experts::{DonationReceipt, Expert, ExpertLedger};
pub use registry::{RegistrationRegistry, RegistrationRequest};
pub use round::{Round, RoundController};
pub use snapshot::{PlatformSnapshot, SnapshotContent};
