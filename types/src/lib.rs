//! Fundamental types for the EDU fund.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! caller addresses, token amounts, expert and round identifiers, lifecycle
//! status enums, fund parameters and the error taxonomy.

pub mod address;
pub mod amount;
pub mod error;
pub mod ids;
pub mod params;
pub mod state;

pub use address::Address;
pub use amount::TokenAmount;
pub use error::ErrorKind;
pub use ids::{ExpertId, RoundId};
pub use params::FundParams;
pub use state::{CourseStatus, RegistrationStatus};
