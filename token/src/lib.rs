//! Abstract token collaborator for the EDU fund.
//!
//! The fund never moves tokens itself. Every token backend (an on-chain
//! token bridge, an in-memory ledger for testing) implements [`TokenLedger`];
//! the rest of the codebase depends only on the trait.

pub mod error;
pub mod ledger;

pub use error::TokenError;
pub use ledger::TokenLedger;
