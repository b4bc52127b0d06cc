//! Nullable infrastructure for deterministic testing.
//!
//! The token collaborator is abstracted behind [`edu_token::TokenLedger`].
//! This crate provides a test-friendly implementation that:
//! - Keeps balances and allowances in memory
//! - Can be told to reject the next transfer
//! - Records every transfer for assertions
//!
//! Usage: hand a [`NullToken`] to the platform in place of a real token bridge.

pub mod token;

pub use token::{NullToken, TransferDirection, TransferRecord};
