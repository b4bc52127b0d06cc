//! Shared utilities for the EDU fund.

pub mod logging;

pub use logging::{init_logging, LogFormat};
