//! inbursts CLI library.
//!
//! Exposes the command handlers of the `inbursts` and `inbursts-report`
//! binaries for integration testing.

pub mod capture;
pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod report;
pub mod signal;
