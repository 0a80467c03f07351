// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Boot Error Handling
//!
//! Typed errors for the few fallible seams of the boot core: configuration
//! resolution, session persistence, and subscriber setup. Readiness probes
//! are deliberately absent here — every probe failure mode collapses to a
//! boolean outcome and is never surfaced as an error (see
//! [`crate::readiness`]).

use thiserror::Error;

/// Errors produced while constructing or persisting boot state
#[derive(Debug, Error)]
pub enum BootError {
    /// Configuration failed validation (e.g. failsafe not above deadline)
    #[error("invalid boot configuration: {0}")]
    Config(String),

    /// The shared HTTP client could not be constructed
    #[error("HTTP client construction failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Session file read/write failed
    #[error("session persistence failed: {0}")]
    Session(#[from] std::io::Error),

    /// Session file contents could not be encoded
    #[error("session serialization failed: {0}")]
    SessionFormat(#[from] serde_json::Error),

    /// The tracing subscriber could not be installed
    #[error("logging initialization failed: {0}")]
    Logging(String),
}

/// Convenience alias used across the crate
pub type BootResult<T> = Result<T, BootError>;
