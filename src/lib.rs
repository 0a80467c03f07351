// ABOUTME: Main library entry point for the Stride app-shell boot core
// ABOUTME: Time-bounded boot orchestration with concurrent readiness checks and a failsafe watchdog
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Labs

#![deny(unsafe_code)]

//! # Stride Boot
//!
//! Boot orchestration for the Stride fitness app shell. This crate decides,
//! under a hard wall-clock deadline, when the splash screen may hand
//! control to the rest of the application, while backend health and
//! stored-credential checks run concurrently in the background.
//!
//! ## Design
//!
//! - **Deadline over readiness**: the deadline timer's expiry is the only
//!   normal trigger to leave the loading state. Probe outcomes are recorded
//!   for telemetry and never gate the transition — a degraded backend gives
//!   the same bounded time-to-interactive as a healthy one.
//! - **Defense in depth**: a second, strictly longer failsafe timer
//!   watches the deadline path itself. If the orchestrator is somehow
//!   still booting when it fires, the user lands on a recovery screen
//!   with retry and continue-as-guest actions instead of a hung splash.
//! - **No escalation**: probe failures collapse to booleans, and nothing
//!   in this crate surfaces to the app as a panic or thrown error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stride_boot::{BootConfig, BootOrchestrator, BootState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = BootOrchestrator::new(BootConfig::from_env()?)?;
//!     let mut state = orchestrator.subscribe();
//!     orchestrator.start();
//!
//!     while *state.borrow() == BootState::Booting {
//!         state.changed().await?;
//!     }
//!     println!("boot resolved: {}", orchestrator.state());
//!     Ok(())
//! }
//! ```

/// Background check runner and the advisory status record
pub mod background;

/// Environment-based boot configuration
pub mod config;

/// Application constants grouped by domain
pub mod constants;

/// Typed errors for the crate's fallible seams
pub mod errors;

/// Boot lifecycle state machine, deadline timer, and failsafe watchdog
pub mod lifecycle;

/// Structured logging setup
pub mod logging;

/// Readiness probes for backend health and stored credentials
pub mod readiness;

/// User-facing recovery actions
pub mod recovery;

/// Durable session storage (stored credential and guest flag)
pub mod session;

pub use background::{BackgroundChecks, BackgroundStatus};
pub use config::BootConfig;
pub use errors::{BootError, BootResult};
pub use lifecycle::{BootFaults, BootOrchestrator, BootState, ReadySignal};
pub use recovery::RecoveryFlow;
pub use session::SessionStore;
