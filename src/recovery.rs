// ABOUTME: User-facing recovery flow with retry and continue-as-guest actions
// ABOUTME: Both actions are idempotent once the orchestrator has left the recovery state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Labs

//! Recovery flow
//!
//! Reaching this flow means the emergency failsafe fired: the deadline
//! path was lost and the app would otherwise have hung on the loading
//! screen. The user gets exactly two ways out — restart the whole boot
//! sequence, or skip the backend entirely and continue in guest mode.
//! Neither action can corrupt an attempt that already resolved: both
//! return `false` and do nothing once the orchestrator has moved on.

use crate::lifecycle::OrchestratorInner;
use std::sync::Arc;
use tracing::info;

/// Handle to the two recovery actions
///
/// Cheap to clone into UI callbacks; all state lives in the orchestrator.
#[derive(Clone)]
pub struct RecoveryFlow {
    inner: Arc<OrchestratorInner>,
}

impl RecoveryFlow {
    pub(crate) fn new(inner: Arc<OrchestratorInner>) -> Self {
        Self { inner }
    }

    /// Restart the whole boot sequence
    ///
    /// Resets the background status record, re-arms both timers, and
    /// re-invokes the background checks — nothing from the failed attempt
    /// is reused. Returns `false` without side effects if the orchestrator
    /// is not currently in recovery.
    pub fn retry(&self) -> bool {
        let applied = self.inner.retry();
        if !applied {
            info!(
                boot.state = %self.inner.state(),
                "Retry ignored, orchestrator is not in recovery"
            );
        }
        applied
    }

    /// Continue without a backend session
    ///
    /// Skips straight to ready and durably records guest mode so
    /// subsequent boots do not redundantly probe the stored credential.
    /// Returns `false` without side effects — including no duplicate
    /// persistence write — if the boot attempt already resolved.
    pub fn continue_as_guest(&self) -> bool {
        let applied = self.inner.continue_as_guest();
        if !applied {
            info!(
                boot.state = %self.inner.state(),
                "Guest continue ignored, boot already resolved"
            );
        }
        applied
    }
}
