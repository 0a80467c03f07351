// ABOUTME: Background check runner executing both readiness probes concurrently
// ABOUTME: Publishes advisory status snapshots per attempt with a bounded health retry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Labs

//! Background readiness checks
//!
//! The runner launches the health probe and the credential probe
//! concurrently on one task and publishes each check's outcome the moment
//! that check individually settles — the two are mutually independent, and
//! partial results are visible to subscribers before both complete. A
//! failed health probe earns exactly one retry after a fixed backoff; the
//! credential probe is never retried.
//!
//! The published [`BackgroundStatus`] is advisory only. The orchestrator
//! reads it for logging and telemetry after the fact and never consults it
//! as a gating condition: bounded time-to-interactive beats waiting on
//! network conditions that may never resolve.

use crate::config::BootConfig;
use crate::readiness;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{info, warn};

/// Aggregated probe outcomes for one boot attempt
///
/// All fields start `false` at the beginning of each attempt. The
/// `*_checked`/`*_restored` flag and its outcome are always set together,
/// once, when that check settles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundStatus {
    /// Health probe has settled (including its single retry)
    pub health_checked: bool,
    /// Final health probe outcome
    pub health_ok: bool,
    /// Credential probe has settled
    pub token_restored: bool,
    /// Final credential probe outcome
    pub token_valid: bool,
}

impl BackgroundStatus {
    /// Whether both checks have settled
    #[must_use]
    pub const fn settled(&self) -> bool {
        self.health_checked && self.token_restored
    }
}

/// Single-writer holder of the per-attempt status record
///
/// Writes carry the attempt generation they belong to; a publish from a
/// probe that outlived its boot attempt is dropped rather than applied to
/// the next attempt's record. The generation check runs inside the watch
/// channel's modify closure, so it is atomic with respect to
/// [`BackgroundChecks::begin_attempt`].
pub struct BackgroundChecks {
    tx: watch::Sender<BackgroundStatus>,
    epoch: AtomicU64,
}

impl BackgroundChecks {
    /// Create a holder with an all-false status and generation zero
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(BackgroundStatus::default());
        Self {
            tx,
            epoch: AtomicU64::new(0),
        }
    }

    /// Current status snapshot
    #[must_use]
    pub fn snapshot(&self) -> BackgroundStatus {
        *self.tx.borrow()
    }

    /// Subscribe to status updates
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BackgroundStatus> {
        self.tx.subscribe()
    }

    /// Reset the record for a fresh boot attempt and return the new
    /// attempt generation
    pub fn begin_attempt(&self) -> u64 {
        let mut epoch = 0;
        self.tx.send_modify(|status| {
            epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            *status = BackgroundStatus::default();
        });
        epoch
    }

    /// Run both probes for the given attempt generation
    ///
    /// Returns the final status as this runner observed it. The returned
    /// value is only for the caller's logging; subscribers see the same
    /// outcomes through the watch channel as each check settles.
    pub async fn run(
        &self,
        client: &Client,
        config: &BootConfig,
        token: Option<&str>,
        epoch: u64,
    ) -> BackgroundStatus {
        let base = config.api_base_url.as_ref();

        let health = async {
            let mut ok =
                readiness::check_health(client, base, config.probe_timeout).await;
            if !ok {
                warn!(
                    probe.name = "health",
                    backoff_ms = config.health_retry_backoff.as_millis() as u64,
                    "Health probe failed, retrying once"
                );
                tokio::time::sleep(config.health_retry_backoff).await;
                ok = readiness::check_health(client, base, config.probe_timeout).await;
            }
            self.publish(epoch, |status| {
                status.health_checked = true;
                status.health_ok = ok;
            });
            ok
        };

        let credential = async {
            let ok = readiness::check_stored_credential(
                client,
                base,
                token,
                config.probe_timeout,
            )
            .await;
            self.publish(epoch, |status| {
                status.token_restored = true;
                status.token_valid = ok;
            });
            ok
        };

        // Concurrent on one task: both probes are in flight at once, the
        // faster one publishes first.
        let (health_ok, token_valid) = tokio::join!(health, credential);

        info!(
            boot.attempt = epoch,
            health.ok = health_ok,
            token.valid = token_valid,
            "Background readiness checks settled"
        );

        BackgroundStatus {
            health_checked: true,
            health_ok,
            token_restored: true,
            token_valid,
        }
    }

    fn publish(&self, epoch: u64, update: impl FnOnce(&mut BackgroundStatus)) {
        self.tx.send_if_modified(|status| {
            if self.epoch.load(Ordering::SeqCst) == epoch {
                update(status);
                true
            } else {
                false
            }
        });
    }
}

impl Default for BackgroundChecks {
    fn default() -> Self {
        Self::new()
    }
}
