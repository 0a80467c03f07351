// ABOUTME: Asynchronous readiness probes for backend health and stored-credential validity
// ABOUTME: Each probe owns a timeout and collapses every failure mode to a boolean
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Stride Labs

//! Readiness probes
//!
//! A probe answers one question about an external dependency with a plain
//! `bool`. Probes never return errors: connect failures, non-2xx
//! responses, and timeouts all read as `false`, and the caller records the
//! outcome without escalating it. The boot deadline does not wait on
//! probes, so a wrong `false` costs telemetry accuracy, not boot time.

use crate::constants::routes;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

/// Probe the backend health endpoint
///
/// Success is any 2xx response within `probe_timeout`. With no base URL
/// configured the probe short-circuits to `true`: an unconfigured
/// dependency is vacuously healthy rather than a boot obstacle.
pub async fn check_health(client: &Client, base_url: Option<&Url>, probe_timeout: Duration) -> bool {
    let Some(base) = base_url else {
        debug!(probe.name = "health", "No backend configured, vacuously healthy");
        return true;
    };

    let url = join_route(base, routes::HEALTH);
    let start = Instant::now();
    let ok = match timeout(probe_timeout, client.get(&url).send()).await {
        Ok(Ok(response)) => response.status().is_success(),
        Ok(Err(e)) => {
            debug!(probe.name = "health", probe.url = %url, "Health probe failed: {e}");
            false
        }
        Err(_) => {
            debug!(
                probe.name = "health",
                probe.url = %url,
                probe.timeout_ms = probe_timeout.as_millis() as u64,
                "Health probe timed out"
            );
            false
        }
    };

    info!(
        probe.name = "health",
        probe.ok = ok,
        probe.duration_ms = elapsed_millis(start),
        "Health probe settled"
    );
    ok
}

/// Probe the current-user endpoint with the stored bearer credential
///
/// Success is a 2xx response within `probe_timeout`. An absent credential
/// is a valid `false` outcome, not a probe failure, and makes no network
/// call. With no base URL configured the probe is vacuously `true`, same
/// as the health probe.
pub async fn check_stored_credential(
    client: &Client,
    base_url: Option<&Url>,
    token: Option<&str>,
    probe_timeout: Duration,
) -> bool {
    let Some(base) = base_url else {
        debug!(probe.name = "credential", "No backend configured, vacuously valid");
        return true;
    };
    let Some(token) = token else {
        info!(
            probe.name = "credential",
            probe.ok = false,
            "No stored credential, proceeding without a restored session"
        );
        return false;
    };

    let url = join_route(base, routes::CURRENT_USER);
    let start = Instant::now();
    let ok = match timeout(probe_timeout, client.get(&url).bearer_auth(token).send()).await {
        Ok(Ok(response)) => response.status().is_success(),
        Ok(Err(e)) => {
            debug!(probe.name = "credential", probe.url = %url, "Credential probe failed: {e}");
            false
        }
        Err(_) => {
            debug!(
                probe.name = "credential",
                probe.url = %url,
                probe.timeout_ms = probe_timeout.as_millis() as u64,
                "Credential probe timed out"
            );
            false
        }
    };

    info!(
        probe.name = "credential",
        probe.ok = ok,
        probe.duration_ms = elapsed_millis(start),
        "Credential probe settled"
    );
    ok
}

fn join_route(base: &Url, route: &str) -> String {
    format!("{}{route}", base.as_str().trim_end_matches('/'))
}

fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
