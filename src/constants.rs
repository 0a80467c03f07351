// ABOUTME: Boot-time constants with domain-separated organization
// ABOUTME: Timer defaults, environment variable names, and backend route paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Labs

//! Constants module
//!
//! Constants are grouped into logical domains rather than being scattered
//! through the modules that consume them.

use std::env;

/// Default timer and timeout durations, all in milliseconds
pub mod defaults {
    /// Deadline timer: the normal, bounded time-to-interactive
    pub const DEADLINE_MS: u64 = 3_000;

    /// Emergency failsafe timer: must stay strictly above the deadline
    pub const FAILSAFE_MS: u64 = 8_000;

    /// Per-probe timeout for a single readiness check
    pub const PROBE_TIMEOUT_MS: u64 = 2_000;

    /// Fixed backoff before the single health probe retry
    pub const HEALTH_RETRY_BACKOFF_MS: u64 = 500;

    /// TCP connect timeout for the shared HTTP client, in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Environment variable names recognized by `BootConfig::from_env`
pub mod env_vars {
    /// Primary backend base URL variable
    pub const API_URL: &str = "STRIDE_API_URL";

    /// Fallback base URL variable shared with the wider deployment
    pub const API_URL_FALLBACK: &str = "API_BASE_URL";

    /// Deadline timer duration in milliseconds
    pub const DEADLINE_MS: &str = "BOOT_DEADLINE_MS";

    /// Emergency failsafe timer duration in milliseconds
    pub const FAILSAFE_MS: &str = "BOOT_FAILSAFE_MS";

    /// Per-probe timeout in milliseconds
    pub const PROBE_TIMEOUT_MS: &str = "BOOT_PROBE_TIMEOUT_MS";

    /// Health probe retry backoff in milliseconds
    pub const HEALTH_RETRY_BACKOFF_MS: &str = "BOOT_HEALTH_RETRY_BACKOFF_MS";

    /// Override for the session file location
    pub const SESSION_PATH: &str = "STRIDE_SESSION_PATH";
}

/// Backend route paths probed during boot
pub mod routes {
    /// Liveness endpoint; any 2xx means the backend is reachable
    pub const HEALTH: &str = "/health";

    /// Current-user endpoint; 2xx with a bearer token means the stored
    /// credential is still valid
    pub const CURRENT_USER: &str = "/me";
}

/// Service identifiers for structured logging
pub mod service_names {
    /// This crate's service name
    pub const STRIDE_BOOT: &str = "stride-boot";
}

/// Environment-based configuration lookups
pub mod env_config {
    use super::{env, env_vars};

    /// Resolve the backend base URL from the recognized variables, in
    /// priority order. Returns `None` when no source is configured.
    #[must_use]
    pub fn api_base_url() -> Option<String> {
        env::var(env_vars::API_URL)
            .or_else(|_| env::var(env_vars::API_URL_FALLBACK))
            .ok()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
    }

    /// Read a millisecond duration variable, falling back to a default
    #[must_use]
    pub fn duration_ms(var: &str, default_ms: u64) -> u64 {
        env::var(var)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default_ms)
    }
}
