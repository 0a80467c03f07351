// ABOUTME: Environment configuration management for the boot sequence
// ABOUTME: Resolves the backend base URL, timer durations, and session path once at startup
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Environment-based boot configuration
//!
//! All ambient lookups happen exactly once, here. The orchestrator and the
//! probes receive a fully resolved [`BootConfig`] and never consult the
//! environment themselves. A missing or unparseable base URL folds into
//! `None`, which the health probe treats as vacuously healthy rather than
//! as an error — an unconfigured backend must never block boot.

use crate::constants::{defaults, env_config, env_vars};
use crate::errors::{BootError, BootResult};
use crate::session::SessionStore;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Resolved configuration for one orchestrator instance
#[derive(Debug, Clone)]
pub struct BootConfig {
    /// Backend base URL; `None` when no backend is configured
    pub api_base_url: Option<Url>,
    /// Timeout applied independently to each readiness probe
    pub probe_timeout: Duration,
    /// Deadline timer duration; the normal trigger to leave `Booting`
    pub deadline: Duration,
    /// Emergency failsafe duration; strictly greater than the deadline
    pub failsafe: Duration,
    /// Fixed backoff before the single health probe retry
    pub health_retry_backoff: Duration,
    /// Location of the durable session file (credential + guest flag)
    pub session_path: PathBuf,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            probe_timeout: Duration::from_millis(defaults::PROBE_TIMEOUT_MS),
            deadline: Duration::from_millis(defaults::DEADLINE_MS),
            failsafe: Duration::from_millis(defaults::FAILSAFE_MS),
            health_retry_backoff: Duration::from_millis(defaults::HEALTH_RETRY_BACKOFF_MS),
            session_path: SessionStore::default_path(),
        }
    }
}

impl BootConfig {
    /// Build configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved durations fail validation. An
    /// invalid base URL is not an error: it is logged and folded into
    /// "no backend configured".
    pub fn from_env() -> BootResult<Self> {
        let api_base_url = env_config::api_base_url().and_then(|raw| match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(
                    config.base_url = %raw,
                    "Ignoring unparseable backend base URL: {e}"
                );
                None
            }
        });

        let session_path = env::var(env_vars::SESSION_PATH)
            .map_or_else(|_| SessionStore::default_path(), PathBuf::from);

        let config = Self {
            api_base_url,
            probe_timeout: Duration::from_millis(env_config::duration_ms(
                env_vars::PROBE_TIMEOUT_MS,
                defaults::PROBE_TIMEOUT_MS,
            )),
            deadline: Duration::from_millis(env_config::duration_ms(
                env_vars::DEADLINE_MS,
                defaults::DEADLINE_MS,
            )),
            failsafe: Duration::from_millis(env_config::duration_ms(
                env_vars::FAILSAFE_MS,
                defaults::FAILSAFE_MS,
            )),
            health_retry_backoff: Duration::from_millis(env_config::duration_ms(
                env_vars::HEALTH_RETRY_BACKOFF_MS,
                defaults::HEALTH_RETRY_BACKOFF_MS,
            )),
            session_path,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate timer relationships
    ///
    /// # Errors
    ///
    /// Returns an error if any duration is zero or if the failsafe does
    /// not strictly exceed the deadline. The failsafe is a watchdog on the
    /// deadline path; an equal or shorter failsafe would race the timer it
    /// is meant to guard.
    pub fn validate(&self) -> BootResult<()> {
        if self.deadline.is_zero() || self.probe_timeout.is_zero() {
            return Err(BootError::Config(
                "deadline and probe timeout must be non-zero".into(),
            ));
        }
        if self.failsafe <= self.deadline {
            return Err(BootError::Config(format!(
                "failsafe ({:?}) must be strictly greater than deadline ({:?})",
                self.failsafe, self.deadline
            )));
        }
        Ok(())
    }

    /// Whether a backend is configured at all
    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.api_base_url.is_some()
    }
}
