// ABOUTME: Durable session storage for the stored credential and the guest-mode flag
// ABOUTME: Single JSON file read at boot and written once per guest-continue action
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Labs

//! Durable session state
//!
//! One small JSON file holds everything the boot core needs to survive a
//! process restart: the stored bearer credential (if any) and the
//! `is_guest` flag. Downstream authentication logic reads the flag at
//! subsequent boots to short-circuit login prompts; this crate only ever
//! writes it from the guest-continue action.
//!
//! Load failures degrade, never fail: a missing or corrupt file reads as
//! "no stored credential, not a guest".

use crate::errors::BootResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk session file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    /// Stored bearer credential from a previous authenticated session
    #[serde(default)]
    token: Option<String>,
    /// Durable guest-mode flag
    #[serde(default)]
    is_guest: bool,
    /// When guest mode was chosen, for support diagnostics
    #[serde(default)]
    guest_since: Option<DateTime<Utc>>,
}

/// Handle to the durable session file
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store backed by the given file path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default session file location: the platform data directory, with a
    /// relative fallback for containerized runs
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir().map_or_else(
            || PathBuf::from("./data/session.json"),
            |dir| dir.join("stride").join("session.json"),
        )
    }

    /// Path this store reads and writes
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored bearer credential, if a previous session left one behind
    #[must_use]
    pub fn stored_token(&self) -> Option<String> {
        self.load().token.filter(|t| !t.is_empty())
    }

    /// Whether a previous boot durably chose guest mode
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.load().is_guest
    }

    /// Durably record the guest-mode choice
    ///
    /// The token, if any, is preserved so a later sign-in can still find
    /// it. Callers treat a failed write as a logged degradation, not a
    /// boot failure: losing the flag only costs a future boot one
    /// redundant credential probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or encoded.
    pub fn set_guest(&self) -> BootResult<()> {
        let mut session = self.load();
        session.is_guest = true;
        session.guest_since = Some(Utc::now());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&session)?)?;

        info!(session.path = %self.path.display(), "Guest mode persisted");
        Ok(())
    }

    fn load(&self) -> SessionFile {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                debug!(
                    session.path = %self.path.display(),
                    "Session file unreadable, treating as empty: {e}"
                );
                SessionFile::default()
            }),
            Err(_) => SessionFile::default(),
        }
    }
}
