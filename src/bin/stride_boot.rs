// ABOUTME: Headless boot runner for exercising the orchestrator outside the app shell
// ABOUTME: Runs one boot sequence against the configured backend and reports the outcome
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Stride Boot Runner
//!
//! Drives one boot sequence from the command line: useful for smoke-testing
//! a deployment's health and current-user endpoints with the exact timer
//! behavior the app shell uses. Exits 0 when the shell would have been
//! released, 2 when the sequence would have landed on the recovery screen.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use stride_boot::{logging, BootConfig, BootOrchestrator, BootState};
use tracing::{info, warn};
use url::Url;

#[derive(Parser)]
#[command(name = "stride-boot")]
#[command(about = "Stride boot orchestrator - timed readiness gate for the app shell")]
pub struct Args {
    /// Backend base URL (overrides STRIDE_API_URL / API_BASE_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Override the deadline timer, in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Override the emergency failsafe timer, in milliseconds
    #[arg(long)]
    failsafe_ms: Option<u64>,

    /// Override the per-probe timeout, in milliseconds
    #[arg(long)]
    probe_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = BootConfig::from_env()?;
    if let Some(raw) = args.api_url {
        config.api_base_url = Some(Url::parse(&raw)?);
    }
    if let Some(ms) = args.deadline_ms {
        config.deadline = Duration::from_millis(ms);
    }
    if let Some(ms) = args.failsafe_ms {
        config.failsafe = Duration::from_millis(ms);
    }
    if let Some(ms) = args.probe_timeout_ms {
        config.probe_timeout = Duration::from_millis(ms);
    }
    config.validate()?;

    let orchestrator = BootOrchestrator::new(config)?;
    if orchestrator.guest_mode() {
        info!("Session file carries the guest flag, credential probe will find no token");
    }

    let mut state = orchestrator.subscribe();
    orchestrator.start();

    while *state.borrow() == BootState::Booting {
        state.changed().await?;
    }

    let resolved = orchestrator.state();
    let status = orchestrator.background_status();
    info!(
        boot.state = %resolved,
        health.checked = status.health_checked,
        health.ok = status.health_ok,
        token.restored = status.token_restored,
        token.valid = status.token_valid,
        "Boot sequence resolved"
    );

    if resolved == BootState::Ready {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("Boot landed on the recovery screen, deadline path was lost");
        Ok(ExitCode::from(2))
    }
}
