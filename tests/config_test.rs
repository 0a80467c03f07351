// ABOUTME: Unit tests for environment-based boot configuration
// ABOUTME: Validates URL fallback resolution, duration parsing, and timer validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Labs
#![allow(missing_docs)]

use serial_test::serial;
use std::env;
use std::time::Duration;
use stride_boot::BootConfig;

const URL_VARS: &[&str] = &["STRIDE_API_URL", "API_BASE_URL"];
const DURATION_VARS: &[&str] = &[
    "BOOT_DEADLINE_MS",
    "BOOT_FAILSAFE_MS",
    "BOOT_PROBE_TIMEOUT_MS",
    "BOOT_HEALTH_RETRY_BACKOFF_MS",
    "STRIDE_SESSION_PATH",
];

fn clear_env() {
    for var in URL_VARS.iter().chain(DURATION_VARS) {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_apply_without_environment() {
    clear_env();
    let config = BootConfig::from_env().unwrap();

    assert!(config.api_base_url.is_none());
    assert!(!config.has_backend());
    assert_eq!(config.deadline, Duration::from_millis(3_000));
    assert_eq!(config.failsafe, Duration::from_millis(8_000));
    assert_eq!(config.probe_timeout, Duration::from_millis(2_000));
    assert_eq!(config.health_retry_backoff, Duration::from_millis(500));
}

#[test]
#[serial]
fn primary_url_variable_wins_over_fallback() {
    clear_env();
    env::set_var("STRIDE_API_URL", "https://api.stride.example");
    env::set_var("API_BASE_URL", "https://other.example");

    let config = BootConfig::from_env().unwrap();
    let base = config.api_base_url.unwrap();
    assert_eq!(base.host_str(), Some("api.stride.example"));
    clear_env();
}

#[test]
#[serial]
fn fallback_url_variable_is_used_when_primary_is_absent() {
    clear_env();
    env::set_var("API_BASE_URL", "https://fallback.example");

    let config = BootConfig::from_env().unwrap();
    let base = config.api_base_url.unwrap();
    assert_eq!(base.host_str(), Some("fallback.example"));
    clear_env();
}

#[test]
#[serial]
fn unparseable_url_folds_into_no_backend() {
    clear_env();
    env::set_var("STRIDE_API_URL", "not a url at all");

    let config = BootConfig::from_env().unwrap();
    assert!(config.api_base_url.is_none());
    clear_env();
}

#[test]
#[serial]
fn duration_overrides_are_read_in_milliseconds() {
    clear_env();
    env::set_var("BOOT_DEADLINE_MS", "1500");
    env::set_var("BOOT_FAILSAFE_MS", "4000");
    env::set_var("BOOT_PROBE_TIMEOUT_MS", "900");
    env::set_var("BOOT_HEALTH_RETRY_BACKOFF_MS", "125");

    let config = BootConfig::from_env().unwrap();
    assert_eq!(config.deadline, Duration::from_millis(1_500));
    assert_eq!(config.failsafe, Duration::from_millis(4_000));
    assert_eq!(config.probe_timeout, Duration::from_millis(900));
    assert_eq!(config.health_retry_backoff, Duration::from_millis(125));
    clear_env();
}

#[test]
#[serial]
fn garbage_duration_falls_back_to_default() {
    clear_env();
    env::set_var("BOOT_DEADLINE_MS", "soon");

    let config = BootConfig::from_env().unwrap();
    assert_eq!(config.deadline, Duration::from_millis(3_000));
    clear_env();
}

#[test]
#[serial]
fn failsafe_must_strictly_exceed_deadline() {
    clear_env();
    env::set_var("BOOT_DEADLINE_MS", "5000");
    env::set_var("BOOT_FAILSAFE_MS", "5000");

    assert!(BootConfig::from_env().is_err());
    clear_env();
}

#[test]
fn validate_rejects_zero_durations() {
    let config = BootConfig {
        deadline: Duration::ZERO,
        ..BootConfig::default()
    };
    assert!(config.validate().is_err());

    let config = BootConfig {
        probe_timeout: Duration::ZERO,
        ..BootConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn validate_accepts_the_defaults() {
    assert!(BootConfig::default().validate().is_ok());
}
