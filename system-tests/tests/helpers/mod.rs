// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for Bindery system-tests.
// Purpose: Provide server harnesses, an HTTP client, and readiness probes.
// Dependencies: system-tests, bindery-api, bindery-config
// ============================================================================

//! ## Overview
//! Shared helpers for Bindery system-tests.
//! Purpose: Provide server harnesses, an HTTP client, and readiness probes.
//! Invariants:
//! - Every suite gets a fresh server on an ephemeral loopback port.
//! - Server workspaces live in per-test temp directories.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod client;
pub mod harness;
pub mod readiness;
pub mod scenarios;
