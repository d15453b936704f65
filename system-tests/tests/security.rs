// system-tests/tests/security.rs
// ============================================================================
// Module: Security Suite
// Description: Aggregates security system tests into one binary.
// Purpose: Reduce binaries while keeping rejection coverage centralized.
// Dependencies: suites/*, helpers
// ============================================================================

//! ## Overview
//! Aggregates security system tests into one binary.
//! Purpose: Reduce binaries while keeping rejection coverage centralized.
//! Invariants:
//! - Every test spawns its own server on an ephemeral loopback port.
//! - Test workspaces are temp directories torn down after each run.

mod helpers;

#[path = "suites/security.rs"]
mod security;
