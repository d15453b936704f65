// system-tests/tests/smoke.rs
// ============================================================================
// Module: Smoke Suite
// Description: Aggregates smoke system tests into one binary.
// Purpose: Reduce binaries while keeping smoke coverage centralized.
// Dependencies: suites/*, helpers
// ============================================================================

//! ## Overview
//! Aggregates smoke system tests into one binary.
//! Purpose: Reduce binaries while keeping smoke coverage centralized.
//! Invariants:
//! - Every test spawns its own server on an ephemeral loopback port.
//! - Test workspaces are temp directories torn down after each run.

mod helpers;

#[path = "suites/smoke.rs"]
mod smoke;
