// system-tests/src/lib.rs
// ============================================================================
// Module: Bindery System Tests Library
// Description: Shared configuration for system test scenarios.
// Purpose: Provide common utilities for the Bindery system-test binaries.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This crate hosts the shared configuration used by the system-test binaries
//! in `system-tests/tests`: env-driven timeout overrides for the HTTP client
//! and the server readiness probe.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
