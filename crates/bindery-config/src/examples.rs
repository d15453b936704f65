// crates/bindery-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starter config for docs and the init command.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for the bookstore configuration. The output is
//! deterministic and matches the built-in defaults.

/// Returns a canonical example `bindery.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind_addr = "127.0.0.1:3001"

[storage]
data_dir = "data"
xslt_dir = "xslt"
database_file = "bookstore.db"

[audit]
sink = "stderr"
# sink = "file"
# path = "bindery-audit.log"
"#,
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================
