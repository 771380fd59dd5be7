//! Default value functions for configuration.

use std::path::PathBuf;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Connection Defaults
// =============================================================================

pub fn default_realname() -> String {
    "Quarid IRC Services".to_string()
}

pub fn default_connect_timeout_secs() -> u64 {
    60
}

// =============================================================================
// Services Defaults
// =============================================================================

pub fn default_prefix() -> String {
    "!".to_string()
}

pub fn default_session_window_secs() -> u64 {
    3600
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("quarid.redb")
}

pub fn default_plugin_prefix() -> String {
    "@".to_string()
}
