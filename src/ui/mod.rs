//! User interface module - terminal formatting for the CLI.

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_body, display_boundary_warning, display_error, display_status, display_success,
    display_version_changes, format_version_change,
};
