//! Pure formatting functions for UI output.
//!
//! Styled terminal messages for the CLI front end. Body text that may be
//! piped elsewhere goes to stdout unstyled; everything else goes to stderr.

use crate::boundary::BoundaryWarning;
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    eprintln!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    eprintln!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// One line describing a library's version change
pub fn format_version_change(library_id: &str, current: &str, next: &str) -> String {
    let current = if current.is_empty() { "(none)" } else { current };
    if current == next {
        format!("{}: {} (unchanged)", library_id, current)
    } else {
        format!("{}: {} -> {}", library_id, current, next)
    }
}

/// Display the proposed version changes, one library per line.
///
/// # Arguments
/// * `changes` - `(library id, current version, next version)` triples
pub fn display_version_changes(changes: &[(String, String, String)]) {
    if changes.is_empty() {
        return;
    }
    eprintln!("\n{}", style("Proposed versions:").bold());
    for (id, current, next) in changes {
        let line = format_version_change(id, current, next);
        if current == next {
            eprintln!("  {}", style(line).dim());
        } else {
            eprintln!("  {}", style(line).green());
        }
    }
}

/// Print a rendered pull-request body.
pub fn display_body(body: &str) {
    print!("{}", body);
    if !body.ends_with('\n') {
        println!();
    }
}
