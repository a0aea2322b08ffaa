pub mod clean;

use colored::Colorize;
use delovable::error::{self, DelovableError};

/// Display an error message with proper formatting
pub fn display_error(err: &anyhow::Error) {
    if let Some(err) = err.downcast_ref::<DelovableError>() {
        error::display_error(err);
        return;
    }

    eprintln!("\n{} {}", "✗".bright_red().bold(), "Operation failed".bright_red().bold());
    eprintln!("  {} {}", "├".bright_black(), err);

    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", "├".bright_black(), cause);
    }

    eprintln!(
        "  {} Run with {} for more details",
        "└".bright_black(),
        "--verbose".bright_cyan()
    );
}
