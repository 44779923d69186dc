//! Logging utilities
//!
//! Standardised messages for file operations and for the records a stage
//! drops under its data-quality policy.

use std::path::Path;
use std::time::Duration;

/// Log the start of a read or write on `path`
pub fn log_operation_start(operation: &str, path: &Path) {
    log::debug!("{operation}: {}", path.display());
}

/// Log a finished read or write with its row count
pub fn log_operation_complete(operation: &str, path: &Path, rows: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(elapsed) => log::info!("{operation} {rows} rows ({}) in {elapsed:.2?}", path.display()),
        None => log::info!("{operation} {rows} rows ({})", path.display()),
    }
}

/// Log a recoverable problem, optionally tied to a file
pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{message}: {}", path.display()),
        None => log::warn!("{message}"),
    }
}

/// Report how many records a step dropped out of how many it saw.
///
/// Drops are logged at `warn` so they are visible under the default filter;
/// a step that dropped nothing logs at `debug`.
pub fn log_drop_summary(step: &str, reason: &str, dropped: usize, total: usize) {
    if dropped == 0 {
        log::debug!("{step}: no records dropped ({total} seen)");
        return;
    }
    #[allow(clippy::cast_precision_loss)]
    let share = if total == 0 {
        0.0
    } else {
        dropped as f64 / total as f64 * 100.0
    };
    log::warn!("{step}: dropped {dropped} of {total} records ({share:.2}%) - {reason}");
}
