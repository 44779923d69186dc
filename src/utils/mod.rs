//! Shared utilities: file I/O, logging and numeric policies

pub mod io;
pub mod logging;
pub mod numeric;

pub use io::{read_rows, write_rows};
pub use logging::{log_drop_summary, log_operation_complete, log_operation_start, log_warning};
