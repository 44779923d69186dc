//! Utility functions for error handling
//!
//! Path-aware checks used before a stage opens its inputs.

use std::fs;
use std::path::Path;

use crate::error::{PanelError, Result};

/// Open a file, reporting the path on failure
pub fn open_file(path: &Path) -> Result<fs::File> {
    fs::File::open(path).map_err(|e| PanelError::io(path, e))
}

/// Create a file (and its parent directory), reporting the path on failure
pub fn create_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| PanelError::io(parent, e))?;
        }
    }
    fs::File::create(path).map_err(|e| PanelError::io(path, e))
}

/// Check that a path exists and is a regular file
pub fn ensure_file(path: &Path, purpose: &str) -> Result<()> {
    if !path.is_file() {
        return Err(PanelError::io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found (needed for {purpose})"),
            ),
        ));
    }
    Ok(())
}

/// Check that a directory exists, creating it when `create` is set
pub fn ensure_dir(path: &Path, create: bool) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if create {
        return fs::create_dir_all(path).map_err(|e| PanelError::io(path, e));
    }
    Err(PanelError::io(
        path,
        std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_path() {
        let err = ensure_file(Path::new("/nonexistent/crosswalk.csv"), "region lookup")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("/nonexistent/crosswalk.csv"));
        assert!(message.contains("region lookup"));
    }
}
