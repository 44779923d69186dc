//! Filesystem staging area shared between stages
//!
//! Each staged table is written by exactly one stage and read by any
//! number of later stages. A consumer never starts on a table its
//! producer has not written.

use std::path::{Path, PathBuf};

use crate::config::StagingFormat;
use crate::error::{PanelError, Result};
use crate::models::ArrowSchema;
use crate::utils::io::{read_rows, write_rows};

use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
    format: StagingFormat,
}

impl StagingArea {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, format: StagingFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File of a staged table
    #[must_use]
    pub fn path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.{}", self.format.extension()))
    }

    #[must_use]
    pub fn exists(&self, table: &str) -> bool {
        self.path(table).is_file()
    }

    /// File of a staged table `stage` depends on; fails when it has not
    /// been written
    pub fn require(&self, stage: Stage, table: &str) -> Result<PathBuf> {
        let path = self.path(table);
        if path.is_file() {
            Ok(path)
        } else {
            Err(PanelError::MissingStagedInput {
                stage: stage.name().to_string(),
                path,
            })
        }
    }

    /// Read a staged table on behalf of `stage`
    pub fn read<T: ArrowSchema>(&self, stage: Stage, table: &str) -> Result<Vec<T>> {
        read_rows(&self.require(stage, table)?)
    }

    /// Write a staged table and return its row count
    pub fn write<T: ArrowSchema>(&self, table: &str, rows: &[T]) -> Result<usize> {
        write_rows(&self.path(table), rows)?;
        Ok(rows.len())
    }
}
