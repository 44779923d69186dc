//! Extension-based dispatch between Parquet and delimited staging files

use std::path::Path;

use crate::error::Result;
use crate::models::ArrowSchema;

use super::delimited::{delimiter_for, read_delimited, write_delimited};
use super::parquet::{read_parquet_rows, write_parquet_rows};

fn is_parquet(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "parquet")
}

/// Read a staged table
pub fn read_rows<T: ArrowSchema>(path: &Path) -> Result<Vec<T>> {
    if is_parquet(path) {
        read_parquet_rows(path)
    } else {
        read_delimited(path, delimiter_for(path))
    }
}

/// Write a staged table
pub fn write_rows<T: ArrowSchema>(path: &Path, rows: &[T]) -> Result<()> {
    if is_parquet(path) {
        write_parquet_rows(path, rows)
    } else {
        write_delimited(path, rows, delimiter_for(path))
    }
}
