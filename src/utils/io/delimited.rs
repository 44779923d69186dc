//! Delimited text files
//!
//! Code columns are always read as strings. Numeric columns that hold a
//! placeholder such as `NA` or `-` should be declared with
//! `#[serde(deserialize_with = "csv::invalid_option")]` on the row type.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::util::{create_file, open_file};
use crate::error::{PanelError, Result};

/// Delimiter implied by a file extension (`tsv` → tab, anything else → comma)
#[must_use]
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tsv" | "tab") => b'\t',
        _ => b',',
    }
}

/// Build a reader over a delimited file with trimmed fields
pub fn open_reader(path: &Path, delimiter: u8) -> Result<csv::Reader<std::fs::File>> {
    let file = open_file(path)?;
    Ok(ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(false)
        .from_reader(file))
}

/// Deserialize every row of a delimited file
pub fn read_delimited<T: DeserializeOwned>(path: &Path, delimiter: u8) -> Result<Vec<T>> {
    let mut reader = open_reader(path, delimiter)?;
    reader
        .deserialize()
        .map(|row| row.map_err(PanelError::from))
        .collect()
}

/// Serialize rows to a delimited file with a header line
pub fn write_delimited<T: Serialize>(path: &Path, rows: &[T], delimiter: u8) -> Result<()> {
    let file = create_file(path)?;
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| PanelError::io(path, e))?;
    Ok(())
}

/// Column positions resolved once from a header line
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    headers: StringRecord,
    source: String,
}

impl ColumnIndex {
    #[must_use]
    pub fn new(headers: StringRecord, source: &Path) -> Self {
        Self {
            headers,
            source: source.display().to_string(),
        }
    }

    /// Position of a required column
    pub fn require(&self, name: &str) -> Result<usize> {
        self.position(name).ok_or_else(|| {
            PanelError::Schema(format!("column `{name}` not found in {}", self.source))
        })
    }

    /// Position of a column if present
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    /// Position of an optional column named by a layout; a configured name
    /// that is absent from the file is an error
    pub fn optional(&self, name: Option<&str>) -> Result<Option<usize>> {
        name.map(|n| self.require(n)).transpose()
    }
}

/// Field of a record as a trimmed, non-empty string
#[must_use]
pub fn field<'a>(record: &'a StringRecord, index: usize) -> Option<&'a str> {
    record.get(index).map(str::trim).filter(|s| !s.is_empty())
}

/// Field of a record parsed as a number; unparsable values are `None`
#[must_use]
pub fn numeric_field(record: &StringRecord, index: usize) -> Option<f64> {
    field(record, index)
        .and_then(|s| s.replace(',', "").parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
