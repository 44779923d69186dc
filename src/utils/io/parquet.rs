//! Parquet staging files
//!
//! Rows are converted to Arrow batches with `serde_arrow` against the
//! row type's declared schema and written with the arrow writer.

use std::path::Path;
use std::time::Instant;

use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::Result;
use crate::error::util::{create_file, open_file};
use crate::models::ArrowSchema;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Default batch size for Parquet reading and writing
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Batch size, overridable through `PANEL_BATCH_SIZE`
#[must_use]
pub fn get_batch_size() -> usize {
    std::env::var("PANEL_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Read every row of a staged Parquet file
pub fn read_parquet_rows<T: ArrowSchema>(path: &Path) -> Result<Vec<T>> {
    let start = Instant::now();
    log_operation_start("Reading staged table", path);

    let file = open_file(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(get_batch_size())
        .build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        rows.extend(T::from_record_batch(&batch)?);
    }

    log_operation_complete("Read", path, rows.len(), Some(start.elapsed()));
    Ok(rows)
}

/// Write rows to a Parquet file, replacing any previous content
pub fn write_parquet_rows<T: ArrowSchema>(path: &Path, rows: &[T]) -> Result<()> {
    let start = Instant::now();
    log_operation_start("Writing staged table", path);

    let file = create_file(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, T::schema_ref(), Some(props))?;
    for chunk in rows.chunks(get_batch_size()) {
        writer.write(&T::to_record_batch(chunk)?)?;
    }
    writer.close()?;

    log_operation_complete("Wrote", path, rows.len(), Some(start.elapsed()));
    Ok(())
}
