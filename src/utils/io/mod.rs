//! File input and output for raw inputs and staged tables
//!
//! Raw inputs and crosswalks are delimited text read through `csv`. Staged
//! tables are Parquet by default; `table` picks the codec from the file
//! extension so a stage never needs to know which one is configured.

pub mod delimited;
pub mod parquet;
pub mod table;

pub use delimited::{ColumnIndex, read_delimited, write_delimited};
pub use parquet::{DEFAULT_BATCH_SIZE, read_parquet_rows, write_parquet_rows};
pub use table::{read_rows, write_rows};
