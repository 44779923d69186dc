//! Arrow conversion shared by all staged row types

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow_schema::{FieldRef, Schema, SchemaRef};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// A row type with a fixed Arrow schema.
///
/// Implementors only declare `schema()`; conversion goes through
/// `serde_arrow` against that schema so code columns stay `Utf8`.
pub trait ArrowSchema: Sized + Serialize + DeserializeOwned {
    /// Get the Arrow schema for this row type
    fn schema() -> Schema;

    /// Get the schema as `Arc<Schema>`
    fn schema_ref() -> SchemaRef {
        Arc::new(Self::schema())
    }

    /// Schema fields in the form `serde_arrow` expects
    fn fields() -> Vec<FieldRef> {
        Self::schema().fields().iter().cloned().collect()
    }

    /// Convert a `RecordBatch` to rows
    fn from_record_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        Ok(serde_arrow::from_record_batch(batch)?)
    }

    /// Convert rows to a `RecordBatch`
    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        Ok(serde_arrow::to_record_batch(&Self::fields(), &rows)?)
    }
}
