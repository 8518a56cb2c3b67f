//! Training-data capture module
//!
//! Stores fetched sale histories to Parquet so training runs can reuse them
//! without re-fetching

mod parquet;
mod recorder;

pub use parquet::{sale_schema, ParquetWriter, SaleRecord};
pub use recorder::{RecorderConfig, RecorderStats, SalesRecorder};
