//! Parquet file writer with rotation

use arrow::array::{ArrayRef, Int64Array, StringArray, TimestampMicrosecondArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Duration, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use crate::market::SaleHistory;

/// One flattened sale row as captured to disk
#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub timestamp: DateTime<Utc>,
    pub world: String,
    pub item_id: u32,
    pub price_per_unit: Decimal,
    pub quantity: i64,
}

impl SaleRecord {
    /// Flatten one fetched history into capture rows
    pub fn from_history(history: &SaleHistory) -> Vec<Self> {
        history
            .points
            .iter()
            .map(|p| Self {
                timestamp: p.timestamp,
                world: history.world.clone(),
                item_id: history.item_id,
                price_per_unit: p.price,
                quantity: 1,
            })
            .collect()
    }
}

/// Sale record schema fields
pub fn sale_schema() -> Schema {
    Schema::new(vec![
        Field::new(
            "timestamp",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        Field::new("world", DataType::Utf8, false),
        Field::new("item_id", DataType::UInt32, false),
        Field::new("price_per_unit", DataType::Utf8, false), // Store as string for Decimal precision
        Field::new("quantity", DataType::Int64, false),
    ])
}

/// Parquet file writer with time-based rotation
pub struct ParquetWriter {
    output_dir: PathBuf,
    rotation_interval: Duration,
    current_file_start: Option<DateTime<Utc>>,
}

impl ParquetWriter {
    /// Create a new Parquet writer
    pub fn new(output_dir: PathBuf, rotation_interval_secs: u64) -> Self {
        Self {
            output_dir,
            rotation_interval: Duration::seconds(rotation_interval_secs as i64),
            current_file_start: None,
        }
    }

    /// Ensure output directory exists
    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Check if rotation is needed based on current time
    pub fn needs_rotation(&self, now: DateTime<Utc>) -> bool {
        match self.current_file_start {
            None => true,
            Some(start) => now - start >= self.rotation_interval,
        }
    }

    /// Generate file path for a given timestamp and prefix
    pub fn file_path(&self, prefix: &str, timestamp: DateTime<Utc>) -> PathBuf {
        let filename = format!("{}_{}.parquet", prefix, timestamp.format("%Y%m%d_%H%M%S"));
        self.output_dir.join(filename)
    }

    /// Update rotation timestamp
    pub fn mark_rotation(&mut self, timestamp: DateTime<Utc>) {
        self.current_file_start = Some(timestamp);
    }

    /// Write sale records to a Parquet file
    pub fn write_sales(&self, path: &PathBuf, records: &[SaleRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.ensure_dir()?;

        let schema = Arc::new(sale_schema());
        let file = File::create(path)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        let timestamps: Vec<i64> = records
            .iter()
            .map(|r| r.timestamp.timestamp_micros())
            .collect();
        let worlds: Vec<&str> = records.iter().map(|r| r.world.as_str()).collect();
        let item_ids: Vec<u32> = records.iter().map(|r| r.item_id).collect();
        let prices: Vec<String> = records.iter().map(|r| r.price_per_unit.to_string()).collect();
        let quantities: Vec<i64> = records.iter().map(|r| r.quantity).collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(TimestampMicrosecondArray::from(timestamps).with_timezone("UTC"))
                    as ArrayRef,
                Arc::new(StringArray::from(worlds)) as ArrayRef,
                Arc::new(UInt32Array::from(item_ids)) as ArrayRef,
                Arc::new(StringArray::from(
                    prices.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(Int64Array::from(quantities)) as ArrayRef,
            ],
        )?;

        writer.write(&batch)?;
        writer.close()?;

        tracing::debug!(path = ?path, count = records.len(), "Wrote sale records to Parquet");

        Ok(())
    }
}
