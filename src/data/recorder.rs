//! Buffered recorder for sale capture

use super::parquet::{ParquetWriter, SaleRecord};
use crate::config::CaptureConfig;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Configuration for sale recording
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Output directory for Parquet files
    pub output_dir: std::path::PathBuf,
    /// Rotation interval in seconds
    pub rotation_interval_secs: u64,
    /// Buffer size before flushing
    pub buffer_size: usize,
    /// Maximum time between flushes
    pub flush_interval_secs: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: std::path::PathBuf::from("./data"),
            rotation_interval_secs: 3600,
            buffer_size: 1000,
            flush_interval_secs: 60,
        }
    }
}

impl From<&CaptureConfig> for RecorderConfig {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            rotation_interval_secs: config.rotation_interval_secs,
            buffer_size: config.buffer_size,
            flush_interval_secs: config.flush_interval_secs,
        }
    }
}

/// Records fetched sales to Parquet files
pub struct SalesRecorder {
    tx: mpsc::Sender<SaleRecord>,
    stats: Arc<RwLock<RecorderStats>>,
    handle: tokio::task::JoinHandle<()>,
}

/// Recording statistics
#[derive(Debug, Default, Clone)]
pub struct RecorderStats {
    pub records_received: u64,
    pub records_written: u64,
    pub files_written: u64,
    pub last_flush: Option<chrono::DateTime<Utc>>,
}

impl SalesRecorder {
    /// Create a recorder and spawn its writer task
    pub fn new(config: RecorderConfig) -> Self {
        let (tx, rx) = mpsc::channel(10_000);
        let stats = Arc::new(RwLock::new(RecorderStats::default()));

        let writer = ParquetWriter::new(config.output_dir.clone(), config.rotation_interval_secs);
        let writer_stats = stats.clone();
        let handle = tokio::spawn(async move {
            Self::run_writer(rx, writer, config, writer_stats).await;
        });

        Self { tx, stats, handle }
    }

    /// Queue one sale record for capture
    pub async fn record(&self, record: SaleRecord) {
        if self.tx.send(record).await.is_err() {
            tracing::warn!("Sales recorder channel closed, dropping record");
        }
    }

    /// Queue every sale from one fetched history
    pub async fn record_history(&self, history: &crate::market::SaleHistory) {
        for record in SaleRecord::from_history(history) {
            self.record(record).await;
        }
    }

    /// Snapshot current recording statistics
    pub async fn stats(&self) -> RecorderStats {
        self.stats.read().await.clone()
    }

    /// Close the channel, flush what remains, and return final statistics
    pub async fn close(self) -> RecorderStats {
        let Self { tx, stats, handle } = self;
        drop(tx);
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Sales recorder writer task failed");
        }
        let snapshot = stats.read().await;
        snapshot.clone()
    }

    async fn run_writer(
        mut rx: mpsc::Receiver<SaleRecord>,
        mut writer: ParquetWriter,
        config: RecorderConfig,
        stats: Arc<RwLock<RecorderStats>>,
    ) {
        let mut buffer: Vec<SaleRecord> = Vec::with_capacity(config.buffer_size);
        let mut last_flush = Utc::now();
        let flush_interval = Duration::seconds(config.flush_interval_secs as i64);
        let timeout = tokio::time::Duration::from_secs(config.flush_interval_secs);

        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Some(record) => {
                            {
                                let mut s = stats.write().await;
                                s.records_received += 1;
                            }
                            buffer.push(record);

                            if buffer.len() >= config.buffer_size {
                                Self::flush(&mut buffer, &mut writer, &stats).await;
                                last_flush = Utc::now();
                            }
                        }
                        None => {
                            if !buffer.is_empty() {
                                Self::flush(&mut buffer, &mut writer, &stats).await;
                            }
                            tracing::info!("Sales recorder shutting down");
                            break;
                        }
                    }
                }

                _ = tokio::time::sleep(timeout) => {
                    let now = Utc::now();
                    if now - last_flush >= flush_interval && !buffer.is_empty() {
                        Self::flush(&mut buffer, &mut writer, &stats).await;
                        last_flush = now;
                    }
                }
            }
        }
    }

    async fn flush(
        buffer: &mut Vec<SaleRecord>,
        writer: &mut ParquetWriter,
        stats: &Arc<RwLock<RecorderStats>>,
    ) {
        if buffer.is_empty() {
            return;
        }

        let now = Utc::now();
        if writer.needs_rotation(now) {
            writer.mark_rotation(now);
        }

        let path = writer.file_path("sales", now);
        let count = buffer.len();

        match writer.write_sales(&path, buffer) {
            Ok(()) => {
                let mut s = stats.write().await;
                s.records_written += count as u64;
                s.files_written += 1;
                s.last_flush = Some(now);
                tracing::debug!(count, path = ?path, "Flushed sale records");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to write sale records");
            }
        }

        buffer.clear();
    }
}
