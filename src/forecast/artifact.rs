//! Artifact store for fitted forecaster state
//!
//! Persists model parameters and normalization state as version-tagged JSON
//! blobs at fixed paths under one directory: a model/scaler pair for the
//! sequence forecaster, a single combined pipeline for the tabular one.
//! A file that is absent means "no model trained yet"; a file that is present
//! but unreadable or version-mismatched surfaces as a distinct corrupt-artifact
//! error so it is never silently retrained over.

use super::sequence::SequenceModel;
use super::series::MinMaxScaler;
use super::tabular::TabularPipeline;
use super::ForecastError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// On-disk format version; bumped whenever a payload shape changes
const ARTIFACT_VERSION: u32 = 1;

const SEQUENCE_MODEL_FILE: &str = "sequence_model.json";
const SEQUENCE_SCALER_FILE: &str = "sequence_scaler.json";
const TABULAR_PIPELINE_FILE: &str = "tabular_pipeline.json";

/// Version envelope around every persisted payload
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    payload: T,
}

/// Stores fitted forecaster artifacts under one directory
///
/// Writes to the same slot are serialized behind a per-path lock so
/// concurrent per-world forecasts cannot interleave a load/update/save cycle.
pub struct ArtifactStore {
    root: PathBuf,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ArtifactStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Paths of the sequence forecaster's model/scaler pair
    pub fn sequence_paths(&self) -> (PathBuf, PathBuf) {
        (
            self.root.join(SEQUENCE_MODEL_FILE),
            self.root.join(SEQUENCE_SCALER_FILE),
        )
    }

    /// Path of the tabular forecaster's combined pipeline
    pub fn tabular_path(&self) -> PathBuf {
        self.root.join(TABULAR_PIPELINE_FILE)
    }

    /// Lock guarding one slot; hold the guard across load-update-save
    pub fn slot_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("artifact lock table poisoned");
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Whether both sequence artifacts exist
    pub fn sequence_exists(&self) -> bool {
        let (model, scaler) = self.sequence_paths();
        model.exists() && scaler.exists()
    }

    /// Whether the tabular pipeline artifact exists
    pub fn tabular_exists(&self) -> bool {
        self.tabular_path().exists()
    }

    /// Persist the sequence model and its scaler
    pub fn save_sequence(
        &self,
        model: &SequenceModel,
        scaler: &MinMaxScaler,
    ) -> Result<(), ForecastError> {
        let (model_path, scaler_path) = self.sequence_paths();
        self.save_json(&model_path, model)?;
        self.save_json(&scaler_path, scaler)?;
        tracing::debug!(path = %model_path.display(), "Saved sequence artifacts");
        Ok(())
    }

    /// Load the sequence model and its scaler
    ///
    /// Returns [`ForecastError::MissingArtifact`] if either file is absent.
    pub fn load_sequence(&self) -> Result<(SequenceModel, MinMaxScaler), ForecastError> {
        let (model_path, scaler_path) = self.sequence_paths();
        let model = self.load_json(&model_path)?;
        let scaler = self.load_json(&scaler_path)?;
        Ok((model, scaler))
    }

    /// Persist the tabular pipeline
    pub fn save_tabular(&self, pipeline: &TabularPipeline) -> Result<(), ForecastError> {
        let path = self.tabular_path();
        self.save_json(&path, pipeline)?;
        tracing::debug!(path = %path.display(), "Saved tabular pipeline");
        Ok(())
    }

    /// Load the tabular pipeline
    pub fn load_tabular(&self) -> Result<TabularPipeline, ForecastError> {
        self.load_json(&self.tabular_path())
    }

    /// Age of the sequence artifacts, `None` when absent or unreadable
    pub fn sequence_age(&self) -> Option<Duration> {
        let (model_path, _) = self.sequence_paths();
        Self::age_of(&model_path)
    }

    /// Age of the tabular artifact, `None` when absent or unreadable
    pub fn tabular_age(&self) -> Option<Duration> {
        Self::age_of(&self.tabular_path())
    }

    fn age_of(path: &Path) -> Option<Duration> {
        let modified = fs::metadata(path).ok()?.modified().ok()?;
        SystemTime::now().duration_since(modified).ok()
    }

    fn save_json<T: Serialize>(&self, path: &Path, payload: &T) -> Result<(), ForecastError> {
        fs::create_dir_all(&self.root).map_err(|source| ForecastError::ArtifactIo {
            path: self.root.clone(),
            source,
        })?;

        let envelope = Envelope {
            version: ARTIFACT_VERSION,
            payload,
        };
        let bytes =
            serde_json::to_vec_pretty(&envelope).map_err(|e| ForecastError::ArtifactIo {
                path: path.to_path_buf(),
                source: std::io::Error::other(e),
            })?;

        fs::write(path, bytes).map_err(|source| ForecastError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })
    }

    fn load_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, ForecastError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ForecastError::MissingArtifact {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(ForecastError::ArtifactIo {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|e| ForecastError::CorruptArtifact {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if envelope.version != ARTIFACT_VERSION {
            return Err(ForecastError::CorruptArtifact {
                path: path.to_path_buf(),
                reason: format!(
                    "version mismatch: found {}, expected {}",
                    envelope.version, ARTIFACT_VERSION
                ),
            });
        }

        Ok(envelope.payload)
    }
}
