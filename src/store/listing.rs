use crate::model::Metrics;
use crate::training::TrainingConfig;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// One model artifact on disk. `config` and `metrics` are absent when the
/// file could not be decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub file_path: String,
    pub creation_date: DateTime<Utc>,
    pub file_size: u64,
    pub config: Option<TrainingConfig>,
    pub metrics: Option<Metrics>,
}

/// One uploaded dataset on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub filename: String,
    pub upload_date: DateTime<Utc>,
    pub file_size: u64,
    pub columns: usize,
    pub sample_columns: Vec<String>,
}
