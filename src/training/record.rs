use super::*;
use crate::model::Device;
use crate::model::Metrics;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// JSON log written for every completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub job_id: String,
    pub config: TrainingConfig,
    pub metrics: Metrics,
    pub model_path: Option<String>,
    pub training_date: DateTime<Utc>,
    pub device_used: Device,
}
