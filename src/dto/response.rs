use crate::model::Device;
use crate::registry::Status;
use crate::registry::TrainingJob;
use crate::store::DatasetInfo;
use crate::store::Frame;
use crate::store::ModelInfo;
use serde::Deserialize;
use serde::Serialize;

// ---------------------------------------------------------------------------
// predictor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorHealth {
    pub status: String,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_properties: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPrediction {
    pub blend_index: usize,
    pub predicted_properties: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvPrediction {
    pub id: RowId,
    pub predicted_properties: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictions<T> {
    pub predictions: Vec<T>,
}

/// A CSV row identifier, echoed back as a number when it reads as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl From<&str> for RowId {
    fn from(cell: &str) -> Self {
        cell.parse::<i64>()
            .map(Self::Int)
            .unwrap_or_else(|_| Self::Text(cell.to_string()))
    }
}

// ---------------------------------------------------------------------------
// trainer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerHealth {
    pub status: String,
    pub device: Device,
    pub cuda_available: bool,
    pub active_training_jobs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uploaded {
    pub message: String,
    pub filename: String,
    pub shape: (usize, usize),
    pub columns: Vec<String>,
}

impl Uploaded {
    /// Echoes at most ten column names, then `"..."`.
    pub fn new(filename: String, frame: &Frame) -> Self {
        let mut columns = frame.columns().iter().take(10).cloned().collect::<Vec<_>>();
        if frame.width() > 10 {
            columns.push(String::from("..."));
        }
        Self {
            message: String::from("Dataset uploaded successfully"),
            filename,
            shape: frame.shape(),
            columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Started {
    pub message: String,
    pub job_id: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancelled {
    pub message: String,
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jobs {
    pub jobs: Vec<TrainingJob>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Models {
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasets {
    pub datasets: Vec<DatasetInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deleted {
    pub message: String,
    pub count: usize,
    pub files: Vec<String>,
}

impl From<Vec<String>> for Deleted {
    fn from(files: Vec<String>) -> Self {
        Self {
            message: format!("Deleted {} model files", files.len()),
            count: files.len(),
            files,
        }
    }
}
