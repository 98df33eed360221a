use crate::features::BlendSample;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub blends: Vec<BlendSample>,
}

/// Query string of `/start_training`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartTraining {
    pub dataset_filename: String,
}
