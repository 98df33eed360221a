//! Command-line and environment configuration for the two binaries.
use crate::model::Preference;
use crate::*;
use clap::Parser;
use std::path::PathBuf;

/// Serves predictions from one pre-trained model bundle.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct PredictorArgs {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: String,
    /// Model bundle loaded at startup.
    #[arg(long, env = "MODEL_PATH", default_value = "blend_model.bin")]
    pub model: PathBuf,
    /// Prediction worker threads.
    #[arg(long, env = "POOL_SIZE", default_value_t = INFERENCE_POOL_SIZE)]
    pub workers: usize,
    /// auto, cpu or cuda.
    #[arg(long, env = "DEVICE", default_value = "auto")]
    pub device: Preference,
}

/// Trains model bundles from uploaded datasets and manages the results.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct TrainerArgs {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8001")]
    pub bind: String,
    /// Directory holding datasets, trained models and training logs.
    #[arg(long, env = "STORE_ROOT", default_value = ".")]
    pub root: PathBuf,
    /// Concurrent training jobs.
    #[arg(long, env = "POOL_SIZE", default_value_t = TRAINING_POOL_SIZE)]
    pub workers: usize,
}
