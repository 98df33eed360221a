//! Training and inference services for blend property regression.
//!
//! A blend is five components mixed by volume fraction, each component
//! described by ten measured properties. The crate assembles those blends into
//! fixed-width feature tables, fits multi-output regression pipelines on
//! uploaded datasets, and serves predictions from a resident pipeline.
//!
//! ## Modules
//!
//! - [`features`]: blend samples and the 55/65-column feature tables
//! - [`model`]: estimator, target transforms, metrics, splits, bundles
//! - [`store`]: flat-file datasets, model artifacts, training logs
//! - [`registry`]: in-memory training job lifecycle
//! - [`workers`]: fixed-size thread pools for blocking fit/predict calls
//! - [`training`]: the staged training orchestrator and its HTTP service
//! - [`inference`]: the resident predictor and its HTTP service
pub mod dto;
pub mod error;
pub mod features;
pub mod inference;
pub mod model;
pub mod registry;
pub mod store;
pub mod training;
pub mod workers;

#[cfg(feature = "server")]
pub mod config;

pub use error::Error;

// ============================================================================
// BLEND SHAPE
// ============================================================================
/// Components mixed in one blend.
pub const N_COMPONENTS: usize = 5;
/// Measured properties per component, and predicted properties per blend.
pub const N_PROPERTIES: usize = 10;
/// Raw feature width: one fraction plus ten properties per component.
pub const N_FEATURES: usize = N_COMPONENTS + N_COMPONENTS * N_PROPERTIES;
/// Feature width after appending one weighted average per property.
pub const N_ENGINEERED: usize = N_FEATURES + N_PROPERTIES;
/// Target columns following the features in a training dataset.
pub const N_TARGETS: usize = N_PROPERTIES;

// ============================================================================
// DATASETS
// ============================================================================
/// Minimum column count accepted on upload (features plus some targets).
pub const MIN_DATASET_COLUMNS: usize = 60;
/// Identifier column dropped from training datasets.
pub const DATASET_ID_COLUMN: &str = "ID";
/// Identifier column required on CSV prediction uploads.
pub const PREDICTION_ID_COLUMN: &str = "id";

// ============================================================================
// TRAINING
// ============================================================================
/// Seed shared by the hold-out split and k-fold shuffles.
pub const SPLIT_SEED: u64 = 42;
/// Overall elastic net penalty strength.
pub const ELASTICNET_PENALTY: f64 = 0.01;
/// Share of the penalty applied as L1 (the rest is L2).
pub const ELASTICNET_L1_RATIO: f64 = 0.5;
/// Coordinate descent iteration cap.
pub const ELASTICNET_MAX_ITERATIONS: u32 = 1000;
/// Search interval for the Yeo-Johnson lambda.
pub const POWER_LAMBDA_BOUNDS: (f64, f64) = (-2.0, 2.0);
/// Golden-section iterations used to locate the Yeo-Johnson lambda.
pub const POWER_LAMBDA_ITERATIONS: usize = 64;
/// Accepted hold-out shares.
pub const VALIDATION_SPLIT_RANGE: std::ops::RangeInclusive<f64> = 0.1..=0.4;
pub const DEFAULT_VALIDATION_SPLIT: f64 = 0.2;
/// Accepted cross-validation fold counts.
pub const CV_FOLDS_RANGE: std::ops::RangeInclusive<usize> = 3..=10;
pub const DEFAULT_CV_FOLDS: usize = 5;

// ============================================================================
// WORKER POOLS
// ============================================================================
/// Threads serving predictions.
pub const INFERENCE_POOL_SIZE: usize = 4;
/// Threads running training jobs; fits are heavy, so keep this small.
pub const TRAINING_POOL_SIZE: usize = 2;

// ============================================================================
// ARTIFACT LAYOUT
// ============================================================================
/// Directory holding fitted model bundles.
pub const MODELS_DIR: &str = "trained_models";
/// Directory holding per-job JSON training logs.
pub const LOGS_DIR: &str = "training_logs";
/// Directory holding uploaded datasets.
pub const DATASETS_DIR: &str = "datasets";
/// File extension of model bundles.
pub const MODEL_EXTENSION: &str = "bin";
/// Timestamp suffix used for dataset and model filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
