use crate::Error;
use crate::model::Preference;
use crate::model::Transformation;
use crate::store::plain;
use crate::*;
use serde::Deserialize;
use serde::Serialize;

/// Knobs for one training run, as posted to `/start_training`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub model_name: String,
    #[serde(default)]
    pub target_transformation: Transformation,
    #[serde(default = "enabled")]
    pub feature_engineering: bool,
    #[serde(default = "validation_split")]
    pub validation_split: f64,
    #[serde(default = "cross_validation_folds")]
    pub cross_validation_folds: usize,
    #[serde(default)]
    pub device_preference: Preference,
    #[serde(default = "enabled")]
    pub save_model: bool,
}

fn enabled() -> bool {
    true
}
fn validation_split() -> f64 {
    DEFAULT_VALIDATION_SPLIT
}
fn cross_validation_folds() -> usize {
    DEFAULT_CV_FOLDS
}

impl TrainingConfig {
    /// Defaults everywhere except the name.
    pub fn named(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            target_transformation: Transformation::default(),
            feature_engineering: enabled(),
            validation_split: validation_split(),
            cross_validation_folds: cross_validation_folds(),
            device_preference: Preference::default(),
            save_model: enabled(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        let name = self.model_name.trim();
        if name.is_empty() {
            return Err(Error::invalid("model_name must not be empty"));
        }
        if name != self.model_name || plain(name).is_err() {
            return Err(Error::invalid(format!(
                "model_name '{}' must be a plain file name",
                self.model_name
            )));
        }
        if !VALIDATION_SPLIT_RANGE.contains(&self.validation_split) {
            return Err(Error::invalid(format!(
                "validation_split must be between {} and {}, got {}",
                VALIDATION_SPLIT_RANGE.start(),
                VALIDATION_SPLIT_RANGE.end(),
                self.validation_split
            )));
        }
        if !CV_FOLDS_RANGE.contains(&self.cross_validation_folds) {
            return Err(Error::invalid(format!(
                "cross_validation_folds must be between {} and {}, got {}",
                CV_FOLDS_RANGE.start(),
                CV_FOLDS_RANGE.end(),
                self.cross_validation_folds
            )));
        }
        Ok(())
    }
}
