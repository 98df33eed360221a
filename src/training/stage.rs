/// Checkpoints of a training run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Prepare,
    Engineer,
    Transform,
    Split,
    Fit,
    Evaluate,
    CrossValidate,
    Persist,
}

impl Stage {
    /// Job progress reported on entering this stage.
    pub const fn progress(self) -> f64 {
        match self {
            Self::Prepare => 0.1,
            Self::Engineer => 0.2,
            Self::Transform => 0.3,
            Self::Split => 0.4,
            Self::Fit => 0.5,
            Self::Evaluate => 0.7,
            Self::CrossValidate => 0.8,
            Self::Persist => 0.9,
        }
    }
    pub const fn message(self) -> &'static str {
        match self {
            Self::Prepare => "Preparing data...",
            Self::Engineer => "Applying feature engineering...",
            Self::Transform => "Setting up target transformation...",
            Self::Split => "Splitting data for validation...",
            Self::Fit => "Training model...",
            Self::Evaluate => "Evaluating model...",
            Self::CrossValidate => "Performing cross-validation...",
            Self::Persist => "Saving model...",
        }
    }
}
