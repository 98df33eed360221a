use super::*;
use crate::model::Metrics;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;

/// One training run as seen by clients polling its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingJob {
    pub job_id: String,
    pub status: Status,
    pub progress: f64,
    pub message: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub model_path: Option<String>,
    pub metrics: Option<Metrics>,
}

impl TrainingJob {
    pub fn pending(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: Status::Pending,
            progress: 0.0,
            message: String::from("Training job queued"),
            start_time: None,
            end_time: None,
            model_path: None,
            metrics: None,
        }
    }

    pub fn start(&mut self) {
        self.status = Status::Running;
        self.start_time = Some(Utc::now());
    }

    pub fn advance(&mut self, progress: f64, message: impl Into<String>) {
        self.progress = progress.clamp(0.0, 1.0);
        self.message = message.into();
    }

    pub fn complete(&mut self, model_path: Option<String>, metrics: Metrics) {
        self.status = Status::Completed;
        self.progress = 1.0;
        self.message = String::from("Training completed successfully");
        self.end_time = Some(Utc::now());
        self.model_path = model_path;
        self.metrics = Some(metrics);
    }

    /// Progress stays where the failing stage left it.
    pub fn fail(&mut self, error: impl Display) {
        self.status = Status::Failed;
        self.message = format!("Training failed: {}", error);
        self.end_time = Some(Utc::now());
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_sets_timestamps() {
        let mut job = TrainingJob::pending("train_1_0");
        assert_eq!(job.status, Status::Pending);
        assert!(job.start_time.is_none());
        job.start();
        assert_eq!(job.status, Status::Running);
        assert!(job.start_time.is_some());
        job.advance(0.5, "Training model...");
        assert_eq!(job.progress, 0.5);
        job.complete(Some("trained_models/m.bin".into()), Metrics::default());
        assert!(job.is_terminal());
        assert_eq!(job.progress, 1.0);
        assert!(job.end_time.is_some());
    }
    #[test]
    fn failure_message_wraps_error() {
        let mut job = TrainingJob::pending("train_1_0");
        job.start();
        job.advance(0.3, "Setting up target transformation...");
        job.fail("bad column");
        assert_eq!(job.status, Status::Failed);
        assert_eq!(job.message, "Training failed: bad column");
        assert_eq!(job.progress, 0.3);
        assert!(job.metrics.is_none());
    }
    #[test]
    fn serializes_lowercase_status() {
        let json = serde_json::to_value(TrainingJob::pending("train_1_0")).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["model_path"], serde_json::Value::Null);
    }
}
