//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PipelineStarted {
                repo_root,
                enabled_stages,
            } => {
                info!(
                    repo = %repo_root.display(),
                    stages = enabled_stages,
                    "Starting pipeline"
                );
            }
            ProgressEvent::StageStarted { stage } => {
                info!(stage, "Stage started");
            }
            ProgressEvent::StageSkipped { stage } => {
                debug!(stage, "Stage skipped");
            }
            ProgressEvent::StageComplete { stage, duration } => {
                info!(
                    stage,
                    duration_ms = duration.as_millis() as u64,
                    "Stage complete"
                );
            }
            ProgressEvent::StageFailed {
                stage,
                duration,
                error,
            } => {
                error!(
                    stage,
                    duration_ms = duration.as_millis() as u64,
                    error = %error,
                    "Stage failed"
                );
            }
            ProgressEvent::Deployed { path } => {
                info!(path = %path.display(), "Worker deployed");
            }
            ProgressEvent::PipelineComplete { total_time } => {
                info!(
                    total_time_ms = total_time.as_millis() as u64,
                    "Pipeline complete"
                );
            }
            ProgressEvent::PipelineFailed { error } => {
                error!(error = %error, "Pipeline failed");
            }
        }
    }
}
