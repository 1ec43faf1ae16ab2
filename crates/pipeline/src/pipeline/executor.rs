use super::context::StageContext;
use super::result::{StageOutcome, StageResult};
use super::stage_trait::Stage;
use super::state::PipelineState;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use workerforge_core::{PipelineError, ProgressEvent, ProgressHandler};

pub struct PlannedStage {
    pub stage: Box<dyn Stage>,
    pub enabled: bool,
}

/// Runs planned stages in order and stops at the first failure.
///
/// Disabled stages are recorded as skipped without entering their state.
/// Nothing after a failed stage is started and nothing before it is undone.
pub struct StageExecutor {
    state: PipelineState,
    history: Vec<PipelineState>,
    results: Vec<StageResult>,
    progress: Arc<dyn ProgressHandler>,
}

impl StageExecutor {
    pub fn new(progress: Arc<dyn ProgressHandler>) -> Self {
        Self {
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
            results: Vec::new(),
            progress,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<StageResult> {
        self.results
    }

    pub fn run(
        &mut self,
        plan: Vec<PlannedStage>,
        context: &mut StageContext,
    ) -> Result<(), PipelineError> {
        for planned in plan {
            let kind = planned.stage.kind();

            if !planned.enabled {
                self.results.push(StageResult::skipped(kind));
                self.progress
                    .on_progress(&ProgressEvent::StageSkipped { stage: kind.name() });
                continue;
            }

            self.transition(kind.active_state());
            self.progress
                .on_progress(&ProgressEvent::StageStarted { stage: kind.name() });

            let start = Instant::now();
            let outcome = planned.stage.execute(context);
            let duration = start.elapsed();

            match outcome {
                Ok(()) => {
                    self.results.push(StageResult {
                        stage: kind,
                        outcome: StageOutcome::Succeeded,
                        duration_ms: duration.as_millis() as u64,
                        error: None,
                    });
                    self.progress.on_progress(&ProgressEvent::StageComplete {
                        stage: kind.name(),
                        duration,
                    });
                }
                Err(error) => {
                    self.results.push(StageResult {
                        stage: kind,
                        outcome: StageOutcome::Failed,
                        duration_ms: duration.as_millis() as u64,
                        error: Some(error.to_string()),
                    });
                    self.progress.on_progress(&ProgressEvent::StageFailed {
                        stage: kind.name(),
                        duration,
                        error: error.to_string(),
                    });
                    self.transition(PipelineState::Failed);
                    return Err(error);
                }
            }
        }

        self.transition(PipelineState::Done);
        Ok(())
    }

    fn transition(&mut self, next: PipelineState) {
        info!(from = %self.state, to = %next, "Pipeline state change");
        self.state = next;
        self.history.push(next);
    }
}
