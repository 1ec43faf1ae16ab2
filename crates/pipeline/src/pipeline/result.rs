use super::state::{PipelineState, StageKind};
use serde::Serialize;
use std::path::PathBuf;
use workerforge_core::ResolvedTargets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOutcome {
    Succeeded,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub stage: StageKind,
    pub outcome: StageOutcome,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageResult {
    pub fn skipped(stage: StageKind) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Skipped,
            duration_ms: 0,
            error: None,
        }
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub final_state: PipelineState,
    /// Absent when the run was rejected before version resolution.
    pub targets: Option<ResolvedTargets>,
    pub stages: Vec<StageResult>,
    pub deployed_path: Option<PathBuf>,
    pub duration_ms: u64,
}

impl PipelineReport {
    pub fn rejected(duration_ms: u64) -> Self {
        Self {
            final_state: PipelineState::Failed,
            targets: None,
            stages: Vec::new(),
            deployed_path: None,
            duration_ms,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.final_state == PipelineState::Done
    }

    /// Stages that were started, whether they succeeded or not.
    pub fn executed(&self) -> Vec<StageKind> {
        self.stages
            .iter()
            .filter(|r| r.outcome != StageOutcome::Skipped)
            .map(|r| r.stage)
            .collect()
    }

    pub fn failed_stage(&self) -> Option<StageKind> {
        self.stages
            .iter()
            .find(|r| r.outcome == StageOutcome::Failed)
            .map(|r| r.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workerforge_core::{VersionResolver, WorkerVersion};

    fn report() -> PipelineReport {
        PipelineReport {
            final_state: PipelineState::Failed,
            targets: Some(VersionResolver::resolve(WorkerVersion::V7_4)),
            stages: vec![
                StageResult::skipped(StageKind::Bootstrap),
                StageResult {
                    stage: StageKind::Setup,
                    outcome: StageOutcome::Succeeded,
                    duration_ms: 12,
                    error: None,
                },
                StageResult {
                    stage: StageKind::Build,
                    outcome: StageOutcome::Failed,
                    duration_ms: 40,
                    error: Some("dotnet failed: exited with code 1".to_string()),
                },
            ],
            deployed_path: None,
            duration_ms: 52,
        }
    }

    #[test]
    fn test_executed_and_failed_stage() {
        let report = report();
        assert_eq!(report.executed(), vec![StageKind::Setup, StageKind::Build]);
        assert_eq!(report.failed_stage(), Some(StageKind::Build));
        assert!(!report.succeeded());
    }

    #[test]
    fn test_serializes_for_json_output() {
        let json = serde_json::to_value(report()).unwrap();

        assert_eq!(json["final_state"], "Failed");
        assert_eq!(json["targets"]["target_framework"], "net8.0");
        assert_eq!(json["stages"][0]["outcome"], "skipped");
        assert!(json["stages"][0].get("error").is_none());
        assert_eq!(json["stages"][2]["error"], "dotnet failed: exited with code 1");
    }

    #[test]
    fn test_rejected_report() {
        let report = PipelineReport::rejected(0);
        assert_eq!(report.final_state, PipelineState::Failed);
        assert!(report.targets.is_none());
        assert!(report.stages.is_empty());
    }
}
