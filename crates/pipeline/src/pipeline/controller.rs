use super::context::{StageContext, StageServices};
use super::executor::{PlannedStage, StageExecutor};
use super::result::PipelineReport;
use super::selection::select_stages;
use super::stages;
use std::time::Instant;
use thiserror::Error;
use tracing::info;
use workerforge_core::{PipelineConfig, PipelineError, ProgressEvent, VersionResolver};

/// A run that ended in `Failed`, with everything recorded up to that point.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PipelineFailure {
    pub report: PipelineReport,
    #[source]
    pub error: PipelineError,
}

pub struct PipelineController {
    services: StageServices,
}

impl PipelineController {
    pub fn new(services: StageServices) -> Self {
        Self { services }
    }

    pub fn system() -> Self {
        Self::new(StageServices::system())
    }

    /// Validates the configuration, then runs the selected stages in order.
    pub fn run(&self, config: PipelineConfig) -> Result<PipelineReport, PipelineFailure> {
        let start = Instant::now();
        let progress = self.services.progress.clone();

        if let Err(e) = config.validate() {
            let error = PipelineError::from(e);
            progress.on_progress(&ProgressEvent::PipelineFailed {
                error: error.to_string(),
            });
            return Err(PipelineFailure {
                report: PipelineReport::rejected(start.elapsed().as_millis() as u64),
                error,
            });
        }

        let targets = VersionResolver::resolve(config.worker_version);
        info!(
            worker_version = %targets.worker_version,
            target_framework = targets.target_framework,
            "Resolved compiler target"
        );

        let plan: Vec<PlannedStage> = select_stages(&config)
            .into_iter()
            .map(|descriptor| PlannedStage {
                stage: stages::create(descriptor.kind),
                enabled: descriptor.enabled,
            })
            .collect();

        progress.on_progress(&ProgressEvent::PipelineStarted {
            repo_root: config.repo_root.clone(),
            enabled_stages: plan.iter().filter(|p| p.enabled).count(),
        });

        let mut context = StageContext::new(config, targets, self.services.clone());
        let mut executor = StageExecutor::new(progress.clone());
        let outcome = executor.run(plan, &mut context);

        let elapsed = start.elapsed();
        let report = PipelineReport {
            final_state: executor.state(),
            targets: Some(targets),
            stages: executor.into_results(),
            deployed_path: context.deployed_path.take(),
            duration_ms: elapsed.as_millis() as u64,
        };

        match outcome {
            Ok(()) => {
                progress.on_progress(&ProgressEvent::PipelineComplete {
                    total_time: elapsed,
                });
                Ok(report)
            }
            Err(error) => {
                progress.on_progress(&ProgressEvent::PipelineFailed {
                    error: error.to_string(),
                });
                Err(PipelineFailure { report, error })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::result::StageOutcome;
    use crate::pipeline::state::{PipelineState, StageKind};
    use crate::pipeline::test_support::{Harness, HOST_ROOT};
    use std::path::{Path, PathBuf};
    use workerforge_core::{CommandOutput, FileSystem, FsOperation, WorkerVersion};

    #[test]
    fn test_scenario_build_only_for_7_2() {
        let harness = Harness::new();
        let config = PipelineConfig {
            worker_version: WorkerVersion::V7_2,
            ..harness.config()
        };

        let report = harness.controller().run(config).unwrap();

        assert_eq!(report.final_state, PipelineState::Done);
        assert_eq!(report.targets.map(|t| t.target_framework), Some("net6.0"));
        assert_eq!(report.executed(), vec![StageKind::Setup, StageKind::Build]);
        assert!(report.deployed_path.is_none());

        let steps = [
            "Start-ResGen",
            "Start-ProtoGen",
            "Import-PowerShellDataFile",
            "Invoke-PSDepend",
            "dotnet publish -c Debug /p:BuildNumber=0 -f net6.0 src",
            "dotnet pack -c Debug /p:BuildNumber=0 package",
        ];
        let positions: Vec<usize> = steps
            .iter()
            .map(|step| harness.runner.position(step).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!harness.runner.was_invoked("dotnet test"));

        assert!(harness
            .fs
            .operations()
            .iter()
            .all(|op| !format!("{:?}", op).contains(HOST_ROOT)));
    }

    #[test]
    fn test_scenario_deploy_without_launcher() {
        let harness = Harness::without_launcher();
        let config = PipelineConfig {
            deploy: true,
            ..harness.config()
        };

        let failure = harness.controller().run(config).unwrap_err();

        assert!(matches!(failure.error, PipelineError::ToolNotFound { .. }));
        assert_eq!(failure.report.final_state, PipelineState::Failed);
        assert_eq!(failure.report.failed_stage(), Some(StageKind::Deploy));
        assert!(!harness
            .fs
            .operations()
            .iter()
            .any(|op| matches!(op, FsOperation::CreateDir(_))));
    }

    #[test]
    fn test_scenario_sbom_without_url() {
        let harness = Harness::new();
        let config = PipelineConfig {
            add_sbom: true,
            sbom_util_url: Some(String::new()),
            ..harness.config()
        };

        let failure = harness.controller().run(config).unwrap_err();

        assert!(matches!(failure.error, PipelineError::Configuration(_)));
        assert_eq!(failure.report.final_state, PipelineState::Failed);
        assert!(failure.report.stages.is_empty());
        assert!(harness.runner.invocations().is_empty());
        assert!(harness.fetcher.extractions().is_empty());
    }

    #[test]
    fn test_every_flag_subset_runs_exactly_enabled_stages() {
        for mask in 0u8..32 {
            let harness = Harness::new();
            let config = PipelineConfig {
                bootstrap: mask & 1 != 0,
                clean: mask & 2 != 0,
                no_build: mask & 4 != 0,
                test: mask & 8 != 0,
                deploy: mask & 16 != 0,
                ..harness.config()
            };

            let expected: Vec<StageKind> = StageKind::ORDER
                .into_iter()
                .filter(|kind| match kind {
                    StageKind::Bootstrap => config.bootstrap,
                    StageKind::Clean => config.clean,
                    StageKind::Setup => true,
                    StageKind::Build => !config.no_build,
                    StageKind::Test => config.test,
                    StageKind::Deploy => config.deploy,
                })
                .collect();

            let report = harness.controller().run(config).unwrap();

            assert_eq!(report.executed(), expected, "mask {:05b}", mask);
            assert_eq!(report.stages.len(), 6);
            assert_eq!(harness.runner.was_invoked("git clean"), mask & 2 != 0);
            assert_eq!(harness.runner.was_invoked("dotnet test"), mask & 8 != 0);
            assert_eq!(report.deployed_path.is_some(), mask & 16 != 0);
        }
    }

    #[test]
    fn test_failure_stops_later_stages() {
        let harness = Harness::scripted(|runner| {
            runner.respond("dotnet test", CommandOutput::exit(1));
        });
        let config = PipelineConfig {
            clean: true,
            test: true,
            deploy: true,
            ..harness.config()
        };

        let failure = harness.controller().run(config).unwrap_err();

        assert_eq!(
            failure.report.executed(),
            vec![
                StageKind::Clean,
                StageKind::Setup,
                StageKind::Build,
                StageKind::Test
            ]
        );
        assert_eq!(failure.report.stages.last().map(|r| r.outcome), Some(StageOutcome::Failed));
        assert!(harness.runner.was_invoked("dotnet pack"));
        assert!(failure.report.deployed_path.is_none());
        assert!(!harness.fs.exists(Path::new(HOST_ROOT).join("workers/powershell/7.4").as_path()));
    }

    #[test]
    fn test_deploy_report_carries_path() {
        let harness = Harness::new();
        let config = PipelineConfig {
            no_build: true,
            deploy: true,
            ..harness.config()
        };

        let report = harness.controller().run(config).unwrap();

        assert_eq!(
            report.deployed_path,
            Some(PathBuf::from(HOST_ROOT).join("workers/powershell/7.4"))
        );
        assert!(!harness.runner.was_invoked("dotnet publish"));
    }

    #[test]
    fn test_failure_display_is_the_stage_error() {
        let harness = Harness::scripted(|runner| {
            runner.respond(
                "git clean",
                CommandOutput {
                    status: Some(128),
                    stdout: String::new(),
                    stderr: "fatal: not a git repository".to_string(),
                },
            );
        });
        let config = PipelineConfig {
            clean: true,
            ..harness.config()
        };

        let failure = harness.controller().run(config).unwrap_err();

        assert_eq!(failure.to_string(), "git failed: fatal: not a git repository");
        assert_eq!(failure.report.executed(), vec![StageKind::Clean]);
    }
}
