use super::sdk::ensure_sdk;
use crate::pipeline::context::StageContext;
use crate::pipeline::stage_trait::Stage;
use crate::pipeline::state::StageKind;
use tracing::info;
use workerforge_core::PipelineError;

/// Common setup: picks the `dotnet` used by every later stage.
pub struct SetupStage;

impl Stage for SetupStage {
    fn kind(&self) -> StageKind {
        StageKind::Setup
    }

    fn execute(&self, context: &mut StageContext) -> Result<(), PipelineError> {
        info!(
            worker_version = %context.targets.worker_version,
            target_framework = context.targets.target_framework,
            "Preparing toolchain"
        );
        ensure_sdk(context)
    }
}
