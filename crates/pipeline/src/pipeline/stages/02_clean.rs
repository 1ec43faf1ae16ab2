use super::invoke;
use crate::pipeline::context::StageContext;
use crate::pipeline::stage_trait::Stage;
use crate::pipeline::state::StageKind;
use workerforge_core::{CommandSpec, PipelineError};

/// Removes every git-ignored file under the repository root.
pub struct CleanStage;

impl Stage for CleanStage {
    fn kind(&self) -> StageKind {
        StageKind::Clean
    }

    fn execute(&self, context: &mut StageContext) -> Result<(), PipelineError> {
        let command = CommandSpec::new(&context.services.toolchain.git)
            .args(["clean", "-fdX"])
            .current_dir(context.repo_root());
        invoke(context, &command)
    }
}
