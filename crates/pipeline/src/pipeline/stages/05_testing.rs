use super::invoke;
use crate::pipeline::context::StageContext;
use crate::pipeline::stage_trait::Stage;
use crate::pipeline::state::StageKind;
use workerforge_core::{CommandSpec, PipelineError};

/// Runs the unit test project against the resolved framework.
pub struct TestStage;

impl Stage for TestStage {
    fn kind(&self) -> StageKind {
        StageKind::Test
    }

    fn execute(&self, context: &mut StageContext) -> Result<(), PipelineError> {
        let command = CommandSpec::new(&context.dotnet)
            .args([
                "test",
                "-f",
                context.targets.target_framework,
                context.layout().test_project,
            ])
            .current_dir(context.repo_root());
        invoke(context, &command)
    }
}
