use super::context::StageContext;
use super::state::StageKind;
use workerforge_core::PipelineError;

/// One step of the pipeline. Stages run sequentially and share the context.
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    fn execute(&self, context: &mut StageContext) -> Result<(), PipelineError>;
}
