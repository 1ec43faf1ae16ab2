use super::powershell::{install_module, module_available};
use super::sdk::ensure_sdk;
use crate::pipeline::context::StageContext;
use crate::pipeline::stage_trait::Stage;
use crate::pipeline::state::StageKind;
use tracing::{info, warn};
use workerforge_core::PipelineError;

/// Installs the SDK channel and the PowerShell modules the build relies on.
pub struct BootstrapStage;

impl Stage for BootstrapStage {
    fn kind(&self) -> StageKind {
        StageKind::Bootstrap
    }

    fn execute(&self, context: &mut StageContext) -> Result<(), PipelineError> {
        ensure_sdk(context)?;

        for module in context.layout().build_modules {
            if module_available(context, module)? {
                info!(module, "Module already installed");
                continue;
            }
            warn!(module, "Module is missing, installing");
            install_module(context, module)?;
        }

        Ok(())
    }
}
