//! The six pipeline stages, numbered in execution order

mod powershell;
mod sdk;

#[path = "01_bootstrap.rs"]
pub mod bootstrap;
#[path = "02_clean.rs"]
pub mod clean;
#[path = "03_setup.rs"]
pub mod setup;
#[path = "04_build.rs"]
pub mod build;
#[path = "05_testing.rs"]
pub mod testing;
#[path = "06_deploy.rs"]
pub mod deploy;

pub use bootstrap::BootstrapStage;
pub use build::BuildStage;
pub use clean::CleanStage;
pub use deploy::DeployStage;
pub use setup::SetupStage;
pub use testing::TestStage;

use super::context::StageContext;
use super::stage_trait::Stage;
use super::state::StageKind;
use tracing::info;
use workerforge_core::{CommandOutput, CommandSpec, PipelineError};

pub fn create(kind: StageKind) -> Box<dyn Stage> {
    match kind {
        StageKind::Bootstrap => Box::new(BootstrapStage),
        StageKind::Clean => Box::new(CleanStage),
        StageKind::Setup => Box::new(SetupStage),
        StageKind::Build => Box::new(BuildStage),
        StageKind::Test => Box::new(TestStage),
        StageKind::Deploy => Box::new(DeployStage),
    }
}

/// Runs a collaborator with its output on the console; nonzero exit is an error.
pub(crate) fn invoke(context: &StageContext, command: &CommandSpec) -> Result<(), PipelineError> {
    info!(command = %command, "Running");
    let output = context
        .services
        .runner
        .run(command)
        .map_err(|e| PipelineError::spawn_failed(command, e))?;
    check(command, output).map(|_| ())
}

/// Runs a collaborator and returns its standard output.
pub(crate) fn capture(context: &StageContext, command: &CommandSpec) -> Result<String, PipelineError> {
    let output = context
        .services
        .runner
        .capture(command)
        .map_err(|e| PipelineError::spawn_failed(command, e))?;
    check(command, output).map(|output| output.stdout)
}

fn check(command: &CommandSpec, output: CommandOutput) -> Result<CommandOutput, PipelineError> {
    if output.success() {
        Ok(output)
    } else {
        Err(PipelineError::command_failed(command, &output))
    }
}
