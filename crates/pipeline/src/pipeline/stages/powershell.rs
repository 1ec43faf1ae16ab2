use super::{capture, invoke};
use crate::pipeline::context::StageContext;
use std::path::Path;
use workerforge_core::{CommandSpec, PipelineError};

pub(crate) fn pwsh_command(context: &StageContext, script: &str) -> CommandSpec {
    CommandSpec::new(&context.services.toolchain.pwsh)
        .args(["-NoProfile", "-NonInteractive", "-Command"])
        .arg(script)
        .current_dir(context.repo_root())
}

/// Single-quoted PowerShell string literal.
pub(crate) fn quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "''"))
}

pub(crate) fn module_available(context: &StageContext, name: &str) -> Result<bool, PipelineError> {
    let script = format!(
        "if (Get-Module -ListAvailable -Name {}) {{ 'present' }} else {{ 'missing' }}",
        name
    );
    let stdout = capture(context, &pwsh_command(context, &script))?;
    Ok(stdout.trim() == "present")
}

pub(crate) fn install_module(context: &StageContext, name: &str) -> Result<(), PipelineError> {
    let script = format!("Install-Module -Name {} -Scope CurrentUser -Force", name);
    invoke(context, &pwsh_command(context, &script))
}
