//! Locating and installing the .NET SDK channel a target framework needs

use super::{capture, invoke};
use crate::pipeline::context::StageContext;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use workerforge_core::{CommandSpec, PipelineError};

const INSTALL_SCRIPT_URL_SH: &str = "https://dot.net/v1/dotnet-install.sh";
const INSTALL_SCRIPT_URL_PS1: &str = "https://dot.net/v1/dotnet-install.ps1";

/// Versions from `dotnet --list-sdks` output (`8.0.404 [/usr/share/dotnet/sdk]`).
pub(crate) fn parse_sdk_versions(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|version| version.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

pub(crate) fn has_channel(versions: &[String], channel: &str) -> bool {
    let prefix = format!("{}.", channel);
    versions.iter().any(|v| v.starts_with(&prefix))
}

/// Makes `context.dotnet` point at a `dotnet` that has the target's SDK channel.
///
/// Tries the configured `dotnet`, then the user-local install directory, and
/// installs into the latter with the official script when neither qualifies.
pub(crate) fn ensure_sdk(context: &mut StageContext) -> Result<(), PipelineError> {
    let channel = context.targets.sdk_channel();
    let local = local_dotnet(&context.services.toolchain.sdk_install_dir);
    let candidates = [context.services.toolchain.dotnet.clone(), local.clone()];

    for candidate in candidates {
        if sdk_available(context, &candidate, channel) {
            info!(dotnet = %candidate.display(), channel, "Using .NET SDK");
            context.dotnet = candidate;
            return Ok(());
        }
    }

    warn!(channel, "Required .NET SDK not found, installing");
    install_sdk(context, channel)?;

    if !sdk_available(context, &local, channel) {
        return Err(PipelineError::ToolInstallationInvalid {
            checked: local,
            hint: format!(
                "The .NET SDK install script did not provide SDK channel {}.",
                channel
            ),
        });
    }

    info!(dotnet = %local.display(), channel, "Installed .NET SDK");
    context.dotnet = local;
    Ok(())
}

fn local_dotnet(install_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        install_dir.join("dotnet.exe")
    } else {
        install_dir.join("dotnet")
    }
}

fn sdk_available(context: &StageContext, dotnet: &Path, channel: &str) -> bool {
    let command = CommandSpec::new(dotnet).arg("--list-sdks");
    match capture(context, &command) {
        Ok(stdout) => has_channel(&parse_sdk_versions(&stdout), channel),
        Err(_) => false,
    }
}

fn install_sdk(context: &StageContext, channel: &str) -> Result<(), PipelineError> {
    let toolchain = &context.services.toolchain;
    let (script_name, url) = if cfg!(windows) {
        ("dotnet-install.ps1", INSTALL_SCRIPT_URL_PS1)
    } else {
        ("dotnet-install.sh", INSTALL_SCRIPT_URL_SH)
    };
    let script = toolchain.cache_dir.join(script_name);

    context
        .services
        .fetcher
        .download_file(url, &script)
        .map_err(|e| PipelineError::collaborator("dotnet-install", e))?;

    let command = if cfg!(windows) {
        CommandSpec::new(&toolchain.pwsh)
            .args(["-NoProfile", "-ExecutionPolicy", "Bypass", "-File"])
            .path_arg(&script)
            .args(["-Channel", channel, "-InstallDir"])
            .path_arg(&toolchain.sdk_install_dir)
    } else {
        CommandSpec::new("bash")
            .path_arg(&script)
            .args(["--channel", channel, "--install-dir"])
            .path_arg(&toolchain.sdk_install_dir)
    };

    invoke(context, &command)
}
