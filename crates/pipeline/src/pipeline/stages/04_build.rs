use super::powershell::{module_available, pwsh_command, quote};
use super::{capture, invoke};
use crate::pipeline::context::StageContext;
use crate::pipeline::stage_trait::Stage;
use crate::pipeline::state::StageKind;
use std::path::Path;
use tracing::info;
use uuid::Uuid;
use workerforge_core::{CommandSpec, DependencyManifest, PipelineError};

const DEPENDENCY_INSTALLER: &str = "PSDepend";
const SBOM_PACKAGE_SUPPLIER: &str = "Microsoft";

/// Generates code, installs vendored modules, publishes, optionally writes an SBOM, and packs.
pub struct BuildStage;

impl Stage for BuildStage {
    fn kind(&self) -> StageKind {
        StageKind::Build
    }

    fn execute(&self, context: &mut StageContext) -> Result<(), PipelineError> {
        if !module_available(context, DEPENDENCY_INSTALLER)? {
            return Err(PipelineError::MissingPrerequisite {
                prerequisite: DEPENDENCY_INSTALLER.to_string(),
                hint: "Run again with --bootstrap to install the build modules.".to_string(),
            });
        }

        let helper = quote(&context.repo_path(context.layout().helper_module));
        invoke(
            context,
            &pwsh_command(context, &format!("Import-Module {} -Force; Start-ResGen", helper)),
        )?;
        invoke(
            context,
            &pwsh_command(
                context,
                &format!(
                    "Import-Module {} -Force; Resolve-ProtoBufToolPath; Start-ProtoGen",
                    helper
                ),
            ),
        )?;

        install_dependencies(context)?;

        let config = &context.config;
        let build_number = format!("/p:BuildNumber={}", config.build_number);
        let publish = CommandSpec::new(&context.dotnet)
            .args(["publish", "-c", config.configuration.as_str()])
            .arg(build_number.as_str())
            .args(["-f", context.targets.target_framework, context.layout().project_dir])
            .current_dir(context.repo_root());
        invoke(context, &publish)?;

        if context.config.add_sbom {
            generate_sbom(context)?;
        }

        let pack = CommandSpec::new(&context.dotnet)
            .args(["pack", "-c", context.config.configuration.as_str()])
            .arg(build_number)
            .arg(context.layout().pack_project)
            .current_dir(context.repo_root());
        invoke(context, &pack)
    }
}

fn install_dependencies(context: &StageContext) -> Result<(), PipelineError> {
    let manifest_path = quote(&context.repo_path(context.layout().requirements_manifest));

    let json = capture(
        context,
        &pwsh_command(
            context,
            &format!(
                "Import-PowerShellDataFile -Path {} | ConvertTo-Json -Depth 5",
                manifest_path
            ),
        ),
    )?;
    let manifest = DependencyManifest::from_json(&json)
        .map_err(|e| PipelineError::collaborator("pwsh", e))?;
    for module in &manifest.modules {
        info!(
            module = %module.name,
            version = module.version.as_deref().unwrap_or("any"),
            "Installing dependency module"
        );
    }

    invoke(
        context,
        &pwsh_command(
            context,
            &format!("Invoke-PSDepend -Path {} -Force -Confirm:$false", manifest_path),
        ),
    )?;

    let incompatible = context.repo_path(context.layout().incompatible_vendored_dir);
    let fs = &context.services.fs;
    if fs.exists(&incompatible) {
        info!(path = %incompatible.display(), "Removing incompatible vendored module files");
        fs.remove_dir_all(&incompatible)
            .map_err(|e| PipelineError::filesystem(&incompatible, e))?;
    }

    Ok(())
}

fn generate_sbom(context: &StageContext) -> Result<(), PipelineError> {
    let url = context.config.sbom_source()?;
    let fs = &context.services.fs;
    let layout = context.layout();

    let util_dir = context.services.toolchain.cache_dir.join("SBOMUtil");
    remove_if_present(context, &util_dir)?;
    context
        .services
        .fetcher
        .fetch_and_extract(url, &util_dir)
        .map_err(|e| PipelineError::collaborator("sbom-util", e))?;

    let entry = util_dir.join(layout.manifest_tool_entry);
    if !fs.is_file(&entry) {
        return Err(PipelineError::ToolInstallationInvalid {
            checked: entry,
            hint: "Check that --sbom-util-url points at the manifest tool archive.".to_string(),
        });
    }

    let publish_dir = context.publish_dir();
    remove_if_present(context, &layout.manifest_output_dir(&publish_dir))?;

    let correlation_id = Uuid::new_v4();
    let output = context.repo_path(&format!("{}.json", correlation_id));
    info!(correlation_id = %correlation_id, "Generating SBOM");

    let command = CommandSpec::new(&context.dotnet)
        .path_arg(&entry)
        .args(["generate", "-BuildDropPath"])
        .path_arg(&publish_dir)
        .arg("-BuildComponentPath")
        .path_arg(&publish_dir)
        .args(["-Verbosity", "Information", "-t"])
        .path_arg(&output)
        .args(["-PackageName", layout.package_name])
        .args(["-PackageVersion", context.config.build_number.as_str()])
        .args(["-PackageSupplier", SBOM_PACKAGE_SUPPLIER])
        .current_dir(context.repo_root());
    invoke(context, &command)
}

fn remove_if_present(context: &StageContext, path: &Path) -> Result<(), PipelineError> {
    let fs = &context.services.fs;
    if fs.exists(path) {
        fs.remove_dir_all(path)
            .map_err(|e| PipelineError::filesystem(path, e))?;
    }
    Ok(())
}
