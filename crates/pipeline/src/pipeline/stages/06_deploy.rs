use crate::pipeline::context::StageContext;
use crate::pipeline::stage_trait::Stage;
use crate::pipeline::state::StageKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;
use workerforge_core::{FileSystem, PipelineError, ProgressEvent, ToolLocator};

/// Replaces the worker inside the host installation with the latest publish output.
///
/// The new tree is copied next to the target and swapped in by rename, so the
/// target is never observed empty or half-written.
pub struct DeployStage;

impl Stage for DeployStage {
    fn kind(&self) -> StageKind {
        StageKind::Deploy
    }

    fn execute(&self, context: &mut StageContext) -> Result<(), PipelineError> {
        let services = &context.services;
        let fs = services.fs.as_ref();
        let layout = &services.layout;

        let installation = ToolLocator::new(fs, services.lookup.as_ref(), layout)
            .locate(context.config.core_tools_override())?;
        let root = &installation.root_directory;
        if !fs.is_dir(root) {
            return Err(PipelineError::ToolInstallationInvalid {
                checked: root.clone(),
                hint: "The directory given with --core-tools-dir does not exist.".to_string(),
            });
        }

        let publish_dir = context.publish_dir();
        if !fs.is_dir(&publish_dir) {
            return Err(PipelineError::FileSystemFailure {
                path: publish_dir,
                message: "Publish output not found; build the worker first".to_string(),
            });
        }

        let target = layout.deploy_target(root, context.config.worker_version);
        if !fs.exists(&target) {
            fs.create_dir_all(&target)
                .map_err(|e| PipelineError::filesystem(&target, e))?;
        }
        grant_write(fs, &target)?;

        let copied = swap_in(fs, &publish_dir, &target)?;
        grant_write(fs, &target)?;

        info!(
            path = %target.display(),
            files = copied,
            "Deployed worker"
        );
        services
            .progress
            .on_progress(&ProgressEvent::Deployed { path: target.clone() });

        context.installation = Some(installation);
        context.deployed_path = Some(target);
        Ok(())
    }
}

fn grant_write(fs: &dyn FileSystem, path: &Path) -> Result<(), PipelineError> {
    if cfg!(windows) {
        return Ok(());
    }
    fs.grant_write_recursive(path)
        .map_err(|e| PipelineError::filesystem(path, e))
}

fn sibling(target: &Path, label: &str, id: Uuid) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!("{}.{}-{}", name, label, id))
}

/// Copies `source` beside `target`, then exchanges the two by rename.
fn swap_in(fs: &dyn FileSystem, source: &Path, target: &Path) -> Result<u64, PipelineError> {
    let id = Uuid::new_v4();
    let staging = sibling(target, "staging", id);
    let retired = sibling(target, "retired", id);

    let copied = match fs.copy_dir_all(source, &staging) {
        Ok(copied) => copied,
        Err(e) => {
            discard(fs, &staging);
            return Err(PipelineError::filesystem(&staging, e));
        }
    };

    if let Err(e) = fs.rename(target, &retired) {
        discard(fs, &staging);
        return Err(PipelineError::filesystem(target, e));
    }

    if let Err(e) = fs.rename(&staging, target) {
        if let Err(restore) = fs.rename(&retired, target) {
            warn!(
                path = %retired.display(),
                error = %restore,
                "Could not restore previous worker"
            );
        }
        discard(fs, &staging);
        return Err(PipelineError::filesystem(target, e));
    }

    if let Err(e) = fs.remove_dir_all(&retired) {
        warn!(path = %retired.display(), error = %e, "Could not remove previous worker");
    }

    Ok(copied)
}

fn discard(fs: &dyn FileSystem, path: &Path) {
    if fs.exists(path) {
        if let Err(e) = fs.remove_dir_all(path) {
            warn!(path = %path.display(), error = %e, "Could not remove staging directory");
        }
    }
}
