use crate::config::WorkerVersion;
use std::path::{Path, PathBuf};

/// Names and repository-relative paths of the worker being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerLayout {
    /// Host launcher looked up on the search path.
    pub launcher: &'static str,
    /// Language directory under `<host>/workers/`.
    pub language: &'static str,
    pub package_name: &'static str,
    pub project_dir: &'static str,
    pub requirements_manifest: &'static str,
    pub pack_project: &'static str,
    pub test_project: &'static str,
    pub helper_module: &'static str,
    /// Vendored module folder that conflicts with the host's own copy.
    pub incompatible_vendored_dir: &'static str,
    pub build_modules: &'static [&'static str],
    pub manifest_tool_entry: &'static str,
}

impl Default for WorkerLayout {
    fn default() -> Self {
        Self {
            launcher: "func",
            language: "powershell",
            package_name: "Microsoft.Azure.Functions.PowerShellWorker",
            project_dir: "src",
            requirements_manifest: "src/requirements.psd1",
            pack_project: "package",
            test_project: "test/Unit",
            helper_module: "tools/helper.psm1",
            incompatible_vendored_dir: "src/Modules/Microsoft.PowerShell.Archive/1.2.5/en-US",
            build_modules: &["PSDepend", "platyPS"],
            manifest_tool_entry: "Microsoft.ManifestTool.dll",
        }
    }
}

impl WorkerLayout {
    pub fn publish_dir(&self, repo_root: &Path, configuration: &str, framework: &str) -> PathBuf {
        repo_root
            .join(self.project_dir)
            .join("bin")
            .join(configuration)
            .join(framework)
            .join("publish")
    }

    /// Folder the manifest utility writes into, inside the publish output.
    pub fn manifest_output_dir(&self, publish_dir: &Path) -> PathBuf {
        publish_dir.join("_manifest")
    }

    /// `<host-root>/workers/<language>`, the directory whose presence marks a valid host.
    pub fn workers_dir(&self, host_root: &Path) -> PathBuf {
        host_root.join("workers").join(self.language)
    }

    pub fn deploy_target(&self, host_root: &Path, version: WorkerVersion) -> PathBuf {
        self.workers_dir(host_root).join(version.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_dir() {
        let layout = WorkerLayout::default();
        assert_eq!(
            layout.publish_dir(Path::new("/repo"), "Release", "net8.0"),
            PathBuf::from("/repo/src/bin/Release/net8.0/publish")
        );
    }

    #[test]
    fn test_deploy_target() {
        let layout = WorkerLayout::default();
        assert_eq!(
            layout.deploy_target(Path::new("/opt/func"), WorkerVersion::V7_2),
            PathBuf::from("/opt/func/workers/powershell/7.2")
        );
    }
}
