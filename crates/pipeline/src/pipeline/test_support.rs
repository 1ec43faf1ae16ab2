//! Scripted collaborators for stage and controller tests

use super::context::{StageContext, StageServices};
use super::controller::PipelineController;
use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use workerforge_core::{
    ArchiveFetcher, CommandOutput, LauncherLookup, MockCommandRunner, MockFileSystem, NoOpHandler,
    PipelineConfig, Toolchain, VersionResolver, WorkerLayout,
};

pub const REPO_ROOT: &str = "/repo";
pub const HOST_ROOT: &str = "/opt/func";

pub const SDK_LIST: &str = "6.0.428 [/usr/share/dotnet/sdk]\n8.0.404 [/usr/share/dotnet/sdk]\n";

const REQUIREMENTS_JSON: &str = r#"{
    "PSDependOptions": { "Target": "src/Modules" },
    "ThreadJob": { "Version": "2.0.3" },
    "Microsoft.PowerShell.Archive": { "Version": "1.2.5" }
}"#;

/// Fetcher that "extracts" by adding files to the mock file system.
pub struct MockArchiveFetcher {
    fs: Arc<MockFileSystem>,
    entries: RwLock<Vec<String>>,
    downloads: RwLock<Vec<String>>,
    extractions: RwLock<Vec<String>>,
}

impl MockArchiveFetcher {
    fn new(fs: Arc<MockFileSystem>) -> Self {
        Self {
            fs,
            entries: RwLock::new(vec![
                "Microsoft.ManifestTool.dll".to_string(),
                "Microsoft.ManifestTool.runtimeconfig.json".to_string(),
            ]),
            downloads: RwLock::new(Vec::new()),
            extractions: RwLock::new(Vec::new()),
        }
    }

    pub fn set_archive_entries(&self, entries: &[&str]) {
        *self.entries.write().unwrap() = entries.iter().map(|e| e.to_string()).collect();
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.read().unwrap().clone()
    }

    pub fn extractions(&self) -> Vec<String> {
        self.extractions.read().unwrap().clone()
    }
}

impl ArchiveFetcher for MockArchiveFetcher {
    fn download_file(&self, url: &str, dest: &Path) -> Result<()> {
        self.downloads.write().unwrap().push(url.to_string());
        self.fs.add_file(dest, "#!/usr/bin/env bash");
        Ok(())
    }

    fn fetch_and_extract(&self, url: &str, dest_dir: &Path) -> Result<()> {
        self.extractions.write().unwrap().push(url.to_string());
        self.fs.add_dir(dest_dir);
        for entry in self.entries.read().unwrap().iter() {
            self.fs.add_file(dest_dir.join(entry), "");
        }
        Ok(())
    }
}

pub struct FixedLookup(HashMap<String, PathBuf>);

impl LauncherLookup for FixedLookup {
    fn find(&self, name: &str) -> Option<PathBuf> {
        self.0.get(name).cloned()
    }
}

pub struct Harness {
    pub fs: Arc<MockFileSystem>,
    pub runner: Arc<MockCommandRunner>,
    pub fetcher: Arc<MockArchiveFetcher>,
    lookup: Arc<FixedLookup>,
}

impl Harness {
    pub fn new() -> Self {
        Self::scripted(|_| {})
    }

    /// Rules added by `script` take precedence over the defaults.
    pub fn scripted(script: impl FnOnce(&MockCommandRunner)) -> Self {
        let runner = MockCommandRunner::new();
        script(&runner);
        runner
            .respond("--list-sdks", CommandOutput::ok(SDK_LIST))
            .respond("Get-Module -ListAvailable", CommandOutput::ok("present"))
            .respond("Import-PowerShellDataFile", CommandOutput::ok(REQUIREMENTS_JSON));

        let fs = Arc::new(MockFileSystem::new());
        for framework in ["net6.0", "net8.0"] {
            let publish = Self::publish_path("Debug", framework);
            fs.add_file(publish.join("Microsoft.Azure.Functions.PowerShellWorker.dll"), "worker");
            fs.add_file(publish.join("Modules/Legacy/Legacy.psd1"), "@{}");
        }
        fs.add_file(Path::new(HOST_ROOT).join("func"), "elf");
        fs.add_dir(Path::new(HOST_ROOT).join("workers/powershell/7.2"));
        fs.add_symlink("/usr/bin/func", Path::new(HOST_ROOT).join("func"));

        let lookup = FixedLookup(HashMap::from([(
            "func".to_string(),
            PathBuf::from("/usr/bin/func"),
        )]));

        Self {
            fetcher: Arc::new(MockArchiveFetcher::new(fs.clone())),
            fs,
            runner: Arc::new(runner),
            lookup: Arc::new(lookup),
        }
    }

    /// No `func` on the search path.
    pub fn without_launcher() -> Self {
        Self {
            lookup: Arc::new(FixedLookup(HashMap::new())),
            ..Self::new()
        }
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain {
            dotnet: PathBuf::from("dotnet"),
            pwsh: PathBuf::from("pwsh"),
            git: PathBuf::from("git"),
            sdk_install_dir: PathBuf::from("/home/builder/.dotnet"),
            cache_dir: PathBuf::from("/cache/workerforge"),
        }
    }

    pub fn services(&self) -> StageServices {
        StageServices {
            fs: self.fs.clone(),
            runner: self.runner.clone(),
            fetcher: self.fetcher.clone(),
            lookup: self.lookup.clone(),
            progress: Arc::new(NoOpHandler),
            toolchain: self.toolchain(),
            layout: WorkerLayout::default(),
        }
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            repo_root: PathBuf::from(REPO_ROOT),
            ..Default::default()
        }
    }

    pub fn context(&self, config: PipelineConfig) -> StageContext {
        let targets = VersionResolver::resolve(config.worker_version);
        StageContext::new(config, targets, self.services())
    }

    pub fn controller(&self) -> PipelineController {
        PipelineController::new(self.services())
    }

    pub fn publish_dir(&self, configuration: &str, framework: &str) -> PathBuf {
        Self::publish_path(configuration, framework)
    }

    fn publish_path(configuration: &str, framework: &str) -> PathBuf {
        WorkerLayout::default().publish_dir(Path::new(REPO_ROOT), configuration, framework)
    }
}
