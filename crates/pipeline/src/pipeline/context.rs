use std::path::{Path, PathBuf};
use std::sync::Arc;
use workerforge_core::{
    ArchiveFetcher, CommandRunner, FileSystem, HttpArchiveFetcher, LauncherLookup, LoggingHandler,
    PipelineConfig, ProgressHandler, RealFileSystem, ResolvedTargets, SearchPathLookup,
    SystemCommandRunner, ToolInstallation, Toolchain, WorkerLayout,
};

/// Collaborators the stages reach the outside world through.
#[derive(Clone)]
pub struct StageServices {
    pub fs: Arc<dyn FileSystem>,
    pub runner: Arc<dyn CommandRunner>,
    pub fetcher: Arc<dyn ArchiveFetcher>,
    pub lookup: Arc<dyn LauncherLookup>,
    pub progress: Arc<dyn ProgressHandler>,
    pub toolchain: Toolchain,
    pub layout: WorkerLayout,
}

impl StageServices {
    /// Real file system, processes and network; tool paths from the environment.
    pub fn system() -> Self {
        Self {
            fs: Arc::new(RealFileSystem::new()),
            runner: Arc::new(SystemCommandRunner::new()),
            fetcher: Arc::new(HttpArchiveFetcher::new()),
            lookup: Arc::new(SearchPathLookup::from_env()),
            progress: Arc::new(LoggingHandler),
            toolchain: Toolchain::from_env(),
            layout: WorkerLayout::default(),
        }
    }
}

/// State shared by the stages of one run.
pub struct StageContext {
    pub config: PipelineConfig,
    pub targets: ResolvedTargets,
    pub services: StageServices,
    /// The `dotnet` executable chosen by setup; starts as the configured one.
    pub dotnet: PathBuf,
    pub installation: Option<ToolInstallation>,
    pub deployed_path: Option<PathBuf>,
}

impl StageContext {
    pub fn new(config: PipelineConfig, targets: ResolvedTargets, services: StageServices) -> Self {
        let dotnet = services.toolchain.dotnet.clone();
        Self {
            config,
            targets,
            services,
            dotnet,
            installation: None,
            deployed_path: None,
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.config.repo_root
    }

    pub fn repo_path(&self, relative: &str) -> PathBuf {
        self.config.repo_root.join(relative)
    }

    pub fn layout(&self) -> &WorkerLayout {
        &self.services.layout
    }

    pub fn publish_dir(&self) -> PathBuf {
        self.services.layout.publish_dir(
            &self.config.repo_root,
            &self.config.configuration,
            self.targets.target_framework,
        )
    }
}
