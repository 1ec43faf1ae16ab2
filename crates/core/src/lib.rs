//! Building blocks shared by the worker build pipeline and its CLI

pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod layout;
pub mod locator;
pub mod manifest;
pub mod process;
pub mod progress;
pub mod version;

pub use config::{ConfigError, PipelineConfig, Toolchain, WorkerVersion};
pub use download::{ArchiveFetcher, HttpArchiveFetcher};
pub use error::PipelineError;
pub use fs::{FileSystem, FsOperation, MockFileSystem, RealFileSystem};
pub use layout::WorkerLayout;
pub use locator::{LauncherLookup, SearchPathLookup, ToolInstallation, ToolLocator};
pub use manifest::{DeclaredModule, DependencyManifest};
pub use process::{CommandOutput, CommandRunner, CommandSpec, MockCommandRunner, SystemCommandRunner};
pub use progress::{LoggingHandler, NoOpHandler, ProgressEvent, ProgressHandler};
pub use version::{ResolvedTargets, VersionResolver};
