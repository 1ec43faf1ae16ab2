use super::output::OutputFormat;
use clap::Parser;
use std::path::PathBuf;
use workerforge_core::config::{DEFAULT_BUILD_NUMBER, DEFAULT_CONFIGURATION};
use workerforge_core::{PipelineConfig, WorkerVersion};

/// Build, test and deploy the Azure Functions PowerShell language worker
#[derive(Parser, Debug)]
#[command(
    name = "workerforge",
    version,
    about = "Build, test and deploy the Azure Functions PowerShell language worker",
    long_about = "Runs the worker pipeline in a fixed order: bootstrap, clean, setup, build, \
                  test, deploy. Setup and build run by default; every other stage is opt-in.\n\n\
                  Examples:\n  \
                  workerforge\n  \
                  workerforge --bootstrap --test\n  \
                  workerforge --no-build --deploy --worker-version 7.2\n  \
                  workerforge --configuration Release --build-number 1234 --add-sbom \
                  --sbom-util-url <URL>"
)]
pub struct CliArgs {
    #[arg(long, help = "Install the .NET SDK and the PowerShell build modules if missing")]
    pub bootstrap: bool,

    #[arg(long, help = "Remove all git-ignored files from the repository first")]
    pub clean: bool,

    #[arg(long, help = "Skip the build stage")]
    pub no_build: bool,

    #[arg(long, help = "Run the unit tests")]
    pub test: bool,

    #[arg(long, help = "Copy the published worker into the Core Tools installation")]
    pub deploy: bool,

    #[arg(
        long,
        value_name = "DIR",
        env = "WORKERFORGE_CORE_TOOLS_DIR",
        help = "Core Tools installation directory (skips discovery of 'func' on PATH)"
    )]
    pub core_tools_dir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "NAME",
        default_value = DEFAULT_CONFIGURATION,
        help = "Build configuration"
    )]
    pub configuration: String,

    #[arg(
        long,
        value_name = "NUMBER",
        default_value = DEFAULT_BUILD_NUMBER,
        help = "Build number embedded in the assemblies and package"
    )]
    pub build_number: String,

    #[arg(long, help = "Generate a software bill of materials for the publish output")]
    pub add_sbom: bool,

    #[arg(
        long,
        value_name = "URL",
        env = "WORKERFORGE_SBOM_UTIL_URL",
        hide_env_values = true,
        help = "Download location of the manifest tool archive (zip or .tar.gz); required with --add-sbom"
    )]
    pub sbom_util_url: Option<String>,

    #[arg(
        long,
        value_name = "VERSION",
        default_value = "7.4",
        value_parser = parse_worker_version,
        help = "Worker version to build: 7.2 or 7.4"
    )]
    pub worker_version: WorkerVersion,

    #[arg(
        long,
        value_name = "PATH",
        help = "Repository root (defaults to current directory)"
    )]
    pub repo_root: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Run summary format"
    )]
    pub format: OutputFormat,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(short = 'v', long, help = "Verbose logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

impl CliArgs {
    pub fn to_config(&self, repo_root: PathBuf) -> PipelineConfig {
        PipelineConfig {
            bootstrap: self.bootstrap,
            clean: self.clean,
            no_build: self.no_build,
            test: self.test,
            deploy: self.deploy,
            core_tools_dir: self.core_tools_dir.clone(),
            configuration: self.configuration.clone(),
            build_number: self.build_number.clone(),
            add_sbom: self.add_sbom,
            sbom_util_url: self.sbom_util_url.clone(),
            worker_version: self.worker_version,
            repo_root,
        }
    }
}

fn parse_worker_version(s: &str) -> Result<WorkerVersion, String> {
    s.parse::<WorkerVersion>().map_err(|e| e.to_string())
}
