use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, error, info};
use workerforge_cli::cli::{CliArgs, OutputFormatter};
use workerforge_cli::logging::{init_logging, resolve_level, LoggingConfig};
use workerforge_cli::{NAME, VERSION};
use workerforge_pipeline::{PipelineController, PipelineReport};

fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig {
        use_json: args.log_json,
        ..LoggingConfig::with_level(resolve_level(
            args.log_level.as_deref(),
            args.verbose,
            args.quiet,
        ))
    });

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match run(&args) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn run(args: &CliArgs) -> anyhow::Result<()> {
    let repo_root = resolve_repo_root(args.repo_root.as_deref())?;
    let config = args.to_config(repo_root);
    debug!("{}", config);

    let formatter = OutputFormatter::new(args.format);
    match PipelineController::system().run(config) {
        Ok(report) => {
            print_report(&formatter, &report)?;
            info!(duration_ms = report.duration_ms, "Pipeline finished");
            Ok(())
        }
        Err(failure) => {
            error!(state = %failure.report.final_state, "Pipeline failed");
            print_report(&formatter, &failure.report)?;
            Err(failure.error.into())
        }
    }
}

fn print_report(formatter: &OutputFormatter, report: &PipelineReport) -> anyhow::Result<()> {
    let text = formatter.format_report(report)?;
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn resolve_repo_root(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()
            .map_err(|e| anyhow::anyhow!("Failed to get current directory: {}", e))?,
    };

    if !path.exists() {
        anyhow::bail!("Repository path does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Repository path is not a directory: {}", path.display());
    }

    path.canonicalize()
        .map_err(|e| anyhow::anyhow!("Failed to canonicalize {}: {}", path.display(), e))
}
