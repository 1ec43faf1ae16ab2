use anyhow::Result;
use clap::ValueEnum;
use std::fmt;
use workerforge_pipeline::{PipelineReport, StageOutcome};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_report(&self, report: &PipelineReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Human => {
                let mut out = String::new();
                write_human(&mut out, report)?;
                Ok(out)
            }
        }
    }
}

fn write_human(out: &mut impl fmt::Write, report: &PipelineReport) -> fmt::Result {
    write!(out, "Pipeline {} in {} ms", report.final_state, report.duration_ms)?;
    if let Some(targets) = &report.targets {
        write!(
            out,
            " (worker {}, {})",
            targets.worker_version, targets.target_framework
        )?;
    }
    writeln!(out)?;

    for result in &report.stages {
        let outcome = match result.outcome {
            StageOutcome::Succeeded => "ok",
            StageOutcome::Skipped => "skipped",
            StageOutcome::Failed => "FAILED",
        };
        write!(out, "  {:<10} {:<8}", result.stage.name(), outcome)?;
        if result.outcome != StageOutcome::Skipped {
            write!(out, " {:>7} ms", result.duration_ms)?;
        }
        writeln!(out)?;
    }

    if let Some(path) = &report.deployed_path {
        writeln!(out, "Deployed to {}", path.display())?;
    }

    Ok(())
}
