use crate::config::WorkerVersion;
use serde::Serialize;

/// Compiler targets derived from the requested worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedTargets {
    pub worker_version: WorkerVersion,
    pub target_framework: &'static str,
}

impl ResolvedTargets {
    /// .NET SDK channel able to build `target_framework`.
    pub fn sdk_channel(&self) -> &'static str {
        match self.target_framework {
            "net6.0" => "6.0",
            _ => "8.0",
        }
    }
}

pub struct VersionResolver;

impl VersionResolver {
    pub fn resolve(version: WorkerVersion) -> ResolvedTargets {
        let target_framework = match version {
            WorkerVersion::V7_2 => "net6.0",
            WorkerVersion::V7_4 => "net8.0",
        };

        ResolvedTargets {
            worker_version: version,
            target_framework,
        }
    }
}
