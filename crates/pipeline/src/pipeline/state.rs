use serde::Serialize;
use std::fmt;

/// The stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Bootstrap,
    Clean,
    /// Common setup; runs regardless of flags.
    Setup,
    Build,
    Test,
    Deploy,
}

impl StageKind {
    pub const ORDER: [StageKind; 6] = [
        StageKind::Bootstrap,
        StageKind::Clean,
        StageKind::Setup,
        StageKind::Build,
        StageKind::Test,
        StageKind::Deploy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Bootstrap => "bootstrap",
            StageKind::Clean => "clean",
            StageKind::Setup => "setup",
            StageKind::Build => "build",
            StageKind::Test => "test",
            StageKind::Deploy => "deploy",
        }
    }

    /// State the pipeline is in while this stage executes.
    pub fn active_state(&self) -> PipelineState {
        match self {
            StageKind::Bootstrap => PipelineState::Bootstrapping,
            StageKind::Clean => PipelineState::Cleaning,
            StageKind::Setup => PipelineState::Preparing,
            StageKind::Build => PipelineState::Building,
            StageKind::Test => PipelineState::Testing,
            StageKind::Deploy => PipelineState::Deploying,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineState {
    Idle,
    Bootstrapping,
    Cleaning,
    Preparing,
    Building,
    Testing,
    Deploying,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
