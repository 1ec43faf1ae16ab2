use super::state::StageKind;
use workerforge_core::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDescriptor {
    pub kind: StageKind,
    pub enabled: bool,
}

/// Every stage in execution order, each marked enabled or not by the flag set.
pub fn select_stages(config: &PipelineConfig) -> Vec<StageDescriptor> {
    StageKind::ORDER
        .into_iter()
        .map(|kind| StageDescriptor {
            kind,
            enabled: match kind {
                StageKind::Bootstrap => config.bootstrap,
                StageKind::Clean => config.clean,
                StageKind::Setup => true,
                StageKind::Build => !config.no_build,
                StageKind::Test => config.test,
                StageKind::Deploy => config.deploy,
            },
        })
        .collect()
}
