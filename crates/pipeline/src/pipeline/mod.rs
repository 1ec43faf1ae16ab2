pub mod context;
pub mod controller;
pub mod executor;
pub mod result;
pub mod selection;
pub mod stage_trait;
pub mod stages;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{StageContext, StageServices};
pub use controller::{PipelineController, PipelineFailure};
pub use executor::{PlannedStage, StageExecutor};
pub use result::{PipelineReport, StageOutcome, StageResult};
pub use selection::{select_stages, StageDescriptor};
pub use stage_trait::Stage;
pub use state::{PipelineState, StageKind};
