pub mod pipeline;

pub use pipeline::context::{StageContext, StageServices};
pub use pipeline::controller::{PipelineController, PipelineFailure};
pub use pipeline::executor::{PlannedStage, StageExecutor};
pub use pipeline::result::{PipelineReport, StageOutcome, StageResult};
pub use pipeline::selection::{select_stages, StageDescriptor};
pub use pipeline::stage_trait::Stage;
pub use pipeline::state::{PipelineState, StageKind};
