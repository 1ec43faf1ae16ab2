//! Progress handler trait and events

use std::path::PathBuf;
use std::time::Duration;

/// Events emitted while a pipeline runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started with the given number of enabled stages
    PipelineStarted {
        repo_root: PathBuf,
        enabled_stages: usize,
    },

    StageStarted { stage: &'static str },

    /// Stage disabled by the flag set
    StageSkipped { stage: &'static str },

    StageComplete {
        stage: &'static str,
        duration: Duration,
    },

    StageFailed {
        stage: &'static str,
        duration: Duration,
        error: String,
    },

    /// Worker copied into the host installation
    Deployed { path: PathBuf },

    PipelineComplete { total_time: Duration },

    PipelineFailed { error: String },
}

/// Trait for handling progress events during a run
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        NoOpHandler.on_progress(&ProgressEvent::StageStarted { stage: "build" });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::PipelineStarted {
            repo_root: PathBuf::from("/repo"),
            enabled_stages: 2,
        });
        handler.on_progress(&ProgressEvent::StageSkipped { stage: "clean" });
        handler.on_progress(&ProgressEvent::PipelineComplete {
            total_time: Duration::from_secs(5),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::StageStarted { stage: "deploy" };
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("StageStarted"));
        assert!(debug_str.contains("deploy"));
    }
}
