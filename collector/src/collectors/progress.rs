use crate::metrics::ApiSource;
use derive_more::Display;

/// Status of one environment during a collection run.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum CollectionStatus {
    #[display("Collecting data...")]
    Collecting,
    #[display("Completed")]
    Completed,
    #[display("Error: {_0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    EnvironmentStarted {
        environment_id: String,
        /// 1-based position in the run.
        position: usize,
        total: usize,
    },
    SourceFailed {
        environment_id: String,
        api: ApiSource,
        message: String,
    },
    EnvironmentCompleted {
        environment_id: String,
    },
    EnvironmentFailed {
        environment_id: String,
        message: String,
    },
}

/// Receives progress of a collection run.
pub trait ProgressListener: Send + Sync {
    fn on_event(&self, event: &CollectionEvent);
}

impl<F> ProgressListener for F
where
    F: Fn(&CollectionEvent) + Send + Sync,
{
    fn on_event(&self, event: &CollectionEvent) {
        self(event)
    }
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn on_event(&self, _event: &CollectionEvent) {}
}
