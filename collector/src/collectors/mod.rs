//! # Collectors
//!
//! - **`Collector` trait**: one implementation per API source, each returning a [`MetricsUpdate`] with only the
//!   fields that source owns
//! - **`EnvironmentAggregator`**: runs the collectors whose keys are present and merges their results
//! - **`Orchestrator`**: collects a list of environments sequentially and tracks their status
//!
//! Failures are contained at the smallest scope: a failed sub-query counts as zero, a failed source leaves its
//! fields at zero, and a failed environment never stops the run.
//!
//! [`MetricsUpdate`]: crate::metrics::MetricsUpdate

pub mod aggregator;
pub mod collector;
pub mod delivery_collector;
pub mod management_collector;
pub mod orchestrator;
pub mod probe;
pub mod progress;
pub mod subscription_collector;

pub use aggregator::EnvironmentAggregator;
pub use collector::Collector;
pub use delivery_collector::DeliveryCollector;
pub use management_collector::ManagementCollector;
pub use orchestrator::{
    discover_environments,
    EnvironmentProgress,
    Orchestrator,
};
pub use probe::{
    probe_preview_access,
    AccessDenial,
};
pub use progress::{
    CollectionEvent,
    CollectionStatus,
    NoProgress,
    ProgressListener,
};
pub use subscription_collector::SubscriptionCollector;
