use crate::{
    error::{
        ApiError,
        SourceError,
    },
    metrics::{
        ApiSource,
        MetricsUpdate,
    },
};
use std::{
    future::Future,
    pin::Pin,
};

/// Collects the metrics owned by one API source for one environment.
pub trait Collector {
    /// Queries the source and returns its partial result.
    fn collect(&mut self) -> Pin<Box<dyn Future<Output = Result<MetricsUpdate, SourceError>> + Send + '_>>;

    /// The source whose fields the update writes.
    fn source(&self) -> ApiSource;

    /// Get the name of this collector
    fn name(&self) -> &'static str;
}

/// Value of a best-effort sub-query: failures are logged and count as zero.
pub(crate) fn or_zero(what: &str, result: Result<u64, ApiError>) -> u64 {
    result.unwrap_or_else(|error| {
        warn!(%error, "Failed to get {what}, counting 0");
        0
    })
}
