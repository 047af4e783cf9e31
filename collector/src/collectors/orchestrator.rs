use crate::{
    collectors::{
        CollectionEvent,
        CollectionStatus,
        EnvironmentAggregator,
        ProgressListener,
    },
    metrics::{
        EnvironmentData,
        ProjectSummary,
    },
    Settings,
};
use usage_insights_config::{
    EnvironmentCredentials,
    SubscriptionCredentials,
};

/// Status of one environment of the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentProgress {
    pub environment_id: String,
    pub status: CollectionStatus,
}

/// Runs the aggregator over a list of environments, one after the other.
#[derive(Debug)]
pub struct Orchestrator {
    aggregator: EnvironmentAggregator,
    progress: Vec<EnvironmentProgress>,
}

impl Orchestrator {
    pub fn new(settings: Settings) -> Self {
        Self {
            aggregator: EnvironmentAggregator::new(settings),
            progress: Vec::new(),
        }
    }

    pub fn aggregator(&self) -> &EnvironmentAggregator {
        &self.aggregator
    }

    /// Statuses of the last (or current) run, in collection order.
    pub fn progress(&self) -> &[EnvironmentProgress] {
        &self.progress
    }

    /// Collects every environment with a non-blank id. A failed environment is recorded and skipped; there are
    /// no retries.
    pub async fn collect(
        &mut self,
        environments: &[EnvironmentCredentials],
        listener: &dyn ProgressListener,
    ) -> Vec<EnvironmentData> {
        self.progress.clear();

        let environments: Vec<&EnvironmentCredentials> = environments
            .iter()
            .filter(|credentials| !credentials.environment_id().is_empty())
            .collect();
        let total = environments.len();
        let mut collected = Vec::with_capacity(total);

        for (index, credentials) in environments.into_iter().enumerate() {
            let environment_id = credentials.environment_id().to_string();
            debug!(%environment_id, "Collecting data for environment {} of {total}", index + 1);
            self.set_status(&environment_id, CollectionStatus::Collecting);
            listener.on_event(&CollectionEvent::EnvironmentStarted {
                environment_id: environment_id.clone(),
                position: index + 1,
                total,
            });

            match self.aggregator.collect_environment_data(credentials, listener).await {
                Ok(data) => {
                    self.set_status(&environment_id, CollectionStatus::Completed);
                    listener.on_event(&CollectionEvent::EnvironmentCompleted { environment_id });
                    collected.push(data);
                }
                Err(error) => {
                    error!(%environment_id, %error, "Failed to collect environment");
                    let message = error.to_string();
                    self.set_status(&environment_id, CollectionStatus::Failed(message.clone()));
                    listener.on_event(&CollectionEvent::EnvironmentFailed {
                        environment_id,
                        message,
                    });
                }
            }
        }

        info!(collected = collected.len(), total, "Collection finished");
        collected
    }

    fn set_status(&mut self, environment_id: &str, status: CollectionStatus) {
        match self
            .progress
            .iter_mut()
            .find(|progress| progress.environment_id == environment_id)
        {
            Some(progress) => progress.status = status,
            None => self.progress.push(EnvironmentProgress {
                environment_id: environment_id.to_string(),
                status,
            }),
        }
    }
}

/// Builds the credential list for every environment of the given projects.
///
/// Keys configured for an environment are kept; the subscription credentials are filled in for all of them so
/// active users can be counted.
pub fn discover_environments(
    projects: &[ProjectSummary],
    configured: &[EnvironmentCredentials],
    subscription: &SubscriptionCredentials,
) -> Vec<EnvironmentCredentials> {
    projects
        .iter()
        .flat_map(|project| project.environments.iter())
        .map(|environment| {
            configured
                .iter()
                .find(|credentials| credentials.environment_id() == environment.id)
                .cloned()
                .unwrap_or_else(|| EnvironmentCredentials::new(&environment.id))
                .with_subscription_fallback(Some(subscription))
        })
        .collect()
}
