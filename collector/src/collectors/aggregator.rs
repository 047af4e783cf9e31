use crate::{
    clients::{
        DeliveryClient,
        ManagementClient,
    },
    collectors::{
        probe::{
            probe_preview_access,
            require_key,
        },
        CollectionEvent,
        Collector,
        DeliveryCollector,
        ManagementCollector,
        ProgressListener,
        SubscriptionCollector,
    },
    error::{
        ApiFailure,
        CollectionError,
    },
    metrics::{
        ApiKeysAvailable,
        EnvironmentData,
        UsageMetrics,
    },
    Settings,
};
use usage_insights_config::EnvironmentCredentials;

/// Collects all metrics of one environment from the sources whose keys were supplied.
#[derive(Debug, Clone)]
pub struct EnvironmentAggregator {
    settings: Settings,
}

impl EnvironmentAggregator {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn collectors(&self, credentials: &EnvironmentCredentials) -> Result<Vec<Box<dyn Collector + Send>>, CollectionError> {
        let environment_id = credentials.environment_id();
        let mut collectors: Vec<Box<dyn Collector + Send>> = Vec::with_capacity(3);
        if let Some(key) = credentials.delivery_api_key() {
            collectors.push(Box::new(DeliveryCollector::new(&self.settings, environment_id, key)?));
        }
        if let Some(key) = credentials.management_api_key() {
            collectors.push(Box::new(ManagementCollector::new(&self.settings, environment_id, key)?));
        }
        if let Some(subscription) = credentials.subscription() {
            collectors.push(Box::new(SubscriptionCollector::new(
                &self.settings,
                &subscription,
                environment_id,
            )?));
        }
        Ok(collectors)
    }

    /// Runs the collectors one after the other and merges their results.
    ///
    /// A failing source is reported to `listener` and leaves its fields at zero; only unexpected failures such as
    /// an unusable endpoint URL fail the environment.
    #[instrument(skip_all, fields(environment_id = %credentials.environment_id()))]
    pub async fn collect_environment_data(
        &self,
        credentials: &EnvironmentCredentials,
        listener: &dyn ProgressListener,
    ) -> Result<EnvironmentData, CollectionError> {
        let environment_id = credentials.environment_id();
        let mut metrics = UsageMetrics::default();

        for mut collector in self.collectors(credentials)? {
            debug!(collector = collector.name(), "Collecting");
            match collector.collect().await {
                Ok(update) => metrics.apply(update),
                Err(error) => {
                    warn!(collector = collector.name(), %error, "Source failed, its metrics stay 0");
                    listener.on_event(&CollectionEvent::SourceFailed {
                        environment_id: environment_id.to_string(),
                        api: collector.source(),
                        message: error.to_string(),
                    });
                }
            }
        }

        metrics.compute_derived();
        Ok(EnvironmentData::new(
            environment_id,
            metrics,
            ApiKeysAvailable::from(credentials),
        ))
    }

    /// Pre-flight check of a Delivery key: it must grant 'Content preview'.
    #[instrument(level = "debug", skip(self, api_key))]
    pub async fn test_delivery_api_key(&self, environment_id: &str, api_key: &str) -> Result<(), ApiFailure> {
        let api_key = require_key(Some(api_key))?;
        let client = DeliveryClient::new(&self.settings, environment_id.trim(), api_key)?;
        probe_preview_access(&client).await?;
        Ok(())
    }

    /// Pre-flight check of a Management key: fetches one page of assets.
    #[instrument(level = "debug", skip(self, api_key))]
    pub async fn test_management_api_key(&self, environment_id: &str, api_key: &str) -> Result<(), ApiFailure> {
        let api_key = require_key(Some(api_key))?;
        let client = ManagementClient::new(&self.settings, environment_id.trim(), api_key)?;
        client
            .first_assets_page()
            .await
            .map(|_| ())
            .map_err(|error| ApiFailure::new(error.status, error.management_key_message()))
    }
}
