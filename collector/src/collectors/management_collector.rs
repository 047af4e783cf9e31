use crate::{
    clients::ManagementClient,
    collectors::{
        collector::or_zero,
        Collector,
    },
    error::{
        CollectionError,
        SourceError,
    },
    metrics::{
        ApiSource,
        ManagementMetrics,
        MetricsUpdate,
    },
    Settings,
};
use std::{
    future::Future,
    pin::Pin,
};

/// Collects assets, collections, custom roles and spaces through the Management API.
#[derive(Debug)]
pub struct ManagementCollector {
    client: ManagementClient,
    excluded_role_codename: String,
}

impl ManagementCollector {
    pub fn new(settings: &Settings, environment_id: &str, api_key: &str) -> Result<Self, CollectionError> {
        Ok(Self {
            client: ManagementClient::new(settings, environment_id, api_key)?,
            excluded_role_codename: settings.excluded_role_codename.clone(),
        })
    }
}

impl Collector for ManagementCollector {
    fn collect(&mut self) -> Pin<Box<dyn Future<Output = Result<MetricsUpdate, SourceError>> + Send + '_>> {
        Box::pin(async move {
            // Assets are the only mandatory part; everything after is best effort.
            let assets = self.client.asset_totals().await.map_err(|error| SourceError::Api {
                api: ApiSource::Management,
                error,
            })?;

            let collections = or_zero("collections", self.client.count_collections().await);
            let custom_roles = or_zero(
                "custom roles",
                self.client.count_roles_except(&self.excluded_role_codename).await,
            );
            let spaces = or_zero("spaces", self.client.count_spaces().await);

            Ok(MetricsUpdate::Management(ManagementMetrics {
                asset_count: assets.count,
                asset_storage_size: assets.size,
                collections,
                custom_roles,
                spaces,
            }))
        })
    }

    fn source(&self) -> ApiSource {
        ApiSource::Management
    }

    fn name(&self) -> &'static str {
        "Management"
    }
}
