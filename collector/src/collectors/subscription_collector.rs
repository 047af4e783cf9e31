use crate::{
    clients::SubscriptionClient,
    collectors::Collector,
    error::{
        ApiError,
        CollectionError,
        SourceError,
    },
    metrics::{
        ApiSource,
        MetricsUpdate,
        SubscriptionMetrics,
    },
    Settings,
};
use std::{
    future::Future,
    pin::Pin,
};
use usage_insights_config::SubscriptionCredentials;

/// Counts the active users of one environment, leaving out staff accounts.
#[derive(Debug)]
pub struct SubscriptionCollector {
    client: SubscriptionClient,
    environment_id: String,
    staff_email_domain: String,
}

impl SubscriptionCollector {
    pub fn new(
        settings: &Settings,
        credentials: &SubscriptionCredentials,
        environment_id: &str,
    ) -> Result<Self, CollectionError> {
        Ok(Self {
            client: SubscriptionClient::new(settings, credentials)?,
            environment_id: environment_id.to_string(),
            staff_email_domain: settings.staff_email_domain.clone(),
        })
    }

    /// Walks all user pages of the subscription. Any failed page aborts the count.
    pub async fn count_active_users(&self) -> Result<u64, ApiError> {
        let environment_id = self.environment_id.as_str();
        let staff_email_domain = self.staff_email_domain.as_str();
        let mut active_users = 0;

        let pages = self
            .client
            .for_each_users_page(|page| {
                active_users += page
                    .users
                    .iter()
                    .filter(|user| !user.has_email_domain(staff_email_domain))
                    .filter(|user| user.is_active_in(environment_id))
                    .count() as u64;
            })
            .await?;

        debug!(pages, active_users, "Counted active users");
        Ok(active_users)
    }
}

impl Collector for SubscriptionCollector {
    fn collect(&mut self) -> Pin<Box<dyn Future<Output = Result<MetricsUpdate, SourceError>> + Send + '_>> {
        Box::pin(async move {
            let active_users = self.count_active_users().await.map_err(|error| SourceError::Api {
                api: ApiSource::Subscription,
                error,
            })?;
            Ok(MetricsUpdate::Subscription(SubscriptionMetrics { active_users }))
        })
    }

    fn source(&self) -> ApiSource {
        ApiSource::Subscription
    }

    fn name(&self) -> &'static str {
        "Subscription"
    }
}
