use crate::{
    clients::DeliveryClient,
    collectors::{
        collector::or_zero,
        probe::probe_preview_access,
        Collector,
    },
    error::{
        CollectionError,
        SourceError,
    },
    metrics::{
        ApiSource,
        DeliveryMetrics,
        MetricsUpdate,
    },
    Settings,
};
use std::{
    future::Future,
    pin::Pin,
};

/// Counts content types, languages and language variants through the Preview API.
#[derive(Debug)]
pub struct DeliveryCollector {
    client: DeliveryClient,
}

impl DeliveryCollector {
    pub fn new(settings: &Settings, environment_id: &str, api_key: &str) -> Result<Self, CollectionError> {
        Ok(Self {
            client: DeliveryClient::new(settings, environment_id, api_key)?,
        })
    }

    /// Sums the variant counts of all languages, one language at a time. A failing language is skipped.
    async fn count_language_variants(&self, languages: &[String]) -> u64 {
        let mut total = 0;
        for language in languages {
            match self.client.count_items(language).await {
                Ok(count) => {
                    debug!(language, count, "Counted language variants");
                    total += count;
                }
                Err(error) => warn!(language, %error, "Failed to count content items, skipping language"),
            }
        }
        total
    }
}

impl Collector for DeliveryCollector {
    fn collect(&mut self) -> Pin<Box<dyn Future<Output = Result<MetricsUpdate, SourceError>> + Send + '_>> {
        Box::pin(async move {
            probe_preview_access(&self.client).await?;

            let content_types = or_zero("content types", self.client.count_types().await);
            let languages = self.client.list_languages().await.unwrap_or_else(|error| {
                warn!(%error, "Failed to get languages, content items cannot be counted");
                Vec::new()
            });
            let content_items = self.count_language_variants(&languages).await;

            Ok(MetricsUpdate::Delivery(DeliveryMetrics {
                content_types,
                languages: languages.len() as u64,
                content_items,
                published_content_items: content_items,
            }))
        })
    }

    fn source(&self) -> ApiSource {
        ApiSource::Delivery
    }

    fn name(&self) -> &'static str {
        "Delivery"
    }
}
