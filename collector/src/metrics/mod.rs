pub mod projects;

use chrono::{
    DateTime,
    Utc,
};
pub use projects::*;
use serde::{
    Deserialize,
    Serialize,
};
use strum::{
    Display,
    EnumIter,
};
use usage_insights_config::EnvironmentCredentials;

/// The three API families a metric can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApiSource {
    Delivery,
    Management,
    Subscription,
}

/// Usage counters of one environment. A field is only meaningful if the key of its source was supplied, see
/// [`ApiKeysAvailable`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetrics {
    pub active_users: u64,
    pub bandwidth: u64,
    pub collections: u64,
    /// All language variants in all workflow steps.
    pub content_items: u64,
    pub content_types: u64,
    /// In bytes.
    pub asset_storage_size: u64,
    pub asset_count: u64,
    pub custom_roles: u64,
    pub spaces: u64,

    pub languages: u64,
    pub published_content_items: u64,
    pub unpublished_content_items: u64,
    pub archived_content_items: u64,
    pub workflow_steps: u64,

    pub average_content_items_per_type: f64,
    pub average_assets_per_item: f64,
    pub storage_utilization_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMetrics {
    pub content_types: u64,
    pub languages: u64,
    pub content_items: u64,
    pub published_content_items: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementMetrics {
    pub asset_count: u64,
    pub asset_storage_size: u64,
    pub collections: u64,
    pub custom_roles: u64,
    pub spaces: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionMetrics {
    pub active_users: u64,
}

/// Partial result of one collector. Each variant only carries the fields its source owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsUpdate {
    Delivery(DeliveryMetrics),
    Management(ManagementMetrics),
    Subscription(SubscriptionMetrics),
}

impl MetricsUpdate {
    pub fn source(&self) -> ApiSource {
        match self {
            MetricsUpdate::Delivery(_) => ApiSource::Delivery,
            MetricsUpdate::Management(_) => ApiSource::Management,
            MetricsUpdate::Subscription(_) => ApiSource::Subscription,
        }
    }
}

impl UsageMetrics {
    /// Merges a partial result, touching only the fields owned by the update's source.
    pub fn apply(&mut self, update: MetricsUpdate) {
        match update {
            MetricsUpdate::Delivery(delivery) => {
                self.content_types = delivery.content_types;
                self.languages = delivery.languages;
                self.content_items = delivery.content_items;
                self.published_content_items = delivery.published_content_items;
            }
            MetricsUpdate::Management(management) => {
                self.asset_count = management.asset_count;
                self.asset_storage_size = management.asset_storage_size;
                self.collections = management.collections;
                self.custom_roles = management.custom_roles;
                self.spaces = management.spaces;
            }
            MetricsUpdate::Subscription(subscription) => {
                self.active_users = subscription.active_users;
            }
        }
    }

    /// Computes the ratio fields. Must run after all updates were applied.
    pub fn compute_derived(&mut self) {
        self.average_content_items_per_type = ratio(self.content_items, self.content_types);
        self.average_assets_per_item = ratio(self.asset_count, self.content_items);
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Which key categories were supplied for an environment, regardless of whether they worked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeysAvailable {
    pub delivery: bool,
    pub management: bool,
    pub subscription: bool,
}

impl ApiKeysAvailable {
    pub fn is_available(&self, source: ApiSource) -> bool {
        match source {
            ApiSource::Delivery => self.delivery,
            ApiSource::Management => self.management,
            ApiSource::Subscription => self.subscription,
        }
    }
}

impl From<&EnvironmentCredentials> for ApiKeysAvailable {
    fn from(credentials: &EnvironmentCredentials) -> Self {
        Self {
            delivery: credentials.delivery_api_key().is_some(),
            management: credentials.management_api_key().is_some(),
            subscription: credentials.subscription().is_some(),
        }
    }
}

/// Result of collecting one environment. A refresh creates a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentData {
    pub environment_id: String,
    pub name: String,
    pub metrics: UsageMetrics,
    pub last_updated: DateTime<Utc>,
    pub api_keys_available: ApiKeysAvailable,
}

impl EnvironmentData {
    pub fn new(environment_id: impl ToString, metrics: UsageMetrics, api_keys_available: ApiKeysAvailable) -> Self {
        let environment_id = environment_id.to_string();
        Self {
            name: format!("Environment {environment_id}"),
            environment_id,
            metrics,
            last_updated: Utc::now(),
            api_keys_available,
        }
    }

    /// The value of a reported metric, or `None` if its source key was not supplied.
    pub fn reported(&self, metric: ReportedMetric) -> Option<f64> {
        self.api_keys_available
            .is_available(metric.source())
            .then(|| metric.value(&self.metrics))
    }
}

/// The metrics shown in reports and exports, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ReportedMetric {
    #[strum(to_string = "Active languages")]
    ActiveLanguages,
    #[strum(to_string = "Active users")]
    ActiveUsers,
    #[strum(to_string = "Asset count")]
    AssetCount,
    #[strum(to_string = "Asset storage (MB)")]
    AssetStorageMb,
    #[strum(to_string = "Collections")]
    Collections,
    #[strum(to_string = "Content items (all languages)")]
    ContentItems,
    #[strum(to_string = "Content types")]
    ContentTypes,
    #[strum(to_string = "Custom roles")]
    CustomRoles,
    #[strum(to_string = "Spaces")]
    Spaces,
}

impl ReportedMetric {
    pub fn source(&self) -> ApiSource {
        match self {
            ReportedMetric::ActiveLanguages | ReportedMetric::ContentItems | ReportedMetric::ContentTypes => {
                ApiSource::Delivery
            }
            ReportedMetric::ActiveUsers => ApiSource::Subscription,
            ReportedMetric::AssetCount
            | ReportedMetric::AssetStorageMb
            | ReportedMetric::Collections
            | ReportedMetric::CustomRoles
            | ReportedMetric::Spaces => ApiSource::Management,
        }
    }

    /// Key of the metric in the JSON export.
    pub fn json_key(&self) -> &'static str {
        match self {
            ReportedMetric::ActiveLanguages => "activeLanguages",
            ReportedMetric::ActiveUsers => "activeUsers",
            ReportedMetric::AssetCount => "assetCount",
            ReportedMetric::AssetStorageMb => "assetStorageMB",
            ReportedMetric::Collections => "collections",
            ReportedMetric::ContentItems => "contentItemsAllLanguages",
            ReportedMetric::ContentTypes => "contentTypes",
            ReportedMetric::CustomRoles => "customRoles",
            ReportedMetric::Spaces => "spaces",
        }
    }

    pub fn value(&self, metrics: &UsageMetrics) -> f64 {
        match self {
            ReportedMetric::ActiveLanguages => metrics.languages as f64,
            ReportedMetric::ActiveUsers => metrics.active_users as f64,
            ReportedMetric::AssetCount => metrics.asset_count as f64,
            ReportedMetric::AssetStorageMb => bytes_to_megabytes(metrics.asset_storage_size),
            ReportedMetric::Collections => metrics.collections as f64,
            ReportedMetric::ContentItems => metrics.content_items as f64,
            ReportedMetric::ContentTypes => metrics.content_types as f64,
            ReportedMetric::CustomRoles => metrics.custom_roles as f64,
            ReportedMetric::Spaces => metrics.spaces as f64,
        }
    }
}

/// Decimal megabytes rounded to two places.
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    (bytes as f64 / 1_000_000.0 * 100.0).round() / 100.0
}
