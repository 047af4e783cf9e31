//! # Kontent.ai Usage Insights Collector
//!
//! Collects usage metrics of Kontent.ai environments from three read-only APIs:
//!
//! - **Delivery / Preview API**: content types, languages and language variants in all workflow steps
//! - **Management API**: assets and their storage, collections, custom roles, spaces
//! - **Subscription API**: active users per environment, project and environment discovery
//!
//! ## Architecture
//!
//! - **`clients`**: one thin JSON client per API family, including skip/limit and continuation paging
//! - **`collectors`**: the credential probe, one collector per source, the environment aggregator and the
//!   orchestrator that walks the environment list
//! - **`metrics`**: the per-environment result model and project lookups
//! - **`error`**: API error classification and the response envelope handed to callers
//!
//! Every call builds its own HTTP clients from [`Settings`]; nothing is cached between runs.

#[macro_use]
extern crate tracing;

pub mod clients;
pub mod collectors;
pub mod error;
pub mod metrics;

pub use collectors::*;
pub use error::{
    ApiError,
    ApiErrorKind,
    ApiFailure,
    ApiResponse,
    CollectionError,
    SourceError,
};
pub use metrics::*;
use std::time::Duration;
use usage_insights_config::{
    ApiEndpoints,
    Config,
};

/// Fallback if the configured timeout cannot be parsed while building default settings.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a collector needs besides the credentials.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoints: ApiEndpoints,
    /// Page size of skip/limit paged Delivery listings.
    pub page_size: u32,
    pub request_timeout: Duration,
    /// Users with e-mail addresses in this domain are not counted as active users.
    pub staff_email_domain: String,
    /// The built-in role that does not count as a custom role.
    pub excluded_role_codename: String,
}

impl Settings {
    /// Default settings talking to other endpoints, e.g. a mock server.
    pub fn with_endpoints(endpoints: ApiEndpoints) -> Self {
        Self {
            endpoints,
            ..Self::default()
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        let config = Config::default();
        Self {
            request_timeout: config.request_timeout().unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            endpoints: config.endpoints,
            page_size: config.page_size,
            staff_email_domain: config.staff_email_domain,
            excluded_role_codename: config.excluded_role_codename,
        }
    }
}

impl TryFrom<&Config> for Settings {
    type Error = eyre::Report;

    fn try_from(config: &Config) -> Result<Self, Self::Error> {
        Ok(Self {
            endpoints: config.endpoints.clone(),
            page_size: config.page_size,
            request_timeout: config.request_timeout()?,
            staff_email_domain: config.staff_email_domain.clone(),
            excluded_role_codename: config.excluded_role_codename.clone(),
        })
    }
}
