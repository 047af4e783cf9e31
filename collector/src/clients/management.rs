use super::{
    endpoint,
    null_as_empty,
    ApiClient,
    ContinuationPage,
    ContinuationPagination,
};
use crate::{
    error::{
        ApiError,
        CollectionError,
    },
    Settings,
};
use serde::{
    de::IgnoredAny,
    Deserialize,
};
use url::Url;

#[derive(Debug, Deserialize)]
pub struct AssetsPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub pagination: ContinuationPagination,
}

impl ContinuationPage for AssetsPage {
    fn continuation_token(&self) -> Option<&str> {
        self.pagination.continuation_token.as_deref()
    }
}

#[derive(Debug, Deserialize)]
pub struct Asset {
    /// In bytes.
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Deserialize)]
struct CollectionsResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    collections: Vec<IgnoredAny>,
}

#[derive(Deserialize)]
struct RolesResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    roles: Vec<Role>,
}

#[derive(Deserialize)]
struct Role {
    #[serde(default)]
    codename: Option<String>,
}

/// Asset totals of an environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetTotals {
    pub count: u64,
    pub size: u64,
}

/// Management API client of one environment.
#[derive(Debug)]
pub struct ManagementClient {
    api: ApiClient,
    assets: Url,
    collections: Url,
    roles: Url,
    spaces: Url,
}

impl ManagementClient {
    pub fn new(settings: &Settings, environment_id: &str, api_key: &str) -> Result<Self, CollectionError> {
        let management = &settings.endpoints.management;
        let resource = |name: &str| endpoint(management, &["projects", environment_id, name]);
        Ok(Self {
            api: ApiClient::new(api_key, settings.request_timeout)?,
            assets: resource("assets")?,
            collections: resource("collections")?,
            roles: resource("roles")?,
            spaces: resource("spaces")?,
        })
    }

    /// Counts all assets and sums their sizes, following continuation tokens to the last page.
    pub async fn asset_totals(&self) -> Result<AssetTotals, ApiError> {
        let mut totals = AssetTotals::default();
        self.api
            .for_each_page(&self.assets, |page: AssetsPage| {
                totals.count += page.assets.len() as u64;
                totals.size += page.assets.iter().filter_map(|asset| asset.size).sum::<u64>();
            })
            .await?;
        Ok(totals)
    }

    /// Fetches only the first page of assets.
    pub async fn first_assets_page(&self) -> Result<AssetsPage, ApiError> {
        self.api.get_json(&self.assets, &[]).await
    }

    pub async fn count_collections(&self) -> Result<u64, ApiError> {
        let response: CollectionsResponse = self.api.get_json(&self.collections, &[]).await?;
        Ok(response.collections.len() as u64)
    }

    /// Counts the roles whose codename differs from `excluded_codename`.
    pub async fn count_roles_except(&self, excluded_codename: &str) -> Result<u64, ApiError> {
        let response: RolesResponse = self.api.get_json(&self.roles, &[]).await?;
        Ok(response
            .roles
            .iter()
            .filter(|role| role.codename.as_deref() != Some(excluded_codename))
            .count() as u64)
    }

    pub async fn count_spaces(&self) -> Result<u64, ApiError> {
        let spaces: Vec<IgnoredAny> = self.api.get_json(&self.spaces, &[]).await?;
        Ok(spaces.len() as u64)
    }
}
