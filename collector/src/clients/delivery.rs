use super::{
    endpoint,
    ApiClient,
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
use strum::Display;
use url::Url;

/// Makes the Preview API wait until recent changes are indexed.
const WAIT_FOR_NEW_CONTENT: (&str, &str) = ("X-KC-Wait-For-Loading-New-Content", "true");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryMode {
    /// Published content over secure access.
    Published,
    /// All workflow steps, needs a key with 'Content preview'.
    Preview,
}

#[derive(Deserialize)]
struct TypesPage {
    types: Vec<IgnoredAny>,
}

#[derive(Deserialize)]
struct LanguagesPage {
    languages: Vec<Language>,
}

#[derive(Deserialize)]
struct Language {
    system: LanguageSystem,
}

#[derive(Deserialize)]
struct LanguageSystem {
    codename: String,
}

#[derive(Deserialize)]
struct ItemsPage {
    #[serde(default)]
    pagination: ItemsPagination,
}

#[derive(Default, Deserialize)]
struct ItemsPagination {
    #[serde(default)]
    total_count: Option<u64>,
}

/// Delivery and Preview API client of one environment.
#[derive(Debug)]
pub struct DeliveryClient {
    api: ApiClient,
    published_items: Url,
    preview_items: Url,
    types: Url,
    languages: Url,
    page_size: u32,
}

impl DeliveryClient {
    pub fn new(settings: &Settings, environment_id: &str, api_key: &str) -> Result<Self, CollectionError> {
        let endpoints = &settings.endpoints;
        Ok(Self {
            api: ApiClient::new(api_key, settings.request_timeout)?,
            published_items: endpoint(&endpoints.delivery, &[environment_id, "items"])?,
            preview_items: endpoint(&endpoints.preview, &[environment_id, "items"])?,
            types: endpoint(&endpoints.preview, &[environment_id, "types"])?,
            languages: endpoint(&endpoints.preview, &[environment_id, "languages"])?,
            page_size: settings.page_size.max(1),
        })
    }

    /// Requests a single item without linked content in the given mode.
    pub async fn probe(&self, mode: DeliveryMode) -> Result<(), ApiError> {
        let mut url = match mode {
            DeliveryMode::Published => self.published_items.clone(),
            DeliveryMode::Preview => self.preview_items.clone(),
        };
        url.query_pairs_mut().append_pair("limit", "1").append_pair("depth", "0");
        match mode {
            DeliveryMode::Published => self.api.check(&url, &[]).await,
            DeliveryMode::Preview => self.api.check(&url, &[WAIT_FOR_NEW_CONTENT]).await,
        }
    }

    pub async fn count_types(&self) -> Result<u64, ApiError> {
        let mut count = 0;
        self.list_all(&self.types, |page: TypesPage| {
            count += page.types.len() as u64;
            page.types.len()
        })
        .await?;
        Ok(count)
    }

    /// Codenames of all languages of the environment.
    pub async fn list_languages(&self) -> Result<Vec<String>, ApiError> {
        let mut codenames = Vec::new();
        self.list_all(&self.languages, |page: LanguagesPage| {
            let len = page.languages.len();
            codenames.extend(page.languages.into_iter().map(|language| language.system.codename));
            len
        })
        .await?;
        Ok(codenames)
    }

    /// Number of language variants in the given language, in all workflow steps.
    pub async fn count_items(&self, language: &str) -> Result<u64, ApiError> {
        let mut url = self.preview_items.clone();
        url.query_pairs_mut()
            .append_pair("limit", "1")
            .append_pair("depth", "0")
            .append_pair("includeTotalCount", "true")
            .append_pair("language", language)
            .append_pair("system.language", language);
        let page: ItemsPage = self.api.get_json(&url, &[WAIT_FOR_NEW_CONTENT]).await?;
        Ok(page.pagination.total_count.unwrap_or(0))
    }

    /// Walks a skip/limit paged listing until a page comes back short. `on_page` returns the page's item count.
    async fn list_all<P, F>(&self, base: &Url, mut on_page: F) -> Result<(), ApiError>
    where
        P: serde::de::DeserializeOwned,
        F: FnMut(P) -> usize,
    {
        let limit = self.page_size as usize;
        let mut skip = 0usize;
        loop {
            let mut url = base.clone();
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string())
                .append_pair("skip", &skip.to_string());
            let page: P = self.api.get_json(&url, &[WAIT_FOR_NEW_CONTENT]).await?;
            if on_page(page) < limit {
                return Ok(());
            }
            skip += limit;
        }
    }
}
