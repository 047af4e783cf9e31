//! Thin HTTP clients for the three Kontent.ai API families.
//!
//! Every client owns its own `reqwest::Client` and is created per collection call. Endpoint URLs are resolved
//! when a client is built, so a misconfigured base URL surfaces as a [`CollectionError`] before any request is sent.

pub mod delivery;
pub mod management;
pub mod subscription;

use crate::error::{
    ApiError,
    CollectionError,
};
pub use delivery::{
    DeliveryClient,
    DeliveryMode,
};
pub use management::ManagementClient;
use reqwest::{
    RequestBuilder,
    Response,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Deserializer,
};
use std::time::Duration;
pub use subscription::SubscriptionClient;
use url::Url;

/// Request header carrying the continuation token of the next page.
pub const CONTINUATION_HEADER: &str = "x-continuation";

/// A page of a list endpoint that is paged with continuation tokens.
pub trait ContinuationPage: DeserializeOwned {
    fn continuation_token(&self) -> Option<&str>;
}

/// The `pagination` object of continuation-paged responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContinuationPagination {
    #[serde(default)]
    pub continuation_token: Option<String>,
}

/// Authenticated JSON client bound to one API key.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(api_key: impl ToString, timeout: Duration) -> Result<Self, CollectionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CollectionError::HttpClient)?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
        })
    }

    fn get(&self, url: &Url, headers: &[(&str, &str)]) -> RequestBuilder {
        headers
            .iter()
            .fold(self.http.get(url.clone()).bearer_auth(&self.api_key), |request, (name, value)| {
                request.header(*name, *value)
            })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(ApiError::transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self
            .send(request)
            .await?
            .text()
            .await
            .map_err(ApiError::transport)?;
        serde_json::from_str(&body).map_err(ApiError::decode)
    }

    /// Fetches and decodes one JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url, headers: &[(&str, &str)]) -> Result<T, ApiError> {
        debug!(%url, "GET");
        self.send_json(self.get(url, headers)).await
    }

    /// Only checks that the request succeeds; the body is ignored.
    pub async fn check(&self, url: &Url, headers: &[(&str, &str)]) -> Result<(), ApiError> {
        debug!(%url, "GET (status only)");
        self.send(self.get(url, headers)).await.map(|_| ())
    }

    /// Fetches all pages of a continuation-paged list, strictly one after the other, and hands each page to
    /// `on_page`. Returns the number of requests made.
    pub async fn for_each_page<P, F>(&self, url: &Url, mut on_page: F) -> Result<usize, ApiError>
    where
        P: ContinuationPage,
        F: FnMut(P),
    {
        let mut continuation: Option<String> = None;
        let mut requests = 0;
        loop {
            let request = match continuation.as_deref() {
                Some(token) => self.get(url, &[(CONTINUATION_HEADER, token)]),
                None => self.get(url, &[]),
            };
            debug!(%url, page = requests + 1, "GET page");
            let page: P = self.send_json(request).await?;
            requests += 1;

            let next = page
                .continuation_token()
                .filter(|token| !token.is_empty())
                .map(ToString::to_string);
            on_page(page);

            match next {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }
        Ok(requests)
    }
}

/// Appends path segments to a base URL. The base is treated as a directory whether or not it ends with a slash.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, CollectionError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| CollectionError::Endpoint(base.clone()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Treats a missing or `null` list as empty.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
