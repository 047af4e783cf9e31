use serde::{
    Deserialize,
    Serialize,
};
use url::Url;

/// Base URLs of the three Kontent.ai API families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    /// Delivery API, published content. Requests use secure access with the preview key.
    pub delivery: Url,
    /// Delivery Preview API, all workflow steps.
    pub preview: Url,
    /// Management API, also hosting the Subscription API under `subscriptions/`.
    pub management: Url,
}

impl ApiEndpoints {
    /// Points all three API families at a single host, e.g. a local mock server.
    /// The paths mirror the production layout so requests stay distinguishable.
    pub fn single_host(base: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            delivery: base.join("deliver/")?,
            preview: base.join("preview/")?,
            management: base.join("v2/")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_host_layout() {
        let base = Url::parse("http://127.0.0.1:8080/").unwrap();
        let endpoints = ApiEndpoints::single_host(&base).unwrap();
        assert_eq!(endpoints.delivery.as_str(), "http://127.0.0.1:8080/deliver/");
        assert_eq!(endpoints.preview.as_str(), "http://127.0.0.1:8080/preview/");
        assert_eq!(endpoints.management.as_str(), "http://127.0.0.1:8080/v2/");
    }
}
