mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use usage_insights_collector::{
    AccessDenial,
    ApiKeysAvailable,
    ApiSource,
    CollectionEvent,
    EnvironmentAggregator,
    NoProgress,
    UsageMetrics,
};
use usage_insights_config::EnvironmentCredentials;
use wiremock::{
    matchers::{
        header,
        method,
        path,
    },
    Mock,
    MockServer,
    ResponseTemplate,
};

fn delivery_only() -> EnvironmentCredentials {
    EnvironmentCredentials {
        delivery_api_key: Some(DELIVERY_KEY.to_string()),
        ..EnvironmentCredentials::new(ENV_ID)
    }
}

fn management_only() -> EnvironmentCredentials {
    EnvironmentCredentials {
        management_api_key: Some(MANAGEMENT_KEY.to_string()),
        ..EnvironmentCredentials::new(ENV_ID)
    }
}

#[tokio::test]
async fn no_keys_collects_nothing() {
    let server = MockServer::start().await;
    let aggregator = EnvironmentAggregator::new(settings(&server));

    let data = aggregator
        .collect_environment_data(&EnvironmentCredentials::new(ENV_ID), &NoProgress)
        .await
        .unwrap();

    assert_eq!(data.environment_id, ENV_ID);
    assert_eq!(data.name, format!("Environment {ENV_ID}"));
    assert_eq!(data.metrics, UsageMetrics::default());
    assert_eq!(data.api_keys_available, ApiKeysAvailable::default());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn language_variants_are_summed() {
    let server = MockServer::start().await;
    mount_delivery_access(&server, ENV_ID).await;
    mount_types(&server, ENV_ID, 2).await;
    mount_languages(&server, ENV_ID, &["en", "de"]).await;
    mount_item_count(&server, ENV_ID, "en", item_count(5)).await;
    mount_item_count(&server, ENV_ID, "de", item_count(7)).await;

    let data = EnvironmentAggregator::new(settings(&server))
        .collect_environment_data(&delivery_only(), &NoProgress)
        .await
        .unwrap();

    assert_eq!(data.metrics.content_types, 2);
    assert_eq!(data.metrics.languages, 2);
    assert_eq!(data.metrics.content_items, 12);
    assert_eq!(data.metrics.published_content_items, 12);
    assert_eq!(data.metrics.average_content_items_per_type, 6.0);
    assert!(data.api_keys_available.delivery);
    assert!(!data.api_keys_available.management);
}

#[tokio::test]
async fn failing_language_is_skipped() {
    let server = MockServer::start().await;
    mount_delivery_access(&server, ENV_ID).await;
    mount_types(&server, ENV_ID, 1).await;
    mount_languages(&server, ENV_ID, &["en", "de"]).await;
    mount_item_count(&server, ENV_ID, "en", item_count(5)).await;
    mount_item_count(&server, ENV_ID, "de", error_json(500, "Internal error")).await;

    let data = EnvironmentAggregator::new(settings(&server))
        .collect_environment_data(&delivery_only(), &NoProgress)
        .await
        .unwrap();

    assert_eq!(data.metrics.languages, 2);
    assert_eq!(data.metrics.content_items, 5);
}

#[tokio::test]
async fn content_types_are_paged_until_a_short_page() {
    let server = MockServer::start().await;
    mount_delivery_access(&server, ENV_ID).await;
    mount_languages(&server, ENV_ID, &[]).await;
    let page = |count: usize| {
        let types: Vec<_> = (0..count).map(|i| json!({ "system": { "codename": format!("t{i}") } })).collect();
        ok_json(json!({ "types": types, "pagination": {} }))
    };
    for (skip, count) in [("0", 2), ("2", 2), ("4", 1)] {
        Mock::given(method("GET"))
            .and(path(format!("/preview/{ENV_ID}/types")))
            .and(wiremock::matchers::query_param("limit", "2"))
            .and(wiremock::matchers::query_param("skip", skip))
            .respond_with(page(count))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut settings = settings(&server);
    settings.page_size = 2;
    let data = EnvironmentAggregator::new(settings)
        .collect_environment_data(&delivery_only(), &NoProgress)
        .await
        .unwrap();

    assert_eq!(data.metrics.content_types, 5);
    assert_eq!(data.metrics.average_content_items_per_type, 0.0);
}

#[tokio::test]
async fn invalid_delivery_key_does_not_fail_the_environment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/deliver/{ENV_ID}/items")))
        .respond_with(error_json(401, "Missing or invalid API key."))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/preview/{ENV_ID}/items")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let events = Events::default();
    let listener = events.listener();
    let data = EnvironmentAggregator::new(settings(&server))
        .collect_environment_data(&delivery_only(), &listener)
        .await
        .unwrap();

    assert!(data.api_keys_available.delivery);
    assert_eq!(data.metrics, UsageMetrics::default());
    assert_eq!(
        events.take(),
        vec![CollectionEvent::SourceFailed {
            environment_id: ENV_ID.to_string(),
            api: ApiSource::Delivery,
            message: AccessDenial::InvalidKey.to_string(),
        }]
    );
}

#[tokio::test]
async fn probe_sends_the_key_and_preview_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/deliver/{ENV_ID}/items")))
        .and(header("authorization", format!("Bearer {DELIVERY_KEY}").as_str()))
        .respond_with(ok_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/preview/{ENV_ID}/items")))
        .and(header("authorization", format!("Bearer {DELIVERY_KEY}").as_str()))
        .and(header("X-KC-Wait-For-Loading-New-Content", "true"))
        .respond_with(ok_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let aggregator = EnvironmentAggregator::new(settings(&server));
    assert_eq!(aggregator.test_delivery_api_key(ENV_ID, DELIVERY_KEY).await, Ok(()));
}

#[tokio::test]
async fn key_without_content_preview_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/deliver/{ENV_ID}/items")))
        .respond_with(ok_json(json!({ "items": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/preview/{ENV_ID}/items")))
        .respond_with(error_json(403, "Preview not allowed"))
        .mount(&server)
        .await;

    let aggregator = EnvironmentAggregator::new(settings(&server));
    let failure = aggregator
        .test_delivery_api_key(ENV_ID, DELIVERY_KEY)
        .await
        .unwrap_err();
    assert_eq!(failure.message, AccessDenial::InsufficientPermission.to_string());

    let failure = aggregator.test_delivery_api_key(ENV_ID, "   ").await.unwrap_err();
    assert_eq!(failure.message, "No API key provided");
}

#[tokio::test]
async fn unreachable_delivery_api_is_reported() {
    let server = MockServer::start().await;
    let settings = settings(&server);
    drop(server);

    let failure = EnvironmentAggregator::new(settings)
        .test_delivery_api_key(ENV_ID, DELIVERY_KEY)
        .await
        .unwrap_err();
    assert!(failure.message.starts_with("Delivery API could not be reached"));
}

#[tokio::test]
async fn assets_follow_continuation_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{ENV_ID}/assets")))
        .and(HeaderMissing("x-continuation"))
        .respond_with(ok_json(json!({
            "assets": [{ "size": 1_500_000 }, { "size": null }],
            "pagination": { "continuation_token": "page-2", "next_page": "next" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{ENV_ID}/assets")))
        .and(header("x-continuation", "page-2"))
        .respond_with(ok_json(json!({
            "assets": [{ "size": 500_000 }],
            "pagination": { "continuation_token": null, "next_page": null }
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_management_extras(&server, ENV_ID, &["reviewer", "project-manager", "translator"]).await;

    let data = EnvironmentAggregator::new(settings(&server))
        .collect_environment_data(&management_only(), &NoProgress)
        .await
        .unwrap();

    assert_eq!(data.metrics.asset_count, 3);
    assert_eq!(data.metrics.asset_storage_size, 2_000_000);
    assert_eq!(data.metrics.collections, 2);
    assert_eq!(data.metrics.custom_roles, 2);
    assert_eq!(data.metrics.spaces, 3);
    assert_eq!(data.metrics.average_assets_per_item, 0.0);
    assert!(data.api_keys_available.management);
}

#[tokio::test]
async fn project_manager_is_never_a_custom_role() {
    for roles in [
        ["project-manager", "editor", "author"],
        ["editor", "author", "project-manager"],
    ] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v2/projects/{ENV_ID}/assets")))
            .respond_with(ok_json(json!({ "assets": [], "pagination": {} })))
            .mount(&server)
            .await;
        mount_management_extras(&server, ENV_ID, &roles).await;

        let data = EnvironmentAggregator::new(settings(&server))
            .collect_environment_data(&management_only(), &NoProgress)
            .await
            .unwrap();
        assert_eq!(data.metrics.custom_roles, 2, "roles: {roles:?}");
    }
}

#[tokio::test]
async fn failing_management_extras_count_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{ENV_ID}/assets")))
        .respond_with(ok_json(json!({ "assets": [{ "size": 10 }], "pagination": {} })))
        .mount(&server)
        .await;
    for resource in ["collections", "roles", "spaces"] {
        Mock::given(method("GET"))
            .and(path(format!("/v2/projects/{ENV_ID}/{resource}")))
            .respond_with(error_json(403, "Forbidden"))
            .mount(&server)
            .await;
    }

    let events = Events::default();
    let listener = events.listener();
    let data = EnvironmentAggregator::new(settings(&server))
        .collect_environment_data(&management_only(), &listener)
        .await
        .unwrap();

    assert_eq!(data.metrics.asset_count, 1);
    assert_eq!(data.metrics.collections, 0);
    assert_eq!(data.metrics.custom_roles, 0);
    assert_eq!(data.metrics.spaces, 0);
    assert!(events.take().is_empty());
}

#[tokio::test]
async fn failing_assets_fail_the_management_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{ENV_ID}/assets")))
        .respond_with(error_json(401, "Missing or invalid API key."))
        .mount(&server)
        .await;
    mount_management_extras(&server, ENV_ID, &["editor"]).await;

    let events = Events::default();
    let listener = events.listener();
    let data = EnvironmentAggregator::new(settings(&server))
        .collect_environment_data(&management_only(), &listener)
        .await
        .unwrap();

    assert_eq!(data.metrics, UsageMetrics::default());
    assert!(matches!(
        events.take().as_slice(),
        [CollectionEvent::SourceFailed {
            api: ApiSource::Management,
            ..
        }]
    ));
}

#[tokio::test]
async fn management_key_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{ENV_ID}/assets")))
        .and(header("authorization", format!("Bearer {MANAGEMENT_KEY}").as_str()))
        .respond_with(ok_json(json!({ "assets": [], "pagination": { "continuation_token": "more" } })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{ENV_ID}/assets")))
        .and(header("authorization", "Bearer wrong"))
        .respond_with(error_json(401, "Missing or invalid API key."))
        .mount(&server)
        .await;

    let aggregator = EnvironmentAggregator::new(settings(&server));
    assert_eq!(aggregator.test_management_api_key(ENV_ID, MANAGEMENT_KEY).await, Ok(()));

    let failure = aggregator.test_management_api_key(ENV_ID, "wrong").await.unwrap_err();
    assert_eq!(failure.status, Some(401));
    assert_eq!(
        failure.message,
        "Invalid Management API key. Please verify your key and try again."
    );
}

#[tokio::test]
async fn repeated_collection_is_stable() {
    let server = MockServer::start().await;
    mount_delivery_access(&server, ENV_ID).await;
    mount_types(&server, ENV_ID, 3).await;
    mount_languages(&server, ENV_ID, &["en"]).await;
    Mock::given(method("GET"))
        .and(path(format!("/preview/{ENV_ID}/items")))
        .and(wiremock::matchers::query_param("language", "en"))
        .respond_with(item_count(9))
        .expect(2)
        .mount(&server)
        .await;

    let aggregator = EnvironmentAggregator::new(settings(&server));
    let first = aggregator
        .collect_environment_data(&delivery_only(), &NoProgress)
        .await
        .unwrap();
    let second = aggregator
        .collect_environment_data(&delivery_only(), &NoProgress)
        .await
        .unwrap();

    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.api_keys_available, second.api_keys_available);
    assert!(second.last_updated >= first.last_updated);
}
