#![allow(dead_code)]

use serde_json::{
    json,
    Value,
};
use std::sync::Mutex;
use url::Url;
use usage_insights_collector::{
    CollectionEvent,
    Settings,
};
use usage_insights_config::ApiEndpoints;
use wiremock::{
    matchers::{
        method,
        path,
        query_param,
        query_param_is_missing,
    },
    Match,
    Mock,
    MockServer,
    Request,
    ResponseTemplate,
};

pub const ENV_ID: &str = "8d3f1c2a-5b6e-4f70-9a81-2c3d4e5f6a7b";
pub const OTHER_ENV_ID: &str = "1a2b3c4d-5e6f-4a7b-8c9d-0e1f2a3b4c5d";
pub const SUB_ID: &str = "0f1e2d3c-4b5a-4697-8877-665544332211";

pub const DELIVERY_KEY: &str = "delivery-key";
pub const MANAGEMENT_KEY: &str = "management-key";
pub const SUBSCRIPTION_KEY: &str = "subscription-key";

pub fn settings(server: &MockServer) -> Settings {
    let base = Url::parse(&server.uri()).unwrap();
    Settings::with_endpoints(ApiEndpoints::single_host(&base).unwrap())
}

/// Matches requests without the given header.
pub struct HeaderMissing(pub &'static str);

impl Match for HeaderMissing {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key(self.0)
    }
}

/// Records every progress event.
#[derive(Default)]
pub struct Events(Mutex<Vec<CollectionEvent>>);

impl Events {
    pub fn listener(&self) -> impl Fn(&CollectionEvent) + Send + Sync + '_ {
        move |event: &CollectionEvent| self.0.lock().unwrap().push(event.clone())
    }

    pub fn take(&self) -> Vec<CollectionEvent> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

pub fn ok_json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

pub fn error_json(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "message": message, "error_code": 0 }))
}

/// Both probe phases succeed.
pub async fn mount_delivery_access(server: &MockServer, environment_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/deliver/{environment_id}/items")))
        .respond_with(ok_json(json!({ "items": [], "modular_content": {}, "pagination": {} })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/preview/{environment_id}/items")))
        .and(query_param_is_missing("includeTotalCount"))
        .respond_with(ok_json(json!({ "items": [], "modular_content": {}, "pagination": {} })))
        .mount(server)
        .await;
}

pub async fn mount_types(server: &MockServer, environment_id: &str, count: usize) {
    let types: Vec<Value> = (0..count)
        .map(|i| json!({ "system": { "codename": format!("type_{i}") }, "elements": {} }))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/preview/{environment_id}/types")))
        .respond_with(ok_json(json!({ "types": types, "pagination": { "skip": 0, "limit": 1000 } })))
        .mount(server)
        .await;
}

pub async fn mount_languages(server: &MockServer, environment_id: &str, codenames: &[&str]) {
    let languages: Vec<Value> = codenames
        .iter()
        .map(|codename| json!({ "system": { "codename": codename, "name": codename } }))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/preview/{environment_id}/languages")))
        .respond_with(ok_json(json!({ "languages": languages, "pagination": {} })))
        .mount(server)
        .await;
}

pub async fn mount_item_count(server: &MockServer, environment_id: &str, language: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/preview/{environment_id}/items")))
        .and(query_param("includeTotalCount", "true"))
        .and(query_param("language", language))
        .and(query_param("system.language", language))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

pub fn item_count(total: u64) -> ResponseTemplate {
    ok_json(json!({
        "items": [],
        "modular_content": {},
        "pagination": { "skip": 0, "limit": 1, "count": 1, "total_count": total, "next_page": "" }
    }))
}

/// Collections, roles and spaces of an environment.
pub async fn mount_management_extras(server: &MockServer, environment_id: &str, roles: &[&str]) {
    let roles: Vec<Value> = roles.iter().map(|codename| json!({ "codename": codename })).collect();
    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{environment_id}/collections")))
        .respond_with(ok_json(json!({ "collections": [{ "codename": "default" }, { "codename": "marketing" }] })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{environment_id}/roles")))
        .respond_with(ok_json(json!({ "roles": roles })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{environment_id}/spaces")))
        .respond_with(ok_json(json!([{ "codename": "web" }, { "codename": "app" }, { "codename": "kiosk" }])))
        .mount(server)
        .await;
}

pub fn user(email: &str, environment_id: &str, active: bool) -> Value {
    json!({
        "email": email,
        "projects": [{ "id": "project", "environments": [{ "id": environment_id, "is_user_active": active }] }]
    })
}
