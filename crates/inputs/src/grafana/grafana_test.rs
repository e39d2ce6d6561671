//! Tests for the Grafana input against an in-process server

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use chrono::TimeZone;
use gde_core::{Accumulator, Action, Input, Item, PluginError, ValueKind};
use parking_lot::Mutex;
use serde_json::{Value, json};

use super::{Grafana, GrafanaSettings, group_name};

const TOKEN: &str = "test-token";

// =============================================================================
// Helpers
// =============================================================================

#[derive(Default)]
struct CollectingAccumulator {
    items: Mutex<Vec<Item>>,
    errors: Mutex<Vec<String>>,
}

#[async_trait]
impl Accumulator for CollectingAccumulator {
    async fn add_output(&self, item: Item) {
        self.items.lock().push(item);
    }

    fn add_error(&self, err: PluginError) {
        self.errors.lock().push(err.to_string());
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

async fn org(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({"id": 1, "name": "Main Org."})))
}

async fn datasources(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!([
        {"id": 1, "name": "Prometheus", "type": "prometheus", "url": "http://prom:9090"},
        {"id": 2, "name": "Loki", "type": "loki", "url": "http://loki:3100"}
    ])))
}

async fn search(Query(params): Query<Vec<(String, String)>>) -> Json<Value> {
    assert!(params.contains(&("type".to_string(), "dash-db".to_string())));
    Json(json!([
        {"id": 10, "uid": "home", "title": "Home", "uri": "db/home", "type": "dash-db"},
        {"id": 11, "uid": "k8s", "title": "Cluster Overview", "uri": "", "type": "dash-db"}
    ]))
}

async fn home() -> Json<Value> {
    Json(json!({
        "meta": {"slug": "home", "canSave": true},
        "dashboard": {"id": 10, "uid": "home", "version": 3, "title": "Home", "panels": []}
    }))
}

async fn cluster() -> Json<Value> {
    Json(json!({
        "meta": {"slug": "cluster-overview"},
        "dashboard": {"id": 11, "uid": "k8s", "version": 9, "panels": [{"type": "graph"}]}
    }))
}

async fn serve() -> SocketAddr {
    let app = Router::new()
        .route("/api/org", get(org))
        .route("/api/datasources", get(datasources))
        .route("/api/search", get(search))
        .route("/api/dashboards/db/home", get(home))
        .route("/api/dashboards/uid/k8s", get(cluster));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn grafana(addr: SocketAddr, settings: GrafanaSettings) -> Grafana {
    Grafana::new(GrafanaSettings {
        host: format!("http://{}", addr),
        authorization: TOKEN.to_string(),
        ..settings
    })
    .unwrap()
}

fn content(item: &Item) -> Value {
    serde_json::from_slice(&item.content).unwrap()
}

// =============================================================================
// Settings
// =============================================================================

#[test]
fn test_defaults_from_empty_table() {
    let input = Grafana::create(&toml::Table::new()).unwrap();
    assert!(input.sample_config().contains("host"));
    assert!(!input.description().is_empty());
}

#[test]
fn test_settings_from_table() {
    let table: toml::Table = toml::from_str(
        r#"
host = "http://grafana:3000"
authorization = "admin:admin"
meta = false
request_timeout = "5s"
"#,
    )
    .unwrap();

    let settings: GrafanaSettings = toml::Value::Table(table).try_into().unwrap();
    assert_eq!(settings.host, "http://grafana:3000");
    assert!(!settings.meta);
    assert!(settings.dashboard);
    assert!(settings.datasource);
    assert_eq!(settings.request_timeout, std::time::Duration::from_secs(5));
}

#[test]
fn test_unknown_setting_rejected() {
    let table: toml::Table = toml::from_str("hots = \"typo\"").unwrap();
    let err = Grafana::create(&table).err().unwrap();
    assert!(err.to_string().contains("grafana"));
}

#[test]
fn test_group_name() {
    let at = chrono::Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
    assert_eq!(group_name("Main Org.", at), "MainOrg.@2024-March-7T09:05:01");
}

// =============================================================================
// Process
// =============================================================================

#[tokio::test]
async fn test_exports_datasources_dashboards_then_finish() {
    let addr = serve().await;
    let input = grafana(addr, GrafanaSettings::default());
    let acc = CollectingAccumulator::default();

    input.process(&acc).await.unwrap();

    let items = acc.items.lock().clone();
    assert_eq!(items.len(), 5);

    let group = items[0].group.clone();
    assert!(group.starts_with("MainOrg.@"));
    assert!(items.iter().all(|i| i.group == group));

    assert_eq!(items[0].kind, Some(ValueKind::Datasource));
    assert_eq!(items[0].title, "Prometheus");
    assert_eq!(items[1].title, "Loki");
    assert_eq!(content(&items[1])["type"], "loki");

    assert_eq!(items[2].kind, Some(ValueKind::Dashboard));
    assert_eq!(items[2].title, "Home");
    assert_eq!(items[3].title, "Cluster Overview");

    assert_eq!(items[4].action, Some(Action::Finish));
    assert!(items.iter().all(Item::is_deliverable));
}

#[tokio::test]
async fn test_meta_keeps_document_and_strips_ids() {
    let addr = serve().await;
    let input = grafana(addr, GrafanaSettings::default());
    let acc = CollectingAccumulator::default();

    input.process(&acc).await.unwrap();

    let items = acc.items.lock().clone();
    let home = content(&items[2]);
    assert_eq!(home["meta"]["slug"], "home");
    assert_eq!(home["dashboard"]["title"], "Home");
    assert!(home["dashboard"].get("id").is_none());
    assert!(home["dashboard"].get("uid").is_none());
    assert!(home["dashboard"].get("version").is_none());
}

#[tokio::test]
async fn test_without_meta_emits_model_only() {
    let addr = serve().await;
    let input = grafana(
        addr,
        GrafanaSettings {
            meta: false,
            datasource: false,
            ..Default::default()
        },
    );
    let acc = CollectingAccumulator::default();

    input.process(&acc).await.unwrap();

    let items = acc.items.lock().clone();
    assert_eq!(items.len(), 3);
    let home = content(&items[0]);
    assert_eq!(home["title"], "Home");
    assert!(home.get("meta").is_none());
    assert!(home.get("uid").is_none());
}

#[tokio::test]
async fn test_nothing_enabled_emits_nothing() {
    let input = Grafana::new(GrafanaSettings {
        dashboard: false,
        datasource: false,
        ..Default::default()
    })
    .unwrap();
    let acc = CollectingAccumulator::default();

    input.process(&acc).await.unwrap();
    assert!(acc.items.lock().is_empty());
}

#[tokio::test]
async fn test_missing_host_is_an_error() {
    let input = Grafana::new(GrafanaSettings::default()).unwrap();
    let acc = CollectingAccumulator::default();

    let err = input.process(&acc).await.unwrap_err();
    assert!(err.to_string().contains("host is required"));
}

#[tokio::test]
async fn test_bad_credentials_abort_without_items() {
    let addr = serve().await;
    let input = Grafana::new(GrafanaSettings {
        host: format!("http://{}", addr),
        authorization: "wrong".to_string(),
        ..Default::default()
    })
    .unwrap();
    let acc = CollectingAccumulator::default();

    let err = input.process(&acc).await.unwrap_err();
    assert!(matches!(err, PluginError::Request(_)));
    assert!(err.to_string().contains("authentication failed"));
    assert!(acc.items.lock().is_empty());
    assert!(acc.errors.lock().is_empty());
}
