//! Grafana input
//!
//! Exports the datasources and dashboards of the organization the
//! credentials belong to. Every invocation produces one group named
//! `<OrgName>@<timestamp>`: a `Create` item per datasource and dashboard,
//! then a `Finish` item for the group.

mod client;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use gde_core::{Accumulator, Input, Item, PluginError, Result, ValueKind};
use serde::Deserialize;
use tracing::{debug, error};

pub use client::{Auth, DashboardDocument, GrafanaClient, GrafanaError, Org, SearchHit};

/// Registry name
pub const NAME: &str = "grafana";

/// Search type for dashboards
const SEARCH_DASHBOARDS: &str = "dash-db";

const USER_AGENT: &str = concat!("gde/", env!("CARGO_PKG_VERSION"));

const SAMPLE_CONFIG: &str = r#"  ## Grafana base URL (required)
  host = "http://localhost:3000"
  ## "user:pass" for basic auth, otherwise an API key or service account token
  authorization = "Bearer <token>"
  ## Export dashboards (default true)
  dashboard = true
  ## Export dashboards with their server metadata (default true)
  meta = true
  ## Export datasources (default true)
  datasource = true
  ## HTTP request timeout (default 30s)
  # request_timeout = "30s"
"#;

/// Grafana input settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrafanaSettings {
    /// Base URL of the Grafana server
    pub host: String,

    /// `user:pass` or a bearer token
    pub authorization: String,

    /// Export dashboards
    /// Default: true
    pub dashboard: bool,

    /// Keep the `meta` section next to each dashboard model
    /// Default: true
    pub meta: bool,

    /// Export datasources
    /// Default: true
    pub datasource: bool,

    /// HTTP request timeout
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for GrafanaSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            authorization: String::new(),
            dashboard: true,
            meta: true,
            datasource: true,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Grafana input plugin
pub struct Grafana {
    settings: GrafanaSettings,
    client: GrafanaClient,
}

impl Grafana {
    /// Create the input from its settings
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(settings: GrafanaSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| PluginError::config(NAME, format!("HTTP client: {}", e)))?;

        let client = GrafanaClient::new(http, &settings.host, Auth::parse(&settings.authorization));
        Ok(Self { settings, client })
    }

    /// Registry constructor
    pub fn create(table: &toml::Table) -> Result<Box<dyn Input>> {
        let settings: GrafanaSettings = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| PluginError::config(NAME, e.message()))?;
        Ok(Box::new(Self::new(settings)?))
    }

    async fn export_datasources(&self, acc: &dyn Accumulator, group: &str) -> Result<()> {
        let datasources = self.client.datasources().await?;
        debug!(count = datasources.len(), "fetched datasources");

        for datasource in datasources {
            let title = datasource
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let content = serde_json::to_vec(&datasource)?;
            acc.add_output(Item::create(group, ValueKind::Datasource, title, content))
                .await;
        }
        Ok(())
    }

    async fn export_dashboards(&self, acc: &dyn Accumulator, group: &str) -> Result<()> {
        let hits = self.client.search(SEARCH_DASHBOARDS, "").await?;
        debug!(count = hits.len(), "found dashboards");

        for hit in hits {
            let mut document = self.client.dashboard(&hit.dashboard_path()).await?;
            document.strip_instance_keys();

            let title = document.title().unwrap_or(&hit.title).to_string();
            let content = if self.settings.meta {
                serde_json::to_vec(&document)?
            } else {
                serde_json::to_vec(&document.dashboard)?
            };
            acc.add_output(Item::create(group, ValueKind::Dashboard, title, content))
                .await;
        }
        Ok(())
    }
}

#[async_trait]
impl Input for Grafana {
    fn description(&self) -> &'static str {
        "Export dashboards and datasources from a Grafana server"
    }

    fn sample_config(&self) -> &'static str {
        SAMPLE_CONFIG
    }

    async fn process(&self, acc: &dyn Accumulator) -> Result<()> {
        if !self.settings.dashboard && !self.settings.datasource {
            error!(
                input = NAME,
                "nothing to export, at least one of dashboard and datasource must be true"
            );
            return Ok(());
        }
        if self.settings.host.trim().is_empty() {
            return Err(PluginError::config(NAME, "host is required"));
        }

        let org = self.client.current_org().await?;
        let group = group_name(&org.name, Local::now());
        debug!(org = %org.name, group = %group, "exporting");

        if self.settings.datasource {
            self.export_datasources(acc, &group).await?;
        }
        if self.settings.dashboard {
            self.export_dashboards(acc, &group).await?;
        }

        acc.add_output(Item::finish(group)).await;
        Ok(())
    }
}

/// `<OrgNameWithoutSpaces>@<YYYY-MonthName-DTHH:MM:SS>`
pub fn group_name(org: &str, at: DateTime<Local>) -> String {
    format!("{}@{}", org.replace(' ', ""), at.format("%Y-%B-%-dT%H:%M:%S"))
}

#[cfg(test)]
#[path = "grafana_test.rs"]
mod grafana_test;
