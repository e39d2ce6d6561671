//! Stdout output - one line per item
//!
//! Meant for trying a configuration out, not for production delivery.
//!
//! # Example Output
//!
//! ```text
//! create MainOrg.@2024-March-7T09:05:01 Datasource "Prometheus" (412 bytes)
//! create MainOrg.@2024-March-7T09:05:01 Dashboard "Home" (2048 bytes)
//! finish MainOrg.@2024-March-7T09:05:01 (0 bytes)
//! ```

use std::io::Write;

use async_trait::async_trait;
use gde_core::{Item, Output, PluginError, Result};
use parking_lot::Mutex;
use serde::Deserialize;

/// Registry name
pub const NAME: &str = "stdout";

const SAMPLE_CONFIG: &str = r#"  ## Print each item's content after its summary line (default false)
  content = false
"#;

/// Stdout output settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StdoutSettings {
    /// Print item content below the summary line
    pub content: bool,
}

/// Stdout output plugin
pub struct StdoutOutput {
    settings: StdoutSettings,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl StdoutOutput {
    /// Create the output writing to the process's stdout
    pub fn new(settings: StdoutSettings) -> Self {
        Self::with_writer(settings, Box::new(std::io::stdout()))
    }

    /// Create the output writing to `writer`
    pub fn with_writer(settings: StdoutSettings, writer: Box<dyn Write + Send>) -> Self {
        Self {
            settings,
            writer: Mutex::new(writer),
        }
    }

    /// Registry constructor
    pub fn create(table: &toml::Table) -> Result<Box<dyn Output>> {
        let settings: StdoutSettings = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| PluginError::config(NAME, e.message()))?;
        Ok(Box::new(Self::new(settings)))
    }
}

/// Text printed for one item
pub fn render(item: &Item, with_content: bool) -> String {
    let mut out = item.to_string();
    out.push('\n');
    if with_content && !item.content.is_empty() {
        out.push_str(&String::from_utf8_lossy(&item.content));
        out.push('\n');
    }
    out
}

#[async_trait]
impl Output for StdoutOutput {
    fn description(&self) -> &'static str {
        "Print a summary line per item to stdout"
    }

    fn sample_config(&self) -> &'static str {
        SAMPLE_CONFIG
    }

    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn write(&self, item: &Item) -> Result<()> {
        let text = render(item, self.settings.content);
        let mut writer = self.writer.lock();
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
