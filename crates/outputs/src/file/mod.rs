//! File output
//!
//! Writes every `Create` item to disk and, in `zip` format, packs the
//! group's directory into an archive once the group finishes.
//!
//! # Directory Structure
//!
//! ```text
//! /tmp/gde/
//! ├── MainOrg.@2024-March-7T09:05:01/      # group still being written
//! │   ├── Dashboards/
//! │   │   └── ClusterOverview.json
//! │   └── Datasources/
//! │       └── Prometheus.json
//! └── MainOrg.@2024-March-7T09:04:51.zip   # finished group (zip format)
//! ```

mod archive;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gde_core::{Action, Item, Output, PluginError, Result};
use serde::Deserialize;
use tracing::{debug, info};

pub use archive::zip_dir;

/// Registry name
pub const NAME: &str = "file";

const SAMPLE_CONFIG: &str = r#"  ## Directory the exported files are written to (default /tmp/gde)
  output_dir = "/tmp/gde"
  ## "dir" keeps one directory per group, "zip" packs it when the group
  ## finishes (default zip)
  output_format = "zip"
"#;

/// How finished groups are kept on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Leave the group directory as is
    Dir,
    /// Replace the group directory with `<group>.zip`
    Zip,
}

impl OutputFormat {
    /// Parse the `output_format` setting; `file` is an alias of `dir`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dir" | "file" => Some(Self::Dir),
            "zip" => Some(Self::Zip),
            _ => None,
        }
    }
}

/// File output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    /// Root directory
    /// Default: /tmp/gde
    pub output_dir: PathBuf,

    /// `dir`, `file` or `zip`
    /// Default: zip
    pub output_format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("/tmp/gde"),
            output_format: "zip".to_string(),
        }
    }
}

/// File output plugin
#[derive(Debug)]
pub struct FileOutput {
    settings: FileSettings,
    format: Option<OutputFormat>,
}

impl FileOutput {
    /// Create the output; the format is checked on `connect`
    pub fn new(settings: FileSettings) -> Self {
        Self {
            settings,
            format: None,
        }
    }

    /// Registry constructor
    pub fn create(table: &toml::Table) -> Result<Box<dyn Output>> {
        let settings: FileSettings = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| PluginError::config(NAME, e.message()))?;
        Ok(Box::new(Self::new(settings)))
    }

    /// Directory holding one group's files
    pub fn group_dir(&self, group: &str) -> Result<PathBuf> {
        Ok(self.settings.output_dir.join(path_component(group, "group")?))
    }

    /// Path a `Create` item is written to
    ///
    /// `<output_dir>/<group>/<Kind>s/<TitleWithoutSpaces>.json`
    pub fn item_path(&self, item: &Item) -> Result<PathBuf> {
        let kind = item
            .kind
            .ok_or_else(|| PluginError::write("create item without a kind"))?;
        Ok(self
            .group_dir(&item.group)?
            .join(format!("{}s", kind))
            .join(format!("{}.json", path_component(&item.title, "title")?)))
    }

    /// Path a blob item is written to
    pub fn blob_path(&self, item: &Item) -> Result<PathBuf> {
        Ok(self
            .settings
            .output_dir
            .join(format!("{}.json", path_component(&item.title, "title")?)))
    }

    /// Stage a `Create` or blob item on disk
    pub(crate) async fn store(&self, item: &Item) -> Result<PathBuf> {
        let path = match item.action {
            Some(Action::Create) => self.item_path(item)?,
            _ => self.blob_path(item)?,
        };
        Self::write_file(&path, &item.content).await?;
        Ok(path)
    }

    async fn write_file(path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        debug!(path = %path.display(), bytes = content.len(), "wrote file");
        Ok(())
    }

    async fn finish(&self, group: &str, format: OutputFormat) -> Result<()> {
        let source = self.group_dir(group)?;
        if format == OutputFormat::Dir {
            return Ok(());
        }

        if !tokio::fs::try_exists(&source).await? {
            debug!(group, "nothing written for group, skipping archive");
            return Ok(());
        }

        let (target, entries) = archive_group(&source).await?;
        tokio::fs::remove_dir_all(&source).await?;
        info!(archive = %target.display(), entries, "group archived");
        Ok(())
    }
}

/// Zip a group directory into `<dir>.zip` beside it on the blocking pool
///
/// Returns the archive path and the number of files packed.
pub(crate) async fn archive_group(source: &Path) -> Result<(PathBuf, usize)> {
    let mut target = source.to_path_buf().into_os_string();
    target.push(".zip");
    let target = PathBuf::from(target);

    let entries = {
        let (source, target) = (source.to_path_buf(), target.clone());
        tokio::task::spawn_blocking(move || zip_dir(&source, &target))
            .await
            .map_err(|e| PluginError::write(format!("archive task failed: {}", e)))??
    };
    Ok((target, entries))
}

#[async_trait]
impl Output for FileOutput {
    fn description(&self) -> &'static str {
        "Write exported documents to a directory, optionally zipped per group"
    }

    fn sample_config(&self) -> &'static str {
        SAMPLE_CONFIG
    }

    async fn connect(&mut self) -> Result<()> {
        let format = OutputFormat::parse(&self.settings.output_format).ok_or_else(|| {
            PluginError::config(
                NAME,
                format!(
                    "output_format must be 'dir', 'file' or 'zip', got '{}'",
                    self.settings.output_format
                ),
            )
        })?;

        tokio::fs::create_dir_all(&self.settings.output_dir)
            .await
            .map_err(|e| {
                PluginError::Connect(format!(
                    "cannot create {}: {}",
                    self.settings.output_dir.display(),
                    e
                ))
            })?;

        self.format = Some(format);
        Ok(())
    }

    async fn write(&self, item: &Item) -> Result<()> {
        let format = self
            .format
            .ok_or_else(|| PluginError::other("file output used before connect"))?;

        match item.action {
            Some(Action::Finish) => self.finish(&item.group, format).await,
            _ => self.store(item).await.map(|_| ()),
        }
    }
}

/// File name component for a title or group
///
/// Spaces are removed and path separators replaced so a title can never
/// leave its directory.
pub fn file_stem(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ')
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect()
}

/// [`file_stem`] of a group or title, refusing names that would resolve
/// to the output directory itself or its parent
pub fn path_component(name: &str, what: &str) -> Result<String> {
    let stem = file_stem(name);
    if matches!(stem.as_str(), "" | "." | "..") {
        return Err(PluginError::write(format!(
            "{} '{}' is not a usable file name",
            what, name
        )));
    }
    Ok(stem)
}
