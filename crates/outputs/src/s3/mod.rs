//! S3 output
//!
//! Stages every `Create` item on local disk the way the file output does,
//! then uploads the group when it finishes: one `<group>.zip` object in
//! `zip` format, or one object per staged file in `dir` format. Staged
//! files are removed after a successful upload.
//!
//! # Object Keys
//!
//! ```text
//! <bucket_prefix>/MainOrg.@2024-March-7T09:05:01.zip                      # zip
//! <bucket_prefix>/MainOrg.@2024-March-7T09:05:01/Dashboards/Home.json     # dir
//! <bucket_prefix>/snapshot.json                                           # blob
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{
    BehaviorVersion, Credentials, Region, RequestChecksumCalculation, ResponseChecksumValidation,
};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use gde_core::{Action, Item, Output, PluginError, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::file::{FileOutput, FileSettings, OutputFormat, archive_group, path_component};

/// Registry name
pub const NAME: &str = "s3";

const SAMPLE_CONFIG: &str = r#"  ## Bucket receiving the exported documents (required)
  bucket = "<bucket-name>"
  ## Static credentials (required)
  access_key = "$ACCESS_KEY"
  secret_key = "$SECRET_KEY"
  ## Bucket region (default us-east-1)
  region = "us-east-1"
  ## Prefix of every object key
  bucket_prefix = "gde"
  ## "zip" uploads one archive per group, "dir" one object per document
  ## (default zip)
  output_format = "zip"
  ## S3-compatible endpoint, ie MinIO; switches to path-style addressing
  # endpoint = "http://localhost:9000"
  ## Local directory groups are staged in until they finish
  # staging_dir = "/tmp/gde-s3"
"#;

/// S3 output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct S3Settings {
    /// Target bucket
    pub bucket: String,

    /// Access key id
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Bucket region
    /// Default: us-east-1
    pub region: String,

    /// Key prefix, without trailing slash
    #[serde(alias = "bucketPrefix")]
    pub bucket_prefix: String,

    /// `dir`, `file` or `zip`
    /// Default: zip
    pub output_format: String,

    /// Custom endpoint URL for S3-compatible stores
    pub endpoint: Option<String>,

    /// Local staging directory
    /// Default: /tmp/gde-s3
    pub staging_dir: PathBuf,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            region: "us-east-1".to_string(),
            bucket_prefix: String::new(),
            output_format: "zip".to_string(),
            endpoint: None,
            staging_dir: PathBuf::from("/tmp/gde-s3"),
        }
    }
}

struct Connection {
    client: Client,
    format: OutputFormat,
}

/// S3 output plugin
pub struct S3Output {
    settings: S3Settings,
    staging: FileOutput,
    connection: Option<Connection>,
}

impl S3Output {
    /// Create the output; settings are checked on `connect`
    pub fn new(settings: S3Settings) -> Self {
        let staging = FileOutput::new(FileSettings {
            output_dir: settings.staging_dir.clone(),
            output_format: "dir".to_string(),
        });
        Self {
            settings,
            staging,
            connection: None,
        }
    }

    /// Registry constructor
    pub fn create(table: &toml::Table) -> Result<Box<dyn Output>> {
        let settings: S3Settings = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| PluginError::config(NAME, e.message()))?;
        Ok(Box::new(Self::new(settings)))
    }

    fn check(&self) -> Result<OutputFormat> {
        let settings = &self.settings;
        let format = OutputFormat::parse(&settings.output_format).ok_or_else(|| {
            PluginError::config(
                NAME,
                format!(
                    "output_format must be 'dir', 'file' or 'zip', got '{}'",
                    settings.output_format
                ),
            )
        })?;
        if settings.bucket.trim().is_empty() {
            return Err(PluginError::config(NAME, "bucket is required"));
        }
        if settings.access_key.is_empty() || settings.secret_key.is_empty() {
            return Err(PluginError::config(NAME, "access_key and secret_key are required"));
        }
        Ok(format)
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| PluginError::other("s3 output used before connect"))
    }

    /// Object key for a path relative to the staging directory
    pub fn object_key(&self, relative: &Path) -> String {
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let prefix = self.settings.bucket_prefix.trim_matches('/');
        if prefix.is_empty() {
            relative
        } else {
            format!("{}/{}", prefix, relative)
        }
    }

    async fn upload(&self, client: &Client, path: &Path) -> Result<()> {
        let relative = path
            .strip_prefix(&self.settings.staging_dir)
            .map_err(|_| PluginError::write(format!("{} is not staged", path.display())))?;
        let key = self.object_key(relative);
        let body = tokio::fs::read(path).await?;

        debug!(bucket = %self.settings.bucket, key = %key, bytes = body.len(), "uploading");
        self.put(client, &key, body).await
    }

    async fn put(&self, client: &Client, key: &str, body: Vec<u8>) -> Result<()> {
        client
            .put_object()
            .bucket(&self.settings.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                PluginError::write(format!(
                    "failed to upload {} to bucket {}: {}",
                    key,
                    self.settings.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    async fn finish(&self, group: &str) -> Result<()> {
        let connection = self.connection()?;
        let source = self.staging.group_dir(group)?;
        if !tokio::fs::try_exists(&source).await? {
            debug!(group, "nothing staged for group, skipping upload");
            return Ok(());
        }

        match connection.format {
            OutputFormat::Zip => {
                let (archive, entries) = archive_group(&source).await?;
                let uploaded = self.upload(&connection.client, &archive).await;
                if let Err(e) = tokio::fs::remove_file(&archive).await {
                    warn!(archive = %archive.display(), error = %e, "unable to remove staged archive");
                }
                uploaded?;
                info!(bucket = %self.settings.bucket, group, entries, "group archive uploaded");
            }
            OutputFormat::Dir => {
                let files = staged_files(&source).await?;
                for file in &files {
                    self.upload(&connection.client, file).await?;
                }
                info!(bucket = %self.settings.bucket, group, files = files.len(), "group uploaded");
            }
        }

        tokio::fs::remove_dir_all(&source).await?;
        Ok(())
    }
}

#[async_trait]
impl Output for S3Output {
    fn description(&self) -> &'static str {
        "Upload exported documents to an S3 bucket, optionally zipped per group"
    }

    fn sample_config(&self) -> &'static str {
        SAMPLE_CONFIG
    }

    async fn connect(&mut self) -> Result<()> {
        let format = self.check()?;
        self.staging.connect().await?;

        let client = client(&self.settings);
        client
            .list_objects_v2()
            .bucket(&self.settings.bucket)
            .max_keys(1)
            .send()
            .await
            .map_err(|e| {
                PluginError::Connect(format!(
                    "unable to list items in bucket {}: {}",
                    self.settings.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;

        info!(bucket = %self.settings.bucket, region = %self.settings.region, "bucket reachable");
        self.connection = Some(Connection { client, format });
        Ok(())
    }

    async fn write(&self, item: &Item) -> Result<()> {
        let connection = self.connection()?;

        match item.action {
            Some(Action::Create) => self.staging.store(item).await.map(|_| ()),
            Some(Action::Finish) => self.finish(&item.group).await,
            None => {
                let name = format!("{}.json", path_component(&item.title, "title")?);
                let key = self.object_key(Path::new(&name));
                self.put(&connection.client, &key, item.content.to_vec()).await
            }
        }
    }
}

/// Client for the configured region, credentials and endpoint
fn client(settings: &S3Settings) -> Client {
    let credentials = Credentials::new(
        settings.access_key.clone(),
        settings.secret_key.clone(),
        None,
        None,
        "gde",
    );
    let mut config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()))
        .credentials_provider(credentials)
        .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
        .response_checksum_validation(ResponseChecksumValidation::WhenRequired);
    if let Some(endpoint) = &settings.endpoint {
        config = config.endpoint_url(endpoint.clone()).force_path_style(true);
    }
    Client::from_conf(config.build())
}

/// Every regular file below `dir`, sorted
async fn staged_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || walk(&dir))
        .await
        .map_err(|e| PluginError::write(format!("listing task failed: {}", e)))?
        .map_err(PluginError::from)
}

fn walk(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if entry.file_type()?.is_dir() {
            files.extend(walk(&entry.path())?);
        } else {
            files.push(entry.path());
        }
    }
    Ok(files)
}
