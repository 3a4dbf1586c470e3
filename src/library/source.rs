use async_trait::async_trait;
use reqwest::Client;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{ReaderError, Result};

/// Where data files (`chapters.json`, chapter content, tooltips, subtitles) come from
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch a file by its path relative to the data root
    async fn fetch_text(&self, path: &str) -> Result<String>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Data directory on the local filesystem
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ReaderError::NotFound(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ContentSource for FsSource {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let full_path = self.resolve(path)?;
        debug!("Reading {}", full_path.display());
        Ok(tokio::fs::read_to_string(&full_path).await?)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Data directory served over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        // Url::join drops the last path segment unless it ends with '/'
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { client, base })
    }

    pub fn url_for(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let url = self.url_for(path)?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_source_rejects_escaping_paths() {
        let source = FsSource::new("/srv/data");
        assert!(source.resolve("chapters.json").is_ok());
        assert!(source.resolve("./ch/one.json").is_ok());
        assert!(source.resolve("../secret.json").is_err());
        assert!(source.resolve("/etc/passwd").is_err());
    }

    #[test]
    fn test_http_source_joins_paths() {
        let source = HttpSource::new("https://example.com/site/data", 5).unwrap();
        assert_eq!(
            source.url_for("chapters.json").unwrap().as_str(),
            "https://example.com/site/data/chapters.json"
        );
        assert_eq!(
            source.url_for("/ch/1.json").unwrap().as_str(),
            "https://example.com/site/data/ch/1.json"
        );
    }

    #[tokio::test]
    async fn test_fs_source_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("hello.txt"), "hi").await.unwrap();

        let source = FsSource::new(dir.path());
        assert_eq!(source.fetch_text("hello.txt").await.unwrap(), "hi");
        assert!(source.fetch_text("missing.txt").await.is_err());
    }
}
