//! Access to a data root, local or remote.
//!
//! A data root has a fixed layout:
//!
//! ```text
//! data/versions.json
//! data/<version>/manifest.json
//! data/<version>/tests/<path>/<filename>
//! pyspec/<version>/pyspec.json
//! ```
//!
//! Local roots read via tokio::fs; remote roots fetch the same paths over
//! HTTP. Binary fixture files come back as bytes, everything else as text.

use eyre::{Result, WrapErr};
use forklore_core::{RawSpecData, TestManifest, VersionList};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum DataStore {
    Local(PathBuf),
    Remote {
        base: String,
        client: reqwest::Client,
    },
}

impl DataStore {
    pub fn local(root: impl Into<PathBuf>) -> Self {
        DataStore::Local(root.into())
    }

    pub fn remote(base: impl Into<String>) -> Self {
        let base = base.into();
        DataStore::Remote {
            base: base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DataStore::Local(root) => root.display().to_string(),
            DataStore::Remote { base, .. } => base.clone(),
        }
    }

    async fn read_bytes(&self, rel: &str) -> Result<Vec<u8>> {
        match self {
            DataStore::Local(root) => {
                let path = root.join(rel);
                tokio::fs::read(&path)
                    .await
                    .wrap_err_with(|| format!("Failed to read {}", path.display()))
            }
            DataStore::Remote { base, client } => {
                let url = format!("{base}/{rel}");
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .wrap_err_with(|| format!("Failed to fetch {url}"))?
                    .error_for_status()
                    .wrap_err_with(|| format!("Failed to fetch {url}"))?;
                Ok(response.bytes().await?.to_vec())
            }
        }
    }

    async fn read_text(&self, rel: &str) -> Result<String> {
        let bytes = self.read_bytes(rel).await?;
        String::from_utf8(bytes).wrap_err_with(|| format!("{rel} is not valid UTF-8"))
    }

    /// Load and parse `data/versions.json`.
    pub async fn versions(&self) -> Result<VersionList> {
        let text = self.read_text("data/versions.json").await?;
        serde_json::from_str(&text).wrap_err("Failed to parse versions.json")
    }

    /// Load and parse the raw spec data for one version.
    pub async fn spec_data(&self, version: &str) -> Result<RawSpecData> {
        let rel = format!("pyspec/{version}/pyspec.json");
        let text = self.read_text(&rel).await?;
        serde_json::from_str(&text).wrap_err_with(|| format!("Failed to parse {rel}"))
    }

    /// Load and parse the test manifest for one version.
    pub async fn manifest(&self, version: &str) -> Result<TestManifest> {
        let rel = format!("data/{version}/manifest.json");
        let text = self.read_text(&rel).await?;
        serde_json::from_str(&text).wrap_err_with(|| format!("Failed to parse {rel}"))
    }

    /// Fetch one test fixture file as raw bytes.
    pub async fn test_file(&self, version: &str, case_path: &str, name: &str) -> Result<Vec<u8>> {
        self.read_bytes(&format!("data/{version}/tests/{case_path}/{name}"))
            .await
    }
}
