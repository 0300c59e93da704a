//! AUR access: RPC lookups plus recipe and snapshot downloads.

mod types;

pub use types::RemoteRecord;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use crate::error::Error;
use crate::http::HttpClient;
use types::Envelope;

pub const DEFAULT_AUR_URL: &str = "https://aur.archlinux.org";

/// Message the RPC interface uses for an empty search.
const NO_RESULTS: &str = "No results found";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LookupService: Send + Sync {
    /// Point lookup. `None` when the AUR does not know `name`.
    async fn info(&self, name: &str) -> Result<Option<RemoteRecord>>;

    /// Substring search over names and descriptions.
    async fn search(&self, keywords: &str) -> Result<Vec<RemoteRecord>>;

    /// The raw PKGBUILD.
    async fn recipe(&self, name: &str) -> Result<Vec<u8>>;

    /// The gzip-compressed source snapshot.
    async fn source_archive(&self, name: &str) -> Result<Vec<u8>>;
}

pub struct AurClient {
    http: HttpClient,
    base_url: String,
}

impl AurClient {
    pub fn new(http: HttpClient, base_url: Option<String>) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_AUR_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self { http, base_url }
    }

    async fn rpc(&self, kind: &str, arg: &str) -> Result<Envelope> {
        let url = format!("{}/rpc.php", self.base_url);
        self.http
            .get_json_with_query(&url, &[("type", kind), ("arg", arg)])
            .await
            .map_err(|e| Error::network(format!("AUR {} request", kind), arg, e).into())
    }
}

#[async_trait]
impl LookupService for AurClient {
    #[tracing::instrument(skip(self))]
    async fn info(&self, name: &str) -> Result<Option<RemoteRecord>> {
        let envelope = self.rpc("info", name).await?;
        if let Some(message) = envelope.error_message() {
            debug!("AUR has no {}: {}", name, message);
            return Ok(None);
        }

        let records = envelope
            .into_records()
            .with_context(|| format!("Malformed AUR info for {}", name))?;
        Ok(records.into_iter().next())
    }

    #[tracing::instrument(skip(self))]
    async fn search(&self, keywords: &str) -> Result<Vec<RemoteRecord>> {
        let envelope = self.rpc("search", keywords).await?;
        match envelope.error_message() {
            Some(message) if message == NO_RESULTS => return Ok(Vec::new()),
            Some(message) => return Err(Error::Remote(message).into()),
            None => {}
        }

        Ok(envelope
            .into_records()
            .context("Malformed AUR search results")?)
    }

    #[tracing::instrument(skip(self))]
    async fn recipe(&self, name: &str) -> Result<Vec<u8>> {
        let url = format!("{}/packages/{}/PKGBUILD", self.base_url, name);
        self.http
            .get_bytes(&url)
            .await
            .map_err(|e| Error::network("PKGBUILD download", name, e).into())
    }

    #[tracing::instrument(skip(self))]
    async fn source_archive(&self, name: &str) -> Result<Vec<u8>> {
        let url = format!("{}/packages/{}/{}.tar.gz", self.base_url, name, name);
        self.http
            .get_bytes(&url)
            .await
            .map_err(|e| Error::network("Source download", name, e).into())
    }
}
