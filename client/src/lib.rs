//! Query-side access to published partitions over HTTP.
//!
//! Shards are fetched lazily from `{base}/assets/{index}/{shard}.json` and
//! memoized in a small LRU. A shard the server does not have (404) is
//! remembered as absent; every other failure is surfaced and never cached.

use lru::LruCache;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use sitedex_core::paths::{ASSETS_URL_PREFIX, ASSET_FULL_TEXT, ASSET_PROPERTY_REFERENCES, ASSET_PROPERTY_VALUES};
use sitedex_core::query::{query_terms, union_documents};
use sitedex_core::{decode_shard, reference_key, shard_id, DocId, References, TermPostings, ValueCounts};
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Shard ids are two hex digits (256 shards); this holds each of them about 2.6 times over.
pub const SHARD_CACHE_CAPACITY: usize = 26 * 26;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error(transparent)]
    Partition(#[from] sitedex_core::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Clone)]
enum CachedShard {
    Present(Arc<str>),
    Absent,
}

/// Raw shard reads against one partition directory served over HTTP.
pub struct PartitionHttpBackend {
    client: Client,
    base_uri: String,
    cache: Mutex<LruCache<String, CachedShard>>,
}

impl PartitionHttpBackend {
    pub fn new(client: Client, base_uri: impl Into<String>) -> Self {
        let capacity = NonZeroUsize::new(SHARD_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::with_capacity(client, base_uri, capacity)
    }

    pub fn with_capacity(client: Client, base_uri: impl Into<String>, capacity: NonZeroUsize) -> Self {
        let base_uri = base_uri.into().trim_end_matches('/').to_string();
        Self { client, base_uri, cache: Mutex::new(LruCache::new(capacity)) }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Number of shards (present or absent) currently memoized.
    pub fn cached_shards(&self) -> usize {
        self.cache.lock().len()
    }

    /// Raw contents of `shard`, or `None` when the server has no such file.
    pub async fn read(&self, shard: &str) -> Result<Option<Arc<str>>> {
        let cached = self.cache.lock().get(shard).cloned();
        if let Some(hit) = cached {
            debug!(base = %self.base_uri, shard, "shard cache hit");
            return Ok(match hit {
                CachedShard::Present(content) => Some(content),
                CachedShard::Absent => None,
            });
        }

        let url = format!("{}/{}.json", self.base_uri, shard);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport { url: url.clone(), source })?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%url, "shard not published");
            self.cache.lock().put(shard.to_string(), CachedShard::Absent);
            return Ok(None);
        }
        if !status.is_success() {
            warn!(%url, %status, "shard fetch failed");
            return Err(FetchError::Status { url, status });
        }

        let content: Arc<str> = resp
            .text()
            .await
            .map_err(|source| FetchError::Transport { url: url.clone(), source })?
            .into();
        self.cache.lock().put(shard.to_string(), CachedShard::Present(content.clone()));
        Ok(Some(content))
    }

    /// Value stored under `key`, if its shard exists and holds it.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let shard = shard_id(key);
        let Some(content) = self.read(&shard).await? else {
            return Ok(None);
        };
        let mut entries = decode_shard::<T>(&shard, &content)?;
        Ok(entries.remove(key))
    }
}

/// The three published indexes of a site, read over HTTP.
pub struct HttpIndexReader {
    full_text: PartitionHttpBackend,
    property_values: PartitionHttpBackend,
    property_references: PartitionHttpBackend,
}

impl HttpIndexReader {
    /// `site_uri` is the origin serving the assets tree, e.g. `http://localhost:8080`.
    pub fn new(client: Client, site_uri: &str) -> Self {
        let site = site_uri.trim_end_matches('/');
        let dir = |name: &str| format!("{site}{ASSETS_URL_PREFIX}/{name}");
        Self {
            full_text: PartitionHttpBackend::new(client.clone(), dir(ASSET_FULL_TEXT)),
            property_values: PartitionHttpBackend::new(client.clone(), dir(ASSET_PROPERTY_VALUES)),
            property_references: PartitionHttpBackend::new(client, dir(ASSET_PROPERTY_REFERENCES)),
        }
    }

    pub fn full_text_backend(&self) -> &PartitionHttpBackend {
        &self.full_text
    }

    pub async fn full_text(&self, term: &str) -> Result<TermPostings> {
        Ok(self.full_text.get(term).await?.unwrap_or_default())
    }

    pub async fn property_values(&self, property: &str) -> Result<ValueCounts> {
        Ok(self.property_values.get(property).await?.unwrap_or_default())
    }

    pub async fn property_references(&self, property: &str, value: &str) -> Result<Vec<DocId>> {
        let refs: References = self
            .property_references
            .get(&reference_key(property, value))
            .await?
            .unwrap_or_default();
        Ok(refs.0.into_keys().collect())
    }

    /// Documents containing any of the query's terms.
    pub async fn search(&self, query: &str) -> Result<Vec<DocId>> {
        let mut postings = Vec::new();
        for term in query_terms(query) {
            postings.push(self.full_text(&term).await?);
        }
        Ok(union_documents(postings))
    }
}
