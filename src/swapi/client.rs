use std::time::Duration;

use indexmap::IndexMap;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::skip::KnownGaps;
use super::RawRecord;
use crate::error::{SyncError, SyncResult};

pub const DEFAULT_BASE_URL: &str = "https://swapi.dev/api/";

// Upper bound on the pre-allocation; `count` comes from upstream.
const PREALLOC_LIMIT: u32 = 1024;

#[derive(Debug, Deserialize)]
struct CollectionMeta {
    count: u32,
}

/// Collection name → metadata URL, as listed by the API root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionIndex {
    urls: IndexMap<String, String>,
}

impl CollectionIndex {
    pub fn from_value(url: &str, value: Value) -> SyncResult<Self> {
        let urls: IndexMap<String, String> =
            serde_json::from_value(value).map_err(|e| SyncError::decode(url, e.to_string()))?;
        Ok(Self { urls })
    }

    pub fn metadata_url(&self, collection: &str) -> Option<&str> {
        self.urls.get(collection).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.urls.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Sequential SWAPI reader. Every request is awaited before the next one is issued.
#[derive(Clone)]
pub struct SwapiClient {
    http: Client,
    base_url: String,
    gaps: KnownGaps,
}

impl SwapiClient {
    /// `timeout = None` keeps the HTTP client default (no deadline).
    pub fn new(base_url: &str, timeout: Option<Duration>) -> SyncResult<Self> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder
            .build()
            .map_err(|e| SyncError::Config(format!("http client: {e}")))?;
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            http,
            base_url,
            gaps: KnownGaps::swapi_defaults(),
        })
    }

    pub fn with_gaps(mut self, gaps: KnownGaps) -> Self {
        self.gaps = gaps;
        self
    }

    pub fn gaps(&self) -> &KnownGaps {
        &self.gaps
    }

    /// `{base}{collection}/{index}/`
    pub fn item_url(&self, collection: &str, index: u32) -> String {
        format!("{}{}/{}/", self.base_url, collection, index)
    }

    async fn get_json(&self, url: &str) -> SyncResult<Value> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| SyncError::Transport {
                url: url.to_string(),
                source,
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await.map_err(|source| SyncError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|e| SyncError::decode(url, e.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn collection_index(&self) -> SyncResult<CollectionIndex> {
        let value = self.get_json(&self.base_url).await?;
        let index = CollectionIndex::from_value(&self.base_url, value)?;
        debug!(collections = index.len(), "api root listed collections");
        Ok(index)
    }

    /// Metadata request: the `count` reported for a collection.
    #[instrument(skip(self, index))]
    pub async fn collection_count(
        &self,
        index: &CollectionIndex,
        collection: &str,
    ) -> SyncResult<u32> {
        let url = index
            .metadata_url(collection)
            .ok_or_else(|| SyncError::UnknownCollection(collection.to_string()))?;
        let value = self.get_json(url).await?;
        let meta: CollectionMeta =
            serde_json::from_value(value).map_err(|e| SyncError::decode(url, e.to_string()))?;
        Ok(meta.count)
    }

    /// Fetch every item of a collection in ascending index order.
    ///
    /// Known gaps are skipped without a request; any other failure aborts.
    #[instrument(skip(self, index))]
    pub async fn fetch(&self, index: &CollectionIndex, collection: &str) -> SyncResult<Vec<RawRecord>> {
        let count = self.collection_count(index, collection).await?;
        info!(collection, count, "fetching collection");

        let mut records: Vec<RawRecord> = Vec::with_capacity(count.min(PREALLOC_LIMIT) as usize);
        for i in 1..=count {
            if self.gaps.is_gap(collection, i) {
                debug!(collection, index = i, "skipping known gap");
                continue;
            }
            let url = self.item_url(collection, i);
            match self.get_json(&url).await? {
                Value::Object(map) => records.push(map),
                other => {
                    return Err(SyncError::decode(
                        &url,
                        format!("expected object, got {}", json_type(&other)),
                    ))
                }
            }
        }

        if let Some(expected) = self.gaps.shortfall(collection, count, records.len()) {
            warn!(
                collection,
                fetched = records.len(),
                expected,
                "collection is not complete"
            );
        }
        info!(collection, fetched = records.len(), "collection fetched");
        Ok(records)
    }

    /// Status code for a URL, or -1 when the request never got an answer.
    pub async fn url_status(&self, url: &str) -> i32 {
        match self.http.get(url).send().await {
            Ok(resp) => i32::from(resp.status().as_u16()),
            Err(e) => {
                warn!(url, error = %e, "connection aborted");
                -1
            }
        }
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
