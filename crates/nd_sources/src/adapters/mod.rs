use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use async_trait::async_trait;
use futures::FutureExt;
use nd_core::config::DEFAULT_TIMEOUT;
use nd_core::{Article, Error, Result, SearchFilters};
use tracing::{debug, error, warn};

pub mod guardian;
pub mod newsapi;
pub mod nytimes;

pub use guardian::GuardianAdapter;
pub use newsapi::NewsApiAdapter;
pub use nytimes::NytAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Matches the `id` of the corresponding `NewsSource` preference.
    pub id: &'static str,
    pub name: &'static str,
}

/// One vendor API, normalized into `Article`s.
///
/// Implementors write the fallible `try_*` methods. Callers use
/// `fetch_latest` and `search`, which never fail: errors, timeouts and
/// panics are logged and turn into an empty list.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn metadata(&self) -> SourceMetadata;

    fn request_timeout(&self) -> Duration {
        DEFAULT_TIMEOUT
    }

    async fn try_fetch_latest(&self, filters: Option<&SearchFilters>) -> Result<Vec<Article>>;

    async fn try_search(&self, filters: &SearchFilters) -> Result<Vec<Article>>;

    /// Latest articles from this vendor, or an empty list on any failure.
    async fn fetch_latest(&self, filters: Option<&SearchFilters>) -> Vec<Article> {
        guarded(
            self.metadata(),
            "latest",
            self.request_timeout(),
            self.try_fetch_latest(filters),
        )
        .await
    }

    /// Search results from this vendor, or an empty list on any failure.
    async fn search(&self, filters: &SearchFilters) -> Vec<Article> {
        guarded(
            self.metadata(),
            "search",
            self.request_timeout(),
            self.try_search(filters),
        )
        .await
    }
}

async fn guarded<F>(
    meta: SourceMetadata,
    operation: &'static str,
    limit: Duration,
    call: F,
) -> Vec<Article>
where
    F: Future<Output = Result<Vec<Article>>>,
{
    match tokio::time::timeout(limit, AssertUnwindSafe(call).catch_unwind()).await {
        Ok(Ok(Ok(articles))) => {
            debug!(source = meta.id, operation, count = articles.len(), "fetched articles");
            articles
        }
        Ok(Ok(Err(e))) => {
            error!(source = meta.id, operation, error = %e, "error fetching from {}", meta.name);
            Vec::new()
        }
        Ok(Err(_)) => {
            error!(source = meta.id, operation, "adapter panicked");
            Vec::new()
        }
        Err(_) => {
            let e = Error::Timeout(limit);
            warn!(source = meta.id, operation, error = %e, "giving up on {}", meta.name);
            Vec::new()
        }
    }
}

/// Every vendor response shape the adapters understand.
#[derive(Debug, Clone)]
pub enum VendorPayload {
    NewsApi(newsapi::NewsApiResponse),
    Guardian(guardian::GuardianResponse),
    NytTopStories(nytimes::TopStoriesResponse),
    NytSearch(nytimes::ArticleSearchResponse),
}

impl VendorPayload {
    pub fn source_id(&self) -> &'static str {
        match self {
            VendorPayload::NewsApi(_) => nd_core::NEWSAPI_ID,
            VendorPayload::Guardian(_) => nd_core::GUARDIAN_ID,
            VendorPayload::NytTopStories(_) | VendorPayload::NytSearch(_) => nd_core::NYTIMES_ID,
        }
    }

    /// Maps the payload into canonical articles, dropping records that lack
    /// an id, title, url, source or publication date.
    pub fn into_articles(self) -> Vec<Article> {
        let source_id = self.source_id();
        let mapped: Vec<Article> = match self {
            VendorPayload::NewsApi(r) => r.articles.into_iter().map(newsapi::map_article).collect(),
            VendorPayload::Guardian(r) => r
                .response
                .results
                .into_iter()
                .map(guardian::map_article)
                .collect(),
            VendorPayload::NytTopStories(r) => r
                .results
                .into_iter()
                .map(nytimes::map_top_story)
                .collect(),
            VendorPayload::NytSearch(r) => r
                .response
                .docs
                .into_iter()
                .map(nytimes::map_search_doc)
                .collect(),
        };

        mapped
            .into_iter()
            .filter(|article| {
                let keep = article.is_well_formed();
                if !keep {
                    debug!(source = source_id, id = %article.id, "dropping incomplete article");
                }
                keep
            })
            .collect()
    }
}

/// Helpers shared by the vendor mappings.
pub(crate) mod utils {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use tracing::debug;

    /// Deserializes a list of vendor records one at a time. Records that do
    /// not fit the schema are skipped; a missing or `null` list is empty.
    pub fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(values
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(error = %e, "skipping malformed record");
                    None
                }
            })
            .collect())
    }

    /// `Some` only for a present, non-empty string.
    pub fn non_empty(value: Option<String>) -> Option<String> {
        value.filter(|v| !v.is_empty())
    }

    pub fn push(query: &mut Vec<(String, String)>, key: &str, value: impl Into<String>) {
        query.push((key.to_string(), value.into()));
    }

    pub fn push_opt(query: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            push(query, key, value);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use async_trait::async_trait;
    use nd_core::{Error, Fetcher, Result};
    use serde_json::Value;

    /// Replays a canned response and records every request.
    pub struct MockFetcher {
        response: std::result::Result<Value, u16>,
        pub requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockFetcher {
        pub fn ok(value: Value) -> Self {
            Self {
                response: Ok(value),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(status: u16) -> Self {
            Self {
                response: Err(status),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn last_request(&self) -> (String, Vec<(String, String)>) {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }

        pub fn param(&self, key: &str) -> Option<String> {
            self.last_request()
                .1
                .into_iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v)
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
            self.requests
                .lock()
                .unwrap()
                .push((path.to_string(), query.to_vec()));
            match &self.response {
                Ok(value) => Ok(value.clone()),
                Err(status) => Err(Error::Status {
                    source_id: "mock".to_string(),
                    status: *status,
                }),
            }
        }
    }
}
