use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use nd_core::config::{DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT};
use nd_core::fetcher::Query;
use nd_core::{Article, Error, Fetcher, Result, SearchFilters};
use serde::Deserialize;
use super::utils::{lenient_records, non_empty, push, push_opt};
use super::{SourceAdapter, SourceMetadata, VendorPayload};

const TOP_HEADLINES: &str = "top-headlines";
const EVERYTHING: &str = "everything";
const DEFAULT_SOURCES: &str = "bbc-news,cnn,the-verge";
const DEFAULT_KEYWORD: &str = "technology";
const LANGUAGE: &str = "en";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    pub source: NewsApiSource,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// NewsAPI has no stable article id, so the URL stands in for one.
pub fn map_article(article: NewsApiArticle) -> Article {
    let url = article.url.unwrap_or_default();
    Article {
        id: format!("newsapi-{}", url),
        title: article.title.unwrap_or_default(),
        description: non_empty(article.description).unwrap_or_default(),
        content: non_empty(article.content).unwrap_or_default(),
        url,
        image_url: non_empty(article.url_to_image),
        source: article.source.name.unwrap_or_default(),
        author: non_empty(article.author),
        category: Some("general".to_string()),
        published_at: article.published_at.unwrap_or_default(),
    }
}

/// Source ids from the caller, minus the aggregator's own vendor ids which
/// mean nothing to NewsAPI.
fn vendor_sources(filters: &SearchFilters) -> Option<String> {
    let sources: Vec<&str> = filters
        .source_list()?
        .iter()
        .map(String::as_str)
        .filter(|id| {
            !id.is_empty()
                && ![nd_core::NEWSAPI_ID, nd_core::GUARDIAN_ID, nd_core::NYTIMES_ID].contains(id)
        })
        .collect();

    if sources.is_empty() {
        None
    } else {
        Some(sources.join(","))
    }
}

pub struct NewsApiAdapter {
    fetcher: Arc<dyn Fetcher>,
    page_size: u32,
    timeout: Duration,
}

impl NewsApiAdapter {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn latest_query(&self, filters: Option<&SearchFilters>) -> Query {
        let mut query = Query::new();
        let default_filters = SearchFilters::default();
        let filters = filters.unwrap_or(&default_filters);

        push_opt(&mut query, "q", filters.keyword());
        match vendor_sources(filters) {
            Some(sources) => push(&mut query, "sources", sources),
            None => push(&mut query, "sources", DEFAULT_SOURCES),
        }
        push_opt(&mut query, "from", filters.from_date.as_deref());
        push_opt(&mut query, "to", filters.to_date.as_deref());
        push(&mut query, "pageSize", self.page_size.to_string());
        push(&mut query, "language", LANGUAGE);
        query
    }

    pub fn search_query(&self, filters: &SearchFilters) -> Query {
        let mut query = Query::new();
        push(&mut query, "q", filters.keyword().unwrap_or(DEFAULT_KEYWORD));
        if let Some(sources) = vendor_sources(filters) {
            push(&mut query, "sources", sources);
        }
        push_opt(&mut query, "from", filters.from_date.as_deref());
        push_opt(&mut query, "to", filters.to_date.as_deref());
        push(&mut query, "pageSize", self.page_size.to_string());
        push(&mut query, "language", LANGUAGE);
        push(&mut query, "sortBy", "publishedAt");
        query
    }

    async fn fetch(&self, endpoint: &str, query: Query) -> Result<Vec<Article>> {
        let value = self.fetcher.get_json(endpoint, &query).await?;
        let response: NewsApiResponse = serde_json::from_value(value)?;
        if response.status.as_deref() == Some("error") {
            return Err(Error::Source(
                response
                    .message
                    .unwrap_or_else(|| "NewsAPI reported an error".to_string()),
            ));
        }
        Ok(VendorPayload::NewsApi(response).into_articles())
    }
}

#[async_trait]
impl SourceAdapter for NewsApiAdapter {
    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            id: nd_core::NEWSAPI_ID,
            name: "News API",
        }
    }

    fn request_timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_fetch_latest(&self, filters: Option<&SearchFilters>) -> Result<Vec<Article>> {
        self.fetch(TOP_HEADLINES, self.latest_query(filters)).await
    }

    async fn try_search(&self, filters: &SearchFilters) -> Result<Vec<Article>> {
        self.fetch(EVERYTHING, self.search_query(filters)).await
    }
}
