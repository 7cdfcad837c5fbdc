use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use nd_core::config::{DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT};
use nd_core::fetcher::Query;
use nd_core::{Article, Fetcher, Result, SearchFilters};
use serde::Deserialize;
use super::utils::{lenient_records, non_empty, push, push_opt};
use super::{SourceAdapter, SourceMetadata, VendorPayload};

const SEARCH: &str = "search";
const SHOW_FIELDS: &str = "headline,trailText,byline,thumbnail,body";
const DISPLAY_NAME: &str = "The Guardian";

#[derive(Debug, Clone, Deserialize)]
pub struct GuardianResponse {
    pub response: GuardianResults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuardianResults {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub results: Vec<GuardianArticle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianArticle {
    pub id: String,
    #[serde(default)]
    pub section_id: Option<String>,
    #[serde(default)]
    pub section_name: Option<String>,
    #[serde(default)]
    pub web_publication_date: Option<String>,
    #[serde(default)]
    pub web_title: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub fields: Option<GuardianFields>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianFields {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub trail_text: Option<String>,
    #[serde(default)]
    pub byline: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

pub fn map_article(article: GuardianArticle) -> Article {
    let fields = article.fields.unwrap_or_default();
    Article {
        id: format!("guardian-{}", article.id),
        title: non_empty(fields.headline)
            .or(article.web_title)
            .unwrap_or_default(),
        description: non_empty(fields.trail_text).unwrap_or_default(),
        content: non_empty(fields.body).unwrap_or_default(),
        url: article.web_url.unwrap_or_default(),
        image_url: non_empty(fields.thumbnail),
        source: DISPLAY_NAME.to_string(),
        // No byline: fall back to the section name.
        author: non_empty(fields.byline).or_else(|| non_empty(article.section_name)),
        category: non_empty(article.section_id),
        published_at: article.web_publication_date.unwrap_or_default(),
    }
}

pub struct GuardianAdapter {
    fetcher: Arc<dyn Fetcher>,
    page_size: u32,
    timeout: Duration,
}

impl GuardianAdapter {
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

    /// Builds the content API query. Categories become a `|`-separated
    /// section list; `newest_first` adds `order-by=newest`.
    pub fn query(&self, filters: Option<&SearchFilters>, newest_first: bool) -> Query {
        let mut query = Query::new();
        push(&mut query, "show-fields", SHOW_FIELDS);
        push(&mut query, "show-tags", "keyword");
        push(&mut query, "page-size", self.page_size.to_string());

        if let Some(filters) = filters {
            push_opt(&mut query, "q", filters.keyword());
            push_opt(&mut query, "from-date", filters.from_date.as_deref());
            push_opt(&mut query, "to-date", filters.to_date.as_deref());
            if let Some(categories) = filters.category_list() {
                push(&mut query, "section", categories.join("|"));
            }
        }

        if newest_first {
            push(&mut query, "order-by", "newest");
        }
        query
    }

    async fn fetch(&self, query: Query) -> Result<Vec<Article>> {
        let value = self.fetcher.get_json(SEARCH, &query).await?;
        let response: GuardianResponse = serde_json::from_value(value)?;
        Ok(VendorPayload::Guardian(response).into_articles())
    }
}

#[async_trait]
impl SourceAdapter for GuardianAdapter {
    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            id: nd_core::GUARDIAN_ID,
            name: DISPLAY_NAME,
        }
    }

    fn request_timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_fetch_latest(&self, filters: Option<&SearchFilters>) -> Result<Vec<Article>> {
        self.fetch(self.query(filters, false)).await
    }

    async fn try_search(&self, filters: &SearchFilters) -> Result<Vec<Article>> {
        self.fetch(self.query(Some(filters), true)).await
    }
}
