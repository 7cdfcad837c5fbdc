use std::cmp::Reverse;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use futures::future::join_all;
use futures::FutureExt;
use nd_core::{Article, Config, Result, SearchFilters, UserPreferences};
use tracing::{error, info};
use crate::adapters::{GuardianAdapter, NewsApiAdapter, NytAdapter, SourceAdapter};
use crate::http::HttpFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Latest,
    Search,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Latest => "latest",
            Mode::Search => "search",
        }
    }
}

/// What one aggregation call will ask for and how it filters the results.
#[derive(Debug)]
struct Plan {
    enabled_source_ids: Vec<String>,
    enabled_category_ids: Vec<String>,
    enabled_author_ids: Vec<String>,
    /// Filters handed to every adapter.
    effective: SearchFilters,
    explicit_categories: bool,
    explicit_authors: bool,
}

impl Plan {
    fn new(preferences: Option<&UserPreferences>, filters: Option<&SearchFilters>) -> Self {
        let defaults = UserPreferences::default();
        let preferences = preferences.unwrap_or(&defaults);

        let enabled_source_ids = preferences.enabled_source_ids();
        let enabled_category_ids = preferences.enabled_category_ids();
        let enabled_author_ids = preferences.enabled_author_ids();

        let mut effective = filters.cloned().unwrap_or_default();
        let explicit_categories = effective.categories.is_some();
        let explicit_authors = effective.authors.is_some();

        if effective.sources.is_none() {
            effective.sources = Some(enabled_source_ids.clone());
        }
        if effective.categories.is_none() && !enabled_category_ids.is_empty() {
            effective.categories = Some(enabled_category_ids.clone());
        }
        if effective.authors.is_none() && !enabled_author_ids.is_empty() {
            effective.authors = Some(enabled_author_ids.clone());
        }

        Self {
            enabled_source_ids,
            enabled_category_ids,
            enabled_author_ids,
            effective,
            explicit_categories,
            explicit_authors,
        }
    }

    fn calls(&self, source_id: &str) -> bool {
        self.enabled_source_ids.iter().any(|id| id == source_id)
    }

    /// Articles without a category always pass.
    fn category_allows(&self, article: &Article) -> bool {
        if self.explicit_categories || self.enabled_category_ids.is_empty() {
            return true;
        }
        match &article.category {
            Some(category) => self
                .enabled_category_ids
                .contains(&category.to_lowercase()),
            None => true,
        }
    }

    /// Exact match; articles without an author always pass.
    fn author_allows(&self, article: &Article) -> bool {
        if self.explicit_authors || self.enabled_author_ids.is_empty() {
            return true;
        }
        match &article.author {
            Some(author) => self.enabled_author_ids.contains(author),
            None => true,
        }
    }
}

/// Newest first. Stable, so equal timestamps keep adapter order; articles
/// whose date cannot be parsed go last.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by_cached_key(|article| Reverse(article.published_at_utc()));
}

/// Fans out to the enabled source adapters and merges what they return.
pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl Aggregator {
    /// Adapters are invoked, and their results concatenated, in this order.
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    /// NewsAPI, Guardian and NYT over HTTP, in that order.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let timeout = config.request_timeout;

        let newsapi = NewsApiAdapter::new(Arc::new(HttpFetcher::newsapi(&config.newsapi, timeout)?))
            .with_page_size(config.page_size)
            .with_timeout(timeout);
        let guardian =
            GuardianAdapter::new(Arc::new(HttpFetcher::guardian(&config.guardian, timeout)?))
                .with_page_size(config.page_size)
                .with_timeout(timeout);
        let nytimes = NytAdapter::new(Arc::new(HttpFetcher::nytimes(&config.nytimes, timeout)?))
            .with_section(config.nyt_section.clone())
            .with_timeout(timeout);

        Ok(Self::new(vec![
            Arc::new(newsapi),
            Arc::new(guardian),
            Arc::new(nytimes),
        ]))
    }

    pub async fn get_top_headlines(
        &self,
        preferences: Option<&UserPreferences>,
        filters: Option<&SearchFilters>,
    ) -> Vec<Article> {
        self.aggregate(Mode::Latest, preferences, filters).await
    }

    pub async fn search_all_sources(
        &self,
        filters: &SearchFilters,
        preferences: Option<&UserPreferences>,
    ) -> Vec<Article> {
        self.aggregate(Mode::Search, preferences, Some(filters)).await
    }

    async fn aggregate(
        &self,
        mode: Mode,
        preferences: Option<&UserPreferences>,
        filters: Option<&SearchFilters>,
    ) -> Vec<Article> {
        let run = AssertUnwindSafe(self.run(mode, preferences, filters)).catch_unwind();
        match run.await {
            Ok(articles) => articles,
            Err(_) => {
                error!(mode = mode.as_str(), "aggregation panicked, returning no articles");
                Vec::new()
            }
        }
    }

    async fn run(
        &self,
        mode: Mode,
        preferences: Option<&UserPreferences>,
        filters: Option<&SearchFilters>,
    ) -> Vec<Article> {
        let plan = Plan::new(preferences, filters);
        let effective = &plan.effective;

        let selected: Vec<&Arc<dyn SourceAdapter>> = self
            .adapters
            .iter()
            .filter(|adapter| plan.calls(adapter.metadata().id))
            .collect();

        let calls = selected.iter().map(|adapter| {
            let call = async move {
                match mode {
                    Mode::Latest => adapter.fetch_latest(Some(effective)).await,
                    Mode::Search => adapter.search(effective).await,
                }
            };
            async move {
                match AssertUnwindSafe(call).catch_unwind().await {
                    Ok(articles) => articles,
                    Err(_) => {
                        error!(source = adapter.metadata().id, "adapter panicked");
                        Vec::new()
                    }
                }
            }
        });

        let results = join_all(calls).await;
        let fetched: usize = results.iter().map(Vec::len).sum();

        let mut articles: Vec<Article> = results.into_iter().flatten().collect();
        sort_newest_first(&mut articles);

        let articles: Vec<Article> = articles
            .into_iter()
            .filter(|article| plan.category_allows(article) && plan.author_allows(article))
            .collect();

        info!(
            mode = mode.as_str(),
            sources = ?selected.iter().map(|a| a.metadata().id).collect::<Vec<_>>(),
            fetched,
            returned = articles.len(),
            "aggregated articles"
        );
        articles
    }
}
