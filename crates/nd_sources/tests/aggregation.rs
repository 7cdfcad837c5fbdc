use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use nd_core::{Error, Fetcher, Result, SearchFilters, UserPreferences};
use nd_sources::{Aggregator, GuardianAdapter, NewsApiAdapter, NytAdapter, SourceAdapter};
use serde_json::{json, Value};

/// Serves one canned document, or fails with a status.
struct CannedFetcher {
    body: Option<Value>,
    hits: AtomicUsize,
}

impl CannedFetcher {
    fn serving(body: Value) -> Arc<Self> {
        Arc::new(Self {
            body: Some(body),
            hits: AtomicUsize::new(0),
        })
    }

    fn down() -> Arc<Self> {
        Arc::new(Self {
            body: None,
            hits: AtomicUsize::new(0),
        })
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for CannedFetcher {
    async fn get_json(&self, _path: &str, _query: &[(String, String)]) -> Result<Value> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        match &self.body {
            Some(body) => Ok(body.clone()),
            None => Err(Error::Status {
                source_id: "canned".to_string(),
                status: 503,
            }),
        }
    }
}

fn newsapi_body() -> Value {
    json!({
        "status": "ok",
        "totalResults": 1,
        "articles": [{
            "source": {"id": "bbc-news", "name": "BBC News"},
            "author": null,
            "title": "Morning briefing",
            "description": "What you need to know.",
            "url": "https://www.bbc.co.uk/news/briefing",
            "urlToImage": null,
            "publishedAt": "2024-05-01T06:00:00Z",
            "content": null
        }]
    })
}

fn guardian_body() -> Value {
    json!({
        "response": {
            "status": "ok",
            "total": 2,
            "results": [
                {
                    "id": "technology/2024/may/01/robots",
                    "sectionId": "technology",
                    "sectionName": "Technology",
                    "webPublicationDate": "2024-05-01T09:00:00Z",
                    "webTitle": "Robots at work",
                    "webUrl": "https://www.theguardian.com/technology/2024/may/01/robots",
                    "fields": {"byline": "Dan Milmo"}
                },
                {
                    "id": "uk-news/2024/may/01/weather",
                    "sectionId": "uk-news",
                    "sectionName": "UK news",
                    "webPublicationDate": "2024-05-01T10:00:00Z",
                    "webTitle": "Storm warning",
                    "webUrl": "https://www.theguardian.com/uk-news/2024/may/01/weather"
                }
            ]
        }
    })
}

fn nyt_body() -> Value {
    json!({
        "status": "OK",
        "section": "home",
        "results": [{
            "section": "Politics",
            "title": "Senate vote",
            "abstract": "The bill passed.",
            "url": "https://www.nytimes.com/2024/05/01/us/politics/vote.html",
            "uri": "nyt://article/vote",
            "byline": "By Carl Hulse",
            "published_date": "2024-05-01T08:00:00-04:00",
            "multimedia": null
        }]
    })
}

struct Fixture {
    newsapi: Arc<CannedFetcher>,
    guardian: Arc<CannedFetcher>,
    nytimes: Arc<CannedFetcher>,
    aggregator: Aggregator,
}

fn fixture(newsapi: Arc<CannedFetcher>, guardian: Arc<CannedFetcher>, nytimes: Arc<CannedFetcher>) -> Fixture {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(NewsApiAdapter::new(newsapi.clone())),
        Arc::new(GuardianAdapter::new(guardian.clone())),
        Arc::new(NytAdapter::new(nytimes.clone())),
    ];
    Fixture {
        newsapi,
        guardian,
        nytimes,
        aggregator: Aggregator::new(adapters),
    }
}

fn ids(articles: &[nd_core::Article]) -> Vec<&str> {
    articles.iter().map(|a| a.id.as_str()).collect()
}

#[tokio::test]
async fn test_headlines_merge_all_vendors() {
    let f = fixture(
        CannedFetcher::serving(newsapi_body()),
        CannedFetcher::serving(guardian_body()),
        CannedFetcher::serving(nyt_body()),
    );

    let articles = f.aggregator.get_top_headlines(None, None).await;

    // uk-news is not one of the default categories; "Politics" lowercases into one.
    assert_eq!(
        ids(&articles),
        vec![
            "nyt-nyt://article/vote",
            "guardian-technology/2024/may/01/robots",
            "newsapi-https://www.bbc.co.uk/news/briefing",
        ]
    );
    assert!(articles.iter().all(nd_core::Article::is_well_formed));
    assert_eq!(f.newsapi.hits(), 1);
    assert_eq!(f.guardian.hits(), 1);
    assert_eq!(f.nytimes.hits(), 1);
}

#[tokio::test]
async fn test_dead_vendor_degrades_to_partial_result() {
    let f = fixture(
        CannedFetcher::serving(newsapi_body()),
        CannedFetcher::down(),
        CannedFetcher::serving(nyt_body()),
    );

    let articles = f.aggregator.get_top_headlines(None, None).await;
    assert_eq!(articles.len(), 2);
    assert!(articles.iter().all(|a| !a.id.starts_with("guardian-")));
    assert_eq!(f.guardian.hits(), 1);
}

#[tokio::test]
async fn test_everything_down_is_empty_not_an_error() {
    let f = fixture(CannedFetcher::down(), CannedFetcher::down(), CannedFetcher::down());
    let articles = f
        .aggregator
        .search_all_sources(&SearchFilters::with_keyword("anything"), None)
        .await;
    assert!(articles.is_empty());
}

#[tokio::test]
async fn test_disabled_vendor_is_never_contacted() {
    let f = fixture(
        CannedFetcher::serving(newsapi_body()),
        CannedFetcher::serving(guardian_body()),
        CannedFetcher::serving(nyt_body()),
    );
    let mut prefs = UserPreferences::default();
    prefs.toggle_source("nytimes");

    let articles = f
        .aggregator
        .search_all_sources(&SearchFilters::with_keyword("vote"), Some(&prefs))
        .await;

    assert_eq!(f.nytimes.hits(), 0);
    assert!(articles.iter().all(|a| a.source != "The New York Times"));
}

#[tokio::test]
async fn test_explicit_categories_keep_everything_returned() {
    let f = fixture(
        CannedFetcher::serving(newsapi_body()),
        CannedFetcher::serving(guardian_body()),
        CannedFetcher::serving(nyt_body()),
    );
    let filters = SearchFilters {
        keyword: Some("storm".to_string()),
        categories: Some(vec!["uk-news".to_string()]),
        ..Default::default()
    };

    let articles = f.aggregator.search_all_sources(&filters, None).await;
    assert!(articles
        .iter()
        .any(|a| a.id == "guardian-uk-news/2024/may/01/weather"));
}
