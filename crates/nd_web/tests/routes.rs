use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use nd_core::{Article, KeyValueStore, Result, SearchFilters, UserPreferences};
use nd_sources::adapters::{SourceAdapter, SourceMetadata};
use nd_sources::Aggregator;
use nd_storage::{InMemoryStore, PreferenceStore};
use nd_web::{create_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

struct StubSource {
    id: &'static str,
    articles: Vec<Article>,
    calls: AtomicUsize,
    seen: Mutex<Vec<SearchFilters>>,
}

impl StubSource {
    fn new(id: &'static str, articles: Vec<Article>) -> Arc<Self> {
        Arc::new(Self {
            id,
            articles,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, filters: Option<&SearchFilters>) -> Vec<Article> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push(filters.cloned().unwrap_or_default());
        self.articles.clone()
    }
}

#[async_trait]
impl SourceAdapter for StubSource {
    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            id: self.id,
            name: self.id,
        }
    }

    async fn try_fetch_latest(&self, filters: Option<&SearchFilters>) -> Result<Vec<Article>> {
        Ok(self.record(filters))
    }

    async fn try_search(&self, filters: &SearchFilters) -> Result<Vec<Article>> {
        Ok(self.record(Some(filters)))
    }
}

fn article(id: &str, category: &str, published_at: &str) -> Article {
    Article {
        id: id.to_string(),
        title: format!("title {}", id),
        description: String::new(),
        content: String::new(),
        url: format!("https://example.com/{}", id),
        image_url: None,
        source: "Example".to_string(),
        author: None,
        category: Some(category.to_string()),
        published_at: published_at.to_string(),
    }
}

struct Harness {
    app: Router,
    newsapi: Arc<StubSource>,
    guardian: Arc<StubSource>,
    backend: Arc<InMemoryStore>,
}

async fn harness() -> Harness {
    let newsapi = StubSource::new(
        "newsapi",
        vec![article("newsapi-1", "general", "2024-05-01T06:00:00Z")],
    );
    let guardian = StubSource::new(
        "guardian",
        vec![
            article("guardian-1", "technology", "2024-05-01T09:00:00Z"),
            article("guardian-2", "uk-news", "2024-05-01T10:00:00Z"),
        ],
    );
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![newsapi.clone(), guardian.clone()];

    let backend = Arc::new(InMemoryStore::new());
    let preferences = PreferenceStore::load(backend.clone()).await.unwrap();
    let state = AppState::new(Arc::new(Aggregator::new(adapters)), Arc::new(preferences));

    Harness {
        app: create_app(state),
        newsapi,
        guardian,
        backend,
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_headlines_are_merged_and_filtered() {
    let h = harness().await;
    let (status, body) = send(&h.app, Method::GET, "/api/headlines", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["guardian-1", "newsapi-1"]);
    assert_eq!(body[0]["publishedAt"], "2024-05-01T09:00:00Z");
    assert!(body[0].get("imageUrl").is_none());
}

#[tokio::test]
async fn test_headlines_forward_query_filters() {
    let h = harness().await;
    let (status, body) = send(
        &h.app,
        Method::GET,
        "/api/headlines?keyword=storm&categories=uk-news&fromDate=2024-04-01",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(ids(&body).contains(&"guardian-2".to_string()));

    let seen = h.guardian.seen.lock().unwrap()[0].clone();
    assert_eq!(seen.keyword.as_deref(), Some("storm"));
    assert_eq!(seen.categories, Some(vec!["uk-news".to_string()]));
    assert_eq!(seen.from_date.as_deref(), Some("2024-04-01"));
}

#[tokio::test]
async fn test_search_without_keyword_calls_nothing() {
    let h = harness().await;
    let (status, body) = send(&h.app, Method::GET, "/api/search?categories=business", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert_eq!(h.newsapi.calls(), 0);
    assert_eq!(h.guardian.calls(), 0);
}

#[tokio::test]
async fn test_search_with_keyword() {
    let h = harness().await;
    let (_, body) = send(&h.app, Method::GET, "/api/search?keyword=chips", None).await;

    assert_eq!(ids(&body), vec!["guardian-1", "newsapi-1"]);
    assert_eq!(h.newsapi.calls(), 1);
}

#[tokio::test]
async fn test_reference_lists() {
    let h = harness().await;

    let (_, sources) = send(&h.app, Method::GET, "/api/sources", None).await;
    assert_eq!(sources.as_array().unwrap().len(), 3);
    assert_eq!(sources[1], json!({"id": "guardian", "name": "The Guardian", "enabled": true}));

    let (_, categories) = send(&h.app, Method::GET, "/api/categories", None).await;
    assert_eq!(categories.as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_toggled_source_is_skipped_and_persisted() {
    let h = harness().await;

    let (status, prefs) = send(
        &h.app,
        Method::POST,
        "/api/preferences/sources/newsapi/toggle",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs["sources"][0]["enabled"], false);

    let (_, body) = send(&h.app, Method::GET, "/api/headlines", None).await;
    assert_eq!(ids(&body), vec!["guardian-1"]);
    assert_eq!(h.newsapi.calls(), 0);

    let saved = h.backend.get(nd_core::PREFERENCES_KEY).await.unwrap().unwrap();
    let saved: UserPreferences = serde_json::from_str(&saved).unwrap();
    assert!(!saved.enabled_source_ids().contains(&"newsapi".to_string()));
}

#[tokio::test]
async fn test_authors_can_be_added_toggled_and_reset() {
    let h = harness().await;

    let author = json!({"id": "Alex Hern", "name": "Alex Hern", "enabled": true});
    let (status, prefs) = send(&h.app, Method::POST, "/api/preferences/authors", Some(author)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs["authors"].as_array().unwrap().len(), 1);

    let (_, prefs) = send(
        &h.app,
        Method::POST,
        "/api/preferences/authors/Alex%20Hern/toggle",
        None,
    )
    .await;
    assert_eq!(prefs["authors"][0]["enabled"], false);

    let (_, prefs) = send(&h.app, Method::POST, "/api/preferences/reset", None).await;
    assert_eq!(prefs, serde_json::to_value(UserPreferences::default()).unwrap());
}

#[tokio::test]
async fn test_preferences_can_be_replaced() {
    let h = harness().await;
    let mut prefs = UserPreferences::default();
    prefs.toggle_category("sports");

    let (status, body) = send(
        &h.app,
        Method::PUT,
        "/api/preferences",
        Some(serde_json::to_value(&prefs).unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, current) = send(&h.app, Method::GET, "/api/preferences", None).await;
    assert_eq!(current, body);
    assert_eq!(current, serde_json::to_value(&prefs).unwrap());
}
