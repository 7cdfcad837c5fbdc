use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use nd_core::config::{DEFAULT_NYT_SECTION, DEFAULT_TIMEOUT};
use nd_core::fetcher::Query;
use nd_core::{Article, Fetcher, Result, SearchFilters};
use serde::Deserialize;
use serde_json::Value;
use super::utils::{lenient_records, non_empty, push, push_opt};
use super::{SourceAdapter, SourceMetadata, VendorPayload};

const ARTICLE_SEARCH: &str = "search/v2/articlesearch.json";
const DISPLAY_NAME: &str = "The New York Times";
/// Article search multimedia URLs are relative to this.
const IMAGE_BASE_URL: &str = "https://www.nytimes.com/";

#[derive(Debug, Clone, Deserialize)]
pub struct TopStoriesResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub results: Vec<TopStory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopStory {
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub subsection: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub byline: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    /// Usually a list, but its shape varies between API versions.
    #[serde(default)]
    pub multimedia: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleSearchResponse {
    #[serde(default)]
    pub status: Option<String>,
    pub response: ArticleSearchDocs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleSearchDocs {
    #[serde(default, deserialize_with = "lenient_records")]
    pub docs: Vec<SearchDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchDoc {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub lead_paragraph: Option<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub headline: Option<SearchHeadline>,
    #[serde(default)]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub section_name: Option<String>,
    #[serde(default)]
    pub byline: Option<SearchByline>,
    #[serde(default)]
    pub multimedia: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHeadline {
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub print_headline: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchByline {
    #[serde(default)]
    pub original: Option<String>,
}

/// `url` of the first entry when `multimedia` is a non-empty list.
fn first_media_url(multimedia: Option<&Value>) -> Option<String> {
    multimedia?
        .as_array()?
        .first()?
        .get("url")?
        .as_str()
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

pub fn map_top_story(story: TopStory) -> Article {
    let image_url = first_media_url(story.multimedia.as_ref());
    let summary = non_empty(story.abstract_text).unwrap_or_default();

    Article {
        id: format!("nyt-{}", story.uri.unwrap_or_default()),
        title: story.title.unwrap_or_default(),
        description: summary.clone(),
        content: summary,
        url: story.url.unwrap_or_default(),
        image_url,
        source: DISPLAY_NAME.to_string(),
        author: non_empty(story.byline),
        category: non_empty(story.section),
        published_at: story.published_date.unwrap_or_default(),
    }
}

pub fn map_search_doc(doc: SearchDoc) -> Article {
    let image_url =
        first_media_url(doc.multimedia.as_ref()).map(|url| format!("{}{}", IMAGE_BASE_URL, url));

    Article {
        id: format!("nyt-{}", doc.id),
        title: doc.headline.and_then(|h| h.main).unwrap_or_default(),
        description: non_empty(doc.abstract_text)
            .or_else(|| non_empty(doc.snippet))
            .unwrap_or_default(),
        content: non_empty(doc.lead_paragraph).unwrap_or_default(),
        url: doc.web_url.unwrap_or_default(),
        image_url,
        source: DISPLAY_NAME.to_string(),
        author: doc.byline.and_then(|b| non_empty(b.original)),
        category: non_empty(doc.section_name),
        published_at: doc.pub_date.unwrap_or_default(),
    }
}

/// Article search wants `YYYYMMDD`.
fn compact_date(date: &str) -> String {
    date.replace('-', "")
}

/// `news_desk:(a) OR news_desk:(b)`
fn news_desk_query(categories: &[String]) -> String {
    categories
        .iter()
        .map(|category| format!("news_desk:({})", category))
        .collect::<Vec<_>>()
        .join(" OR ")
}

pub struct NytAdapter {
    fetcher: Arc<dyn Fetcher>,
    section: String,
    timeout: Duration,
}

impl NytAdapter {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            section: DEFAULT_NYT_SECTION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Top-stories section used for `fetch_latest`.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn top_stories_path(&self) -> String {
        format!("topstories/v2/{}.json", self.section)
    }

    pub fn search_query(&self, filters: &SearchFilters) -> Query {
        let mut query = Query::new();
        push_opt(&mut query, "q", filters.keyword());
        if let Some(from) = filters.from_date.as_deref().filter(|d| !d.is_empty()) {
            push(&mut query, "begin_date", compact_date(from));
        }
        if let Some(to) = filters.to_date.as_deref().filter(|d| !d.is_empty()) {
            push(&mut query, "end_date", compact_date(to));
        }
        if let Some(categories) = filters.category_list() {
            push(&mut query, "fq", news_desk_query(categories));
        }
        push(&mut query, "sort", "newest");
        query
    }
}

#[async_trait]
impl SourceAdapter for NytAdapter {
    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            id: nd_core::NYTIMES_ID,
            name: DISPLAY_NAME,
        }
    }

    fn request_timeout(&self) -> Duration {
        self.timeout
    }

    /// Top stories take no query; the filters are not forwarded.
    async fn try_fetch_latest(&self, _filters: Option<&SearchFilters>) -> Result<Vec<Article>> {
        let value = self.fetcher.get_json(&self.top_stories_path(), &[]).await?;
        let response: TopStoriesResponse = serde_json::from_value(value)?;
        Ok(VendorPayload::NytTopStories(response).into_articles())
    }

    async fn try_search(&self, filters: &SearchFilters) -> Result<Vec<Article>> {
        let value = self
            .fetcher
            .get_json(ARTICLE_SEARCH, &self.search_query(filters))
            .await?;
        let response: ArticleSearchResponse = serde_json::from_value(value)?;
        Ok(VendorPayload::NytSearch(response).into_articles())
    }
}
