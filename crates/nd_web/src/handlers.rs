use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use nd_core::{
    default_categories, default_sources, Article, NewsAuthor, NewsCategory, NewsSource,
    SearchFilters, UserPreferences,
};
use serde::Deserialize;
use tracing::debug;
use crate::{ApiError, AppState};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Query string shared by the article routes. List values are comma separated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    pub keyword: Option<String>,
    pub sources: Option<String>,
    pub categories: Option<String>,
    pub authors: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

fn split_list(raw: Option<String>) -> Option<Vec<String>> {
    let items: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl From<FilterQuery> for SearchFilters {
    fn from(query: FilterQuery) -> Self {
        SearchFilters {
            keyword: non_blank(query.keyword),
            sources: split_list(query.sources),
            categories: split_list(query.categories),
            authors: split_list(query.authors),
            from_date: non_blank(query.from_date),
            to_date: non_blank(query.to_date),
        }
    }
}

pub async fn headlines(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Json<Vec<Article>> {
    let filters = SearchFilters::from(query);
    let preferences = state.preferences.get();
    Json(
        state
            .aggregator
            .get_top_headlines(Some(&preferences), Some(&filters))
            .await,
    )
}

/// Nothing is searched until a keyword is given.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Json<Vec<Article>> {
    let filters = SearchFilters::from(query);
    if filters.keyword().is_none() {
        debug!("search without keyword");
        return Json(Vec::new());
    }
    let preferences = state.preferences.get();
    Json(
        state
            .aggregator
            .search_all_sources(&filters, Some(&preferences))
            .await,
    )
}

pub async fn list_sources() -> Json<Vec<NewsSource>> {
    Json(default_sources())
}

pub async fn list_categories() -> Json<Vec<NewsCategory>> {
    Json(default_categories())
}

pub async fn get_preferences(State(state): State<Arc<AppState>>) -> Json<UserPreferences> {
    Json(state.preferences.get())
}

pub async fn replace_preferences(
    State(state): State<Arc<AppState>>,
    Json(preferences): Json<UserPreferences>,
) -> ApiResult<UserPreferences> {
    Ok(Json(state.preferences.set(preferences).await?))
}

pub async fn reset_preferences(State(state): State<Arc<AppState>>) -> ApiResult<UserPreferences> {
    Ok(Json(state.preferences.reset().await?))
}

pub async fn toggle_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<UserPreferences> {
    Ok(Json(state.preferences.toggle_source(&id).await?))
}

pub async fn toggle_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<UserPreferences> {
    Ok(Json(state.preferences.toggle_category(&id).await?))
}

pub async fn toggle_author(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<UserPreferences> {
    Ok(Json(state.preferences.toggle_author(&id).await?))
}

pub async fn add_author(
    State(state): State<Arc<AppState>>,
    Json(author): Json<NewsAuthor>,
) -> ApiResult<UserPreferences> {
    Ok(Json(state.preferences.add_author(author).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_query_splits_lists() {
        let filters = SearchFilters::from(FilterQuery {
            keyword: Some("  rust ".to_string()),
            categories: Some("technology, science,,".to_string()),
            sources: Some(" , ".to_string()),
            from_date: Some(String::new()),
            ..Default::default()
        });

        assert_eq!(filters.keyword.as_deref(), Some("rust"));
        assert_eq!(
            filters.categories,
            Some(vec!["technology".to_string(), "science".to_string()])
        );
        assert_eq!(filters.sources, None);
        assert_eq!(filters.from_date, None);
        assert_eq!(filters.authors, None);
    }
}
