use serde::{Deserialize, Serialize};

/// The normalized record every source adapter produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub published_at: String,
}

impl Article {
    /// True when every field that must be non-empty actually is.
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty()
            && !self.title.is_empty()
            && !self.url.is_empty()
            && !self.source.is_empty()
            && !self.published_at.is_empty()
    }

    pub fn published_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        crate::dates::parse_published_at(&self.published_at)
    }
}

/// A user-toggleable entry. Identity is `id`; only `enabled` changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceItem {
    pub id: String,
    pub name: String,
    pub enabled: bool,
}

impl PreferenceItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled,
        }
    }
}

pub type NewsSource = PreferenceItem;
pub type NewsCategory = PreferenceItem;
pub type NewsAuthor = PreferenceItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default = "crate::preferences::default_sources")]
    pub sources: Vec<NewsSource>,
    #[serde(default = "crate::preferences::default_categories")]
    pub categories: Vec<NewsCategory>,
    #[serde(default)]
    pub authors: Vec<NewsAuthor>,
}

/// The current query intent. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
}

impl SearchFilters {
    pub fn with_keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            ..Default::default()
        }
    }

    /// The keyword, if one is set and not blank.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.is_empty())
    }

    /// Categories, if a non-empty list is set.
    pub fn category_list(&self) -> Option<&[String]> {
        self.categories.as_deref().filter(|c| !c.is_empty())
    }

    pub fn source_list(&self) -> Option<&[String]> {
        self.sources.as_deref().filter(|s| !s.is_empty())
    }
}
