use crate::types::{NewsAuthor, NewsCategory, NewsSource, PreferenceItem, UserPreferences};

pub const NEWSAPI_ID: &str = "newsapi";
pub const GUARDIAN_ID: &str = "guardian";
pub const NYTIMES_ID: &str = "nytimes";

/// Storage key the preference document lives under.
pub const PREFERENCES_KEY: &str = "news-aggregator-preferences";

pub fn default_sources() -> Vec<NewsSource> {
    vec![
        PreferenceItem::new(NEWSAPI_ID, "News API", true),
        PreferenceItem::new(GUARDIAN_ID, "The Guardian", true),
        PreferenceItem::new(NYTIMES_ID, "The New York Times", true),
    ]
}

pub fn default_categories() -> Vec<NewsCategory> {
    [
        ("general", "General"),
        ("business", "Business"),
        ("technology", "Technology"),
        ("entertainment", "Entertainment"),
        ("sports", "Sports"),
        ("science", "Science"),
        ("health", "Health"),
        ("politics", "Politics"),
    ]
    .into_iter()
    .map(|(id, name)| PreferenceItem::new(id, name, true))
    .collect()
}

fn toggle(items: &mut [PreferenceItem], id: &str) -> bool {
    match items.iter_mut().find(|item| item.id == id) {
        Some(item) => {
            item.enabled = !item.enabled;
            true
        }
        None => false,
    }
}

fn enabled_ids(items: &[PreferenceItem]) -> Vec<String> {
    items
        .iter()
        .filter(|item| item.enabled)
        .map(|item| item.id.clone())
        .collect()
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            categories: default_categories(),
            authors: Vec::new(),
        }
    }
}

impl UserPreferences {
    /// Flips a source's `enabled` flag. Returns false if no source has that id.
    pub fn toggle_source(&mut self, id: &str) -> bool {
        toggle(&mut self.sources, id)
    }

    pub fn toggle_category(&mut self, id: &str) -> bool {
        toggle(&mut self.categories, id)
    }

    pub fn toggle_author(&mut self, id: &str) -> bool {
        toggle(&mut self.authors, id)
    }

    /// Appends an author unless one with the same id is already known.
    pub fn add_author(&mut self, author: NewsAuthor) -> bool {
        if self.authors.iter().any(|a| a.id == author.id) {
            return false;
        }
        self.authors.push(author);
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn enabled_source_ids(&self) -> Vec<String> {
        enabled_ids(&self.sources)
    }

    pub fn enabled_category_ids(&self) -> Vec<String> {
        enabled_ids(&self.categories)
    }

    pub fn enabled_author_ids(&self) -> Vec<String> {
        enabled_ids(&self.authors)
    }
}
