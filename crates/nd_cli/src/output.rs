use std::fmt::Write;
use nd_core::{Article, PreferenceItem, Result, UserPreferences};
use serde::Serialize;

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// One block per article: date, source and title, then the link.
pub fn render_articles(articles: &[Article]) -> String {
    if articles.is_empty() {
        return "No articles found.\n".to_string();
    }

    let mut out = String::new();
    for article in articles {
        let when = article
            .published_at_utc()
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| article.published_at.clone());
        let _ = writeln!(out, "{}  {}  {}", when, article.source, article.title);
        if let Some(author) = &article.author {
            let _ = writeln!(out, "    by {}", author);
        }
        let _ = writeln!(out, "    {}", article.url);
    }
    out
}

pub fn render_items(items: &[PreferenceItem]) -> String {
    if items.is_empty() {
        return "  (none)\n".to_string();
    }

    let mut out = String::new();
    for item in items {
        let mark = if item.enabled { "x" } else { " " };
        if item.id == item.name {
            let _ = writeln!(out, "  [{}] {}", mark, item.id);
        } else {
            let _ = writeln!(out, "  [{}] {} ({})", mark, item.id, item.name);
        }
    }
    out
}

pub fn render_preferences(preferences: &UserPreferences) -> String {
    format!(
        "Sources:\n{}Categories:\n{}Authors:\n{}",
        render_items(&preferences.sources),
        render_items(&preferences.categories),
        render_items(&preferences.authors),
    )
}
