pub mod config;
pub mod dates;
pub mod error;
pub mod fetcher;
pub mod preferences;
pub mod storage;
pub mod types;

pub use config::{Config, SourceConfig};
pub use error::{Error, Result};
pub use fetcher::Fetcher;
pub use preferences::{
    default_categories, default_sources, GUARDIAN_ID, NEWSAPI_ID, NYTIMES_ID, PREFERENCES_KEY,
};
pub use storage::KeyValueStore;
pub use types::{
    Article, NewsAuthor, NewsCategory, NewsSource, PreferenceItem, SearchFilters, UserPreferences,
};
