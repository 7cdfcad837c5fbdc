use std::env;
use std::fmt;
use std::time::Duration;
use url::Url;
use crate::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_NYT_SECTION: &str = "home";

pub const NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2";
pub const GUARDIAN_BASE_URL: &str = "https://content.guardianapis.com";
pub const NYT_BASE_URL: &str = "https://api.nytimes.com/svc";

#[derive(Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl SourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub newsapi: SourceConfig,
    pub guardian: SourceConfig,
    pub nytimes: SourceConfig,
    /// Upper bound on a single adapter call.
    pub request_timeout: Duration,
    pub page_size: u32,
    /// Top-stories section used for NYT headlines.
    pub nyt_section: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            newsapi: SourceConfig::new(NEWSAPI_BASE_URL),
            guardian: SourceConfig::new(GUARDIAN_BASE_URL),
            nytimes: SourceConfig::new(NYT_BASE_URL),
            request_timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            nyt_section: DEFAULT_NYT_SECTION.to_string(),
        }
    }
}

impl Config {
    /// Reads API keys and overrides from the environment on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.newsapi = config.newsapi.with_api_key(lookup("NEWS_API_KEY"));
        config.guardian = config.guardian.with_api_key(lookup("GUARDIAN_API_KEY"));
        config.nytimes = config.nytimes.with_api_key(lookup("NYT_API_KEY"));

        if let Some(url) = lookup("NEWSDESK_NEWSAPI_URL") {
            config.newsapi.base_url = url;
        }
        if let Some(url) = lookup("NEWSDESK_GUARDIAN_URL") {
            config.guardian.base_url = url;
        }
        if let Some(url) = lookup("NEWSDESK_NYT_URL") {
            config.nytimes.base_url = url;
        }
        if let Some(secs) = lookup("NEWSDESK_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("NEWSDESK_TIMEOUT_SECS: {}", e)))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, source) in [
            ("newsapi", &self.newsapi),
            ("guardian", &self.guardian),
            ("nytimes", &self.nytimes),
        ] {
            Url::parse(&source.base_url)
                .map_err(|e| Error::Config(format!("{} base URL {:?}: {}", name, source.base_url, e)))?;
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page size must be positive".to_string()));
        }
        Ok(())
    }
}
