use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use nd_core::{Error, Fetcher, Result, SourceConfig};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

const USER_AGENT: &str = concat!("newsdesk/", env!("CARGO_PKG_VERSION"));

/// How a vendor expects its API key.
#[derive(Clone)]
pub enum Credential {
    None,
    Header(&'static str, String),
    Query(&'static str, String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::None => write!(f, "None"),
            Credential::Header(name, _) => write!(f, "Header({}, <redacted>)", name),
            Credential::Query(name, _) => write!(f, "Query({}, <redacted>)", name),
        }
    }
}

/// `Fetcher` over HTTPS for one vendor base URL.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    source_id: &'static str,
    base_url: String,
    credential: Credential,
}

impl HttpFetcher {
    pub fn new(
        source_id: &'static str,
        base_url: impl Into<String>,
        credential: Credential,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            source_id,
            base_url: base_url.into(),
            credential,
        })
    }

    /// NewsAPI takes its key in the `X-Api-Key` header.
    pub fn newsapi(config: &SourceConfig, timeout: Duration) -> Result<Self> {
        let credential = match &config.api_key {
            Some(key) => Credential::Header("X-Api-Key", key.clone()),
            None => Credential::None,
        };
        Self::new(nd_core::NEWSAPI_ID, &config.base_url, credential, timeout)
    }

    pub fn guardian(config: &SourceConfig, timeout: Duration) -> Result<Self> {
        Self::new(
            nd_core::GUARDIAN_ID,
            &config.base_url,
            query_key(config),
            timeout,
        )
    }

    pub fn nytimes(config: &SourceConfig, timeout: Duration) -> Result<Self> {
        Self::new(
            nd_core::NYTIMES_ID,
            &config.base_url,
            query_key(config),
            timeout,
        )
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn query_key(config: &SourceConfig) -> Credential {
    match &config.api_key {
        Some(key) => Credential::Query("api-key", key.clone()),
        None => Credential::None,
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let url = self.endpoint(path);
        debug!(source = self.source_id, %url, params = query.len(), "GET");

        let mut request = self.client.get(&url).query(query);
        match &self.credential {
            Credential::Header(name, key) => request = request.header(*name, key.as_str()),
            Credential::Query(name, key) => request = request.query(&[(*name, key.as_str())]),
            Credential::None => {}
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                source_id: self.source_id.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json::<Value>().await?)
    }
}
