use async_trait::async_trait;
use serde_json::Value;
use crate::Result;

/// Query parameters in the order they are sent.
pub type Query = Vec<(String, String)>;

/// An opaque GET against one vendor API.
///
/// Implementations add credentials and anything else the vendor requires.
/// A non-success status must come back as an error.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value>;
}
