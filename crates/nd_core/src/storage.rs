use async_trait::async_trait;
use crate::Result;

/// A string key-value store. Preferences persist through this.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never set.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes the key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
