use std::sync::Arc;
use nd_core::{KeyValueStore, NewsAuthor, Result, UserPreferences, PREFERENCES_KEY};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Reads the persisted document. `Ok(None)` when nothing was ever saved.
pub async fn load_preferences(backend: &dyn KeyValueStore) -> Result<Option<UserPreferences>> {
    match backend.get(PREFERENCES_KEY).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn save_preferences(backend: &dyn KeyValueStore, preferences: &UserPreferences) -> Result<()> {
    let raw = serde_json::to_string(preferences)?;
    backend.set(PREFERENCES_KEY, raw).await
}

/// The single owner of the user's preferences.
///
/// Every change is written to the backend before subscribers see it. Readers
/// get cloned snapshots and never block writers.
pub struct PreferenceStore {
    backend: Arc<dyn KeyValueStore>,
    state: watch::Sender<UserPreferences>,
    writer: Mutex<()>,
}

impl PreferenceStore {
    /// Loads the persisted document, falling back to defaults when it is
    /// missing or cannot be parsed. Backend I/O errors are returned.
    pub async fn load(backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let preferences = match load_preferences(backend.as_ref()).await {
            Ok(Some(preferences)) => preferences,
            Ok(None) => {
                debug!("no saved preferences, using defaults");
                UserPreferences::default()
            }
            Err(nd_core::Error::Serialization(e)) => {
                warn!(error = %e, "saved preferences are unreadable, using defaults");
                UserPreferences::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Self::with_preferences(backend, preferences))
    }

    /// Starts from `preferences` without touching the backend.
    pub fn with_preferences(backend: Arc<dyn KeyValueStore>, preferences: UserPreferences) -> Self {
        let (state, _) = watch::channel(preferences);
        Self {
            backend,
            state,
            writer: Mutex::new(()),
        }
    }

    pub fn get(&self) -> UserPreferences {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UserPreferences> {
        self.state.subscribe()
    }

    pub async fn set(&self, preferences: UserPreferences) -> Result<UserPreferences> {
        self.update(move |current| *current = preferences).await
    }

    /// Applies `change` to a copy of the current preferences. If that copy
    /// differs, it is persisted and then published. Returns the resulting
    /// preferences either way.
    pub async fn update<F>(&self, change: F) -> Result<UserPreferences>
    where
        F: FnOnce(&mut UserPreferences) + Send,
    {
        let _writer = self.writer.lock().await;

        let current = self.get();
        let mut next = current.clone();
        change(&mut next);
        if next == current {
            return Ok(current);
        }

        save_preferences(self.backend.as_ref(), &next).await?;
        self.state.send_replace(next.clone());
        Ok(next)
    }

    pub async fn toggle_source(&self, id: &str) -> Result<UserPreferences> {
        self.update(|p| {
            p.toggle_source(id);
        })
        .await
    }

    pub async fn toggle_category(&self, id: &str) -> Result<UserPreferences> {
        self.update(|p| {
            p.toggle_category(id);
        })
        .await
    }

    pub async fn toggle_author(&self, id: &str) -> Result<UserPreferences> {
        self.update(|p| {
            p.toggle_author(id);
        })
        .await
    }

    pub async fn add_author(&self, author: NewsAuthor) -> Result<UserPreferences> {
        self.update(move |p| {
            p.add_author(author);
        })
        .await
    }

    pub async fn reset(&self) -> Result<UserPreferences> {
        self.update(UserPreferences::reset).await
    }

    /// Forgets the persisted document entirely and returns to defaults.
    pub async fn clear(&self) -> Result<UserPreferences> {
        let _writer = self.writer.lock().await;
        self.backend.remove(PREFERENCES_KEY).await?;
        let defaults = UserPreferences::default();
        self.state.send_replace(defaults.clone());
        info!("cleared saved preferences");
        Ok(defaults)
    }
}
