use std::sync::Arc;
use nd_sources::Aggregator;
use nd_storage::PreferenceStore;

pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub preferences: Arc<PreferenceStore>,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>, preferences: Arc<PreferenceStore>) -> Self {
        Self {
            aggregator,
            preferences,
        }
    }
}
