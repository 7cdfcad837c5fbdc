pub mod backends;
pub mod preferences;

pub use backends::*;
pub use preferences::{load_preferences, save_preferences, PreferenceStore};

pub mod prelude {
    pub use super::backends::*;
    pub use super::preferences::PreferenceStore;
    pub use nd_core::KeyValueStore;
}
