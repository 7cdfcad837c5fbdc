pub mod adapters;
pub mod aggregator;
pub mod http;

pub use adapters::{
    GuardianAdapter, NewsApiAdapter, NytAdapter, SourceAdapter, SourceMetadata, VendorPayload,
};
pub use aggregator::Aggregator;
pub use http::{Credential, HttpFetcher};

pub mod prelude {
    pub use super::adapters::SourceAdapter;
    pub use super::aggregator::Aggregator;
    pub use nd_core::{Article, Error, Result, SearchFilters, UserPreferences};
}
