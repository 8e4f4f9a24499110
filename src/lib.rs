pub mod analytics;
pub mod api;
pub mod cache;
pub mod constants;
pub mod logging;
pub mod quota;
pub mod session;
pub mod utils;

// Re-export the main error types for convenience
pub use analytics::export::ExportError;
pub use api::youtube::FetchError;

// Re-export the enrichment pipeline
pub use analytics::analyzer::{
    fetch_and_analyze, filter_videos, sort_by_vs_ratio, VideoFilter, VideoRecord,
};

// Re-export client building blocks
pub use api::cached::CachedVideoApi;
pub use api::youtube::{ApiKey, DataApiClient, SearchRequest, TrendingRequest, VideoApi};
pub use cache::ResponseCache;
pub use quota::QuotaTracker;
pub use session::SessionContext;
