pub mod traits;
pub mod http;
pub mod rss_feed;
pub mod winbox;
pub mod registry;

pub use http::{Fetcher, HttpFetcher};
pub use registry::SourceRegistry;
pub use traits::{ReleaseSource, SourceUpdate, WatermarkAdvance};
