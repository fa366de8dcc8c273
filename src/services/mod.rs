//! Service layer for the crawler application.
//!
//! - Page fetching (`PageFetcher`, `HttpFetcher`)
//! - Outbound link extraction (`extract_links`)

mod extract;
mod fetch;

pub use extract::extract_links;
pub use fetch::{HttpFetcher, PageFetcher};
