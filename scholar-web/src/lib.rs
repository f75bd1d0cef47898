//! Paper discovery and page acquisition.
//!
//! - SerpAPI Google Scholar client behind the [`PaperSearch`] trait (`scholar`)
//! - Page fetcher behind the [`ContentFetcher`] trait (`fetch`)
//! - Paragraph text extraction from HTML (`extract`)

pub mod extract;
pub mod fetch;
pub mod scholar;

pub use fetch::{ContentFetcher, FetchError, WebFetcher};
pub use scholar::{PaperSearch, SearchError, SerpApiScholar};
