//! Package retrieval.
//!
//! - **Fetching**: run the external fetch tool for an import path
//! - **Resolution**: find where that import path lives on disk

mod fetch;
mod resolve;

pub use fetch::{FetchError, Fetcher};
pub use resolve::{ImportResolver, ResolveError};
