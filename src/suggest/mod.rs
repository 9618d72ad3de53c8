//! Term suggestion sources.
//!
//! The graph builder only sees the [`SuggestionSource`] trait; the HTTP
//! client wraps its network call in explicit retry/timeout policies.

mod filter;
mod google;
mod policy;

pub use filter::filter_candidates;
pub use google::GoogleSuggestClient;
pub use policy::{RetryPolicy, TimeoutPolicy};

use async_trait::async_trait;

use crate::error::Result;

/// Something that returns related terms for a query term.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Return at most `max_count` distinct related terms, most relevant first.
    ///
    /// `pattern` is the join pattern the query is extended with (e.g. `" vs "`);
    /// echoes of it are stripped from the results.
    async fn fetch(&self, term: &str, pattern: &str, max_count: usize) -> Result<Vec<String>>;
}
