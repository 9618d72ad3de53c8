pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod notify;
pub mod server;
pub mod suggest;

pub use config::Config;
pub use error::{EgographError, Result};
pub use graph::{BuildOutcome, BuildParameters, BuildResult, GraphBuilder};
pub use suggest::{GoogleSuggestClient, SuggestionSource};
