use crate::config::SuggestConfig;
use crate::error::{EgographError, Result};
use crate::suggest::{filter_candidates, RetryPolicy, SuggestionSource, TimeoutPolicy};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Autocomplete client for the Google suggest endpoint
///
/// Queries `<endpoint>?client=firefox&gl=us&hl=en&q=<term><pattern>`, whose
/// answer looks like `["okr vs ", ["okr vs kpi", ...], ...]`. The timeout
/// policy bounds the whole retried call.
pub struct GoogleSuggestClient {
    client: Client,
    endpoint: Url,
    retry: RetryPolicy,
    timeout: TimeoutPolicy,
}

impl GoogleSuggestClient {
    /// Create a new suggest client
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base URL of the suggest API
    /// * `retry` - Attempt budget and backoff for transient failures
    /// * `timeout` - Limit for one fetch, retries included
    pub fn new(endpoint: &str, retry: RetryPolicy, timeout: TimeoutPolicy) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| EgographError::Config(format!("invalid suggest endpoint {}: {}", endpoint, e)))?;

        let client = Client::builder().build()?;

        Ok(Self {
            client,
            endpoint,
            retry,
            timeout,
        })
    }

    /// Create a client from the `[suggest]` config section
    pub fn from_config(config: &SuggestConfig) -> Result<Self> {
        Self::new(
            &config.endpoint,
            RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.initial_backoff_ms),
            ),
            TimeoutPolicy::new(config.fetch_timeout()),
        )
    }

    fn request_url(&self, term: &str, pattern: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client", "firefox")
            .append_pair("gl", "us")
            .append_pair("hl", "en")
            .append_pair("q", &format!("{}{}", term, pattern));
        url
    }

    /// Single request, no retry
    async fn fetch_once(&self, url: &Url) -> Result<Vec<String>> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EgographError::SourceFetch(format!("suggest API error {}", status)));
        }

        let bytes = response.bytes().await?;
        parse_suggestions(&decode_latin1(&bytes))
    }
}

/// The firefox client answers in ISO-8859-1.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Extract the suggestion list (second array element) from a response body.
fn parse_suggestions(body: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(body)?;
    let hits = value
        .get(1)
        .and_then(Value::as_array)
        .ok_or_else(|| EgographError::SourceFetch("unexpected suggest payload".to_string()))?;

    Ok(hits
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

#[async_trait]
impl SuggestionSource for GoogleSuggestClient {
    async fn fetch(&self, term: &str, pattern: &str, max_count: usize) -> Result<Vec<String>> {
        if max_count == 0 {
            return Ok(Vec::new());
        }

        let start = std::time::Instant::now();
        let url = self.request_url(term, pattern);
        let what = format!("suggest '{}'", term);
        let hits = self
            .timeout
            .run(&what, self.retry.run(&what, || self.fetch_once(&url)))
            .await?;

        log::debug!(
            "Suggest call for '{}' took {:?} ({} raw hits)",
            term,
            start.elapsed(),
            hits.len()
        );

        // one hit may split into several terms; the cap holds for terms too
        Ok(filter_candidates(term, pattern, hits.iter().take(max_count).map(String::as_str))
            .into_iter()
            .take(max_count)
            .collect())
    }
}
