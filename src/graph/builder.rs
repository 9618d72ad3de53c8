//! Bounded breadth-first expansion of a seed term into a weighted graph.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::format::{encode, GraphFormat};
use super::store::{Edge, Graph};
use crate::error::{EgographError, Result};
use crate::suggest::SuggestionSource;

pub const DEFAULT_PATTERN: &str = " vs ";
pub const DEFAULT_DEPTH: u32 = 1;
pub const DEFAULT_RADIUS: u32 = 10;
pub const DEFAULT_FORMAT: &str = "json";
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(10);

/// Inputs of one build, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParameters {
    /// Seed term.
    pub query: String,
    /// Join pattern used for queries and edge labels.
    pub pattern: String,
    /// Number of BFS levels to expand.
    pub depth: u32,
    /// Cumulative distance budget measured from the seed.
    pub radius: u32,
    /// Output format tag.
    pub format: String,
}

impl BuildParameters {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

impl Default for BuildParameters {
    fn default() -> Self {
        Self {
            query: String::new(),
            pattern: DEFAULT_PATTERN.to_string(),
            depth: DEFAULT_DEPTH,
            radius: DEFAULT_RADIUS,
            format: DEFAULT_FORMAT.to_string(),
        }
    }
}

/// How a `build()` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Empty seed term; nothing was done.
    Skipped,
    /// All levels were expanded.
    Completed,
    /// The build timeout elapsed; the graph holds whatever was reached.
    TimedOut,
}

/// Serializable summary of a built graph.
///
/// `max_weight` and `max_distance` are `-inf` until an edge exists; JSON
/// encodes them as `null` then.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub graph: String,
    pub format: String,
    pub query: String,
    pub depth: u32,
    pub radius: u32,
    pub max_weight: f64,
    pub max_distance: f64,
    pub pattern: String,
    pub elapsed_ms: f64,
}

/// Builds an ego graph around a seed term.
///
/// Levels are expanded strictly in order and sources within a level in
/// frontier order, one fetch at a time; weights and distances depend on that
/// order. Calling [`GraphBuilder::build`] again on the same instance
/// accumulates onto the existing graph.
pub struct GraphBuilder {
    params: BuildParameters,
    source: Arc<dyn SuggestionSource>,
    graph: Graph,
    max_distance: Option<u32>,
    elapsed: Duration,
    timeout: Duration,
    cancel: CancellationToken,
}

impl GraphBuilder {
    pub fn new(params: BuildParameters, source: Arc<dyn SuggestionSource>) -> Self {
        Self {
            params,
            source,
            graph: Graph::new(),
            max_distance: None,
            elapsed: Duration::ZERO,
            timeout: DEFAULT_BUILD_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    /// Override the whole-build timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Abort in-flight fetches when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn params(&self) -> &BuildParameters {
        &self.params
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn max_distance(&self) -> Option<u32> {
        self.max_distance
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Expand the seed term.
    ///
    /// A fetch failure aborts the build with the error; nodes and edges
    /// merged before the failure, a timeout, or a cancellation are kept.
    pub async fn build(&mut self) -> Result<BuildOutcome> {
        if self.params.query.is_empty() {
            return Ok(BuildOutcome::Skipped);
        }

        let start = Instant::now();
        let timeout = self.timeout;
        let expanded = tokio::time::timeout(timeout, self.expand()).await;
        let outcome = match expanded {
            Ok(result) => {
                result?;
                BuildOutcome::Completed
            }
            Err(_) => {
                log::error!(
                    "build() timed out after {} ms for '{}'",
                    timeout.as_millis(),
                    self.params.query
                );
                BuildOutcome::TimedOut
            }
        };
        self.elapsed = start.elapsed();

        log::info!(
            "Built graph for '{}': {} nodes, {} edges in {:?} ({:?})",
            self.params.query,
            self.graph.node_count(),
            self.graph.edge_count(),
            self.elapsed,
            outcome
        );

        Ok(outcome)
    }

    async fn expand(&mut self) -> Result<()> {
        let radius = self.params.radius;
        let mut frontier: Vec<(String, u32)> = vec![(self.params.query.clone(), 0)];

        for depth in 0..self.params.depth {
            log::debug!("Level {}: {} source(s)", depth, frontier.len());
            let mut next = Vec::new();

            for (src, src_distance) in &frontier {
                if *src_distance >= radius {
                    continue;
                }
                let max_count = (radius - src_distance) as usize;
                let targets = self.fetch(src, max_count).await?;
                self.merge(src, *src_distance, depth, &targets, &mut next);
            }

            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        Ok(())
    }

    async fn fetch(&self, term: &str, max_count: usize) -> Result<Vec<String>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(EgographError::Cancelled),
            result = self.source.fetch(term, &self.params.pattern, max_count) => result,
        }
    }

    /// Merge one source's ranked targets into the graph.
    fn merge(
        &mut self,
        src: &str,
        src_distance: u32,
        depth: u32,
        targets: &[String],
        next: &mut Vec<(String, u32)>,
    ) {
        if !self.graph.contains_node(src) {
            let node_depth = if src == self.params.query { 0 } else { depth + 1 };
            self.graph.insert_node(src, node_depth);
        }

        let n = targets.len() as u32;
        for (rank, target) in (1..).zip(targets) {
            let distance = src_distance + rank;
            let weight = n - rank + 1;
            self.max_distance = Some(self.max_distance.map_or(distance, |m| m.max(distance)));

            if self.graph.insert_node(target, depth + 1) {
                let edge = self.edge(src, target, distance, weight);
                self.graph.insert_edge(edge);
                next.push((target.clone(), distance));
                continue;
            }

            self.graph.increment_count(target);
            let merged = match self.graph.edge_between_mut(src, target) {
                Some(edge) => {
                    edge.weight += weight;
                    true
                }
                None => false,
            };
            if !merged {
                let edge = self.edge(src, target, distance, weight);
                self.graph.insert_edge(edge);
            }
        }
    }

    fn edge(&self, src: &str, target: &str, distance: u32, weight: u32) -> Edge {
        Edge {
            source: src.to_string(),
            target: target.to_string(),
            distance,
            weight,
            query: format!("{}{}{}", src, self.params.pattern, target),
        }
    }

    /// Encode the graph in the configured format.
    pub fn serialize(&self) -> Result<String> {
        self.serialize_as(&self.params.format)
    }

    /// Encode the graph in `format`; unknown tags fail without touching state.
    pub fn serialize_as(&self, format: &str) -> Result<String> {
        let format: GraphFormat = format.parse()?;
        encode(&self.graph, format)
    }

    /// Graph plus parameters and statistics.
    pub fn to_result(&self) -> Result<BuildResult> {
        Ok(BuildResult {
            graph: self.serialize()?,
            format: self.params.format.clone(),
            query: self.params.query.clone(),
            depth: self.params.depth,
            radius: self.params.radius,
            max_weight: self.graph.max_weight().map_or(f64::NEG_INFINITY, f64::from),
            max_distance: self.max_distance.map_or(f64::NEG_INFINITY, f64::from),
            pattern: self.params.pattern.clone(),
            elapsed_ms: self.elapsed.as_secs_f64() * 1000.0,
        })
    }
}
