//! Text encodings of a built graph.

use std::str::FromStr;

use serde::Serialize;

use super::store::{Edge, Graph, Node};
use crate::error::{EgographError, Result};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Json,
}

impl FromStr for GraphFormat {
    type Err = EgographError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(GraphFormat::Json),
            other => Err(EgographError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Serialize)]
struct JsonGraph<'a> {
    nodes: &'a [Node],
    links: &'a [Edge],
}

/// Encode the graph. Output order is insertion order.
pub fn encode(graph: &Graph, format: GraphFormat) -> Result<String> {
    match format {
        GraphFormat::Json => Ok(serde_json::to_string(&JsonGraph {
            nodes: graph.nodes(),
            links: graph.edges(),
        })?),
    }
}
