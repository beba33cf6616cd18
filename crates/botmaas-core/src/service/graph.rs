//! Workflow graph validation and deep copy.
//!
//! A deep copy gives every node and edge a fresh id, rewrites edge
//! endpoints, and rewrites node-to-node references inside node data. Only
//! values under [`NODE_REF_KEYS`] are references; every other value in
//! `data` is opaque payload and is copied as is. The copy owns all of its
//! data; nothing is shared with the source graph.

use std::collections::{HashMap, HashSet};

use botmaas_types::workflow::{WorkflowEdge, WorkflowGraph, WorkflowNode};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Keys inside node `data` whose string (or string array) values name other
/// nodes. Matched at any depth.
pub const NODE_REF_KEYS: &[&str] = &[
    "ref",
    "nodeId",
    "node_id",
    "source",
    "target",
    "sourceNodeId",
    "targetNodeId",
];

/// Structural defects that make a graph impossible to copy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node at position {0} has an empty id")]
    EmptyNodeId(usize),

    #[error("duplicate node id: '{0}'")]
    DuplicateNodeId(String),

    #[error("edge '{edge}' references missing {end} node '{node}'")]
    DanglingEdge {
        edge: String,
        end: &'static str,
        node: String,
    },
}

/// Check that node ids are non-empty and unique and that every edge
/// endpoint names an existing node.
pub fn validate_graph(graph: &WorkflowGraph) -> Result<(), GraphError> {
    let mut seen = HashSet::new();
    for (pos, node) in graph.nodes.iter().enumerate() {
        if node.id.is_empty() {
            return Err(GraphError::EmptyNodeId(pos));
        }
        if !seen.insert(node.id.as_str()) {
            return Err(GraphError::DuplicateNodeId(node.id.clone()));
        }
    }

    for edge in &graph.edges {
        for (end, node) in [("source", &edge.source), ("target", &edge.target)] {
            if !seen.contains(node.as_str()) {
                return Err(GraphError::DanglingEdge {
                    edge: edge.id.clone(),
                    end,
                    node: node.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Produce an independent copy of `graph` with fresh node and edge ids.
pub fn deep_copy_graph(graph: &WorkflowGraph) -> Result<WorkflowGraph, GraphError> {
    validate_graph(graph)?;

    let id_map: HashMap<&str, String> = graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), fresh_node_id(&n.node_type)))
        .collect();

    let nodes = graph
        .nodes
        .iter()
        .map(|n| WorkflowNode {
            id: id_map[n.id.as_str()].clone(),
            node_type: n.node_type.clone(),
            data: rewrite_refs(&n.data, &id_map),
        })
        .collect();

    // Endpoints were validated above, so every lookup hits.
    let edges = graph
        .edges
        .iter()
        .map(|e| WorkflowEdge {
            id: Uuid::now_v7().to_string(),
            source: id_map[e.source.as_str()].clone(),
            target: id_map[e.target.as_str()].clone(),
            source_handle: e.source_handle.clone(),
            target_handle: e.target_handle.clone(),
        })
        .collect();

    Ok(WorkflowGraph { nodes, edges })
}

fn fresh_node_id(node_type: &str) -> String {
    format!("{node_type}::{}", Uuid::now_v7())
}

/// Walk `value` and remap node ids found under reference keys.
fn rewrite_refs(value: &Value, id_map: &HashMap<&str, String>) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| rewrite_refs(v, id_map)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if NODE_REF_KEYS.contains(&k.as_str()) {
                        remap_ref(v, id_map)
                    } else {
                        rewrite_refs(v, id_map)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Remap a reference value: a node id string or an array of them. Strings
/// that name no node are kept.
fn remap_ref(value: &Value, id_map: &HashMap<&str, String>) -> Value {
    match value {
        Value::String(s) => Value::String(id_map.get(s.as_str()).cloned().unwrap_or_else(|| s.clone())),
        Value::Array(items) => Value::Array(items.iter().map(|v| remap_ref(v, id_map)).collect()),
        other => rewrite_refs(other, id_map),
    }
}
