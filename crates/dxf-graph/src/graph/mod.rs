//! In-memory property graph model.
//!
//! Nodes and edges address each other by string id rather than by direct
//! reference: the graph is an arena of typed node collections plus a
//! separate id-to-index map, which gives stable, cheap "weak" edge
//! endpoints that can dangle safely. A dangling edge target is a valid,
//! detectable state (`node(id)` returns `None`), not a crash.

pub mod builder;
mod intern;

pub use intern::StringPool;

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::schema::Schema;

/// A typed graph node with three parallel property columns, one per
/// declared property type. This avoids runtime type tags on every value.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique within a graph; the sole addressing mechanism for edges.
    pub id: String,
    pub type_name: String,
    pub string_props: BTreeMap<String, Arc<str>>,
    pub numeric_props: BTreeMap<String, f64>,
    pub int_props: BTreeMap<String, i64>,
}

impl Node {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            string_props: BTreeMap::new(),
            numeric_props: BTreeMap::new(),
            int_props: BTreeMap::new(),
        }
    }

    /// Returns the string property `name`, if present.
    pub fn string_prop(&self, name: &str) -> Option<&str> {
        self.string_props.get(name).map(|value| value.as_ref())
    }

    /// Returns `name` as a float, reading numeric then integer columns.
    pub fn numeric_prop(&self, name: &str) -> Option<f64> {
        if let Some(value) = self.numeric_props.get(name) {
            return Some(*value);
        }
        self.int_props.get(name).map(|value| *value as f64)
    }

    /// Renders any typed property to a string, checking the string,
    /// numeric, then integer columns.
    pub fn render_prop(&self, name: &str) -> Option<String> {
        if let Some(value) = self.string_props.get(name) {
            return Some(value.to_string());
        }
        if let Some(value) = self.numeric_props.get(name) {
            return Some(value.to_string());
        }
        self.int_props.get(name).map(|value| value.to_string())
    }
}

/// A typed edge referencing its endpoints weakly by node id.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub type_name: String,
    pub source_node_id: String,
    pub target_node_id: String,
    pub properties: BTreeMap<String, Arc<str>>,
}

/// Aggregate counts over a completed graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub node_count: u64,
    pub edge_count: u64,
    pub nodes_per_type: BTreeMap<String, u64>,
    pub edges_per_type: BTreeMap<String, u64>,
}

/// The self-contained property graph produced by a build.
///
/// Per-type node collections use a `BTreeMap` so observable iteration order
/// is deterministic regardless of insertion order.
#[derive(Debug, Clone)]
pub struct PropertyGraph {
    pub schema: Schema,
    pub nodes_by_type: BTreeMap<String, Vec<Node>>,
    pub edges: Vec<Edge>,
    pub stats: GraphStats,
    node_index: FxHashMap<String, (String, usize)>,
}

impl PropertyGraph {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            nodes_by_type: BTreeMap::new(),
            edges: Vec::new(),
            stats: GraphStats::default(),
            node_index: FxHashMap::default(),
        }
    }

    /// Appends a node to its type collection and indexes it by id.
    pub fn push_node(&mut self, node: Node) {
        let collection = self.nodes_by_type.entry(node.type_name.clone()).or_default();
        self.node_index
            .insert(node.id.clone(), (node.type_name.clone(), collection.len()));
        collection.push(node);
    }

    /// O(1) node lookup by id. `None` for unknown ids, including dangling
    /// edge targets.
    pub fn node(&self, id: &str) -> Option<&Node> {
        let (type_name, index) = self.node_index.get(id)?;
        self.nodes_by_type.get(type_name)?.get(*index)
    }

    /// Mutable node lookup by id.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        let (type_name, index) = self.node_index.get(id)?.clone();
        self.nodes_by_type.get_mut(&type_name)?.get_mut(index)
    }

    /// All nodes of `type_name`, or an empty slice for unknown types.
    pub fn nodes_of_type(&self, type_name: &str) -> &[Node] {
        self.nodes_by_type
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Recomputes aggregate stats in a single pass over the completed
    /// structure. Never maintained incrementally, to avoid drift from
    /// partial updates.
    pub fn recompute_stats(&mut self) {
        let mut stats = GraphStats::default();

        for (type_name, nodes) in &self.nodes_by_type {
            let count = nodes.len() as u64;
            stats.node_count += count;
            stats.nodes_per_type.insert(type_name.clone(), count);
        }
        stats.edge_count = self.edges.len() as u64;
        for edge in &self.edges {
            *stats.edges_per_type.entry(edge.type_name.clone()).or_insert(0) += 1;
        }

        self.stats = stats;
    }

    /// Merges several graphs into a new batch graph without mutating the
    /// inputs.
    ///
    /// Node and edge ids are namespaced as `"<tag>/<id>"` so documents
    /// cannot collide, and every merged node is tagged with its originating
    /// document through a `source_document` string property. The schema is
    /// taken from the first input.
    pub fn merge(inputs: &[(&PropertyGraph, &str)]) -> PropertyGraph {
        let schema = inputs
            .first()
            .map(|(graph, _)| graph.schema.clone())
            .unwrap_or_default();
        let mut merged = PropertyGraph::new(schema);
        let mut pool = StringPool::new();

        for (graph, tag) in inputs {
            let tag_value = pool.intern(tag);
            for nodes in graph.nodes_by_type.values() {
                for node in nodes {
                    let mut copy = node.clone();
                    copy.id = format!("{tag}/{}", node.id);
                    copy.string_props
                        .insert("source_document".to_string(), Arc::clone(&tag_value));
                    merged.push_node(copy);
                }
            }
            for edge in &graph.edges {
                let mut copy = edge.clone();
                copy.id = format!("{tag}/{}", edge.id);
                copy.source_node_id = format!("{tag}/{}", edge.source_node_id);
                copy.target_node_id = format!("{tag}/{}", edge.target_node_id);
                merged.edges.push(copy);
            }
        }

        merged.recompute_stats();
        merged
    }
}
