//! Generic, schema-discovered operations over a property graph.
//!
//! Each of the eight operation kinds is a declarative query step executed
//! read-only against a [`PropertyGraph`]. The engine uses only the
//! capability flags exposed by the schema, never hard-coded per-format
//! rules, and every result carries provenance tracing outputs back to
//! concrete node/edge identifiers.

use std::collections::BTreeMap;
use std::str::FromStr;

use rustc_hash::FxHashSet;

use crate::error::OperationError;
use crate::graph::{Node, PropertyGraph};

/// The eight operation kinds.
///
/// A closed set: dispatch is an exhaustive match, so adding a ninth kind is
/// a compile-time-checked change, not a silent default-case fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Match,
    Filter,
    Compare,
    Traverse,
    Aggregate,
    GroupBy,
    Project,
    Join,
}

impl OperationKind {
    /// The external wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Match => "MATCH",
            OperationKind::Filter => "FILTER",
            OperationKind::Compare => "COMPARE",
            OperationKind::Traverse => "TRAVERSE",
            OperationKind::Aggregate => "AGGREGATE",
            OperationKind::GroupBy => "GROUP_BY",
            OperationKind::Project => "PROJECT",
            OperationKind::Join => "JOIN",
        }
    }
}

impl FromStr for OperationKind {
    type Err = OperationError;

    /// Maps an external operation name to a kind. Unknown names are a hard
    /// [`OperationError::UnknownKind`]; there is no fallback behavior.
    fn from_str(s: &str) -> Result<Self, OperationError> {
        match s {
            "MATCH" => Ok(OperationKind::Match),
            "FILTER" => Ok(OperationKind::Filter),
            "COMPARE" => Ok(OperationKind::Compare),
            "TRAVERSE" => Ok(OperationKind::Traverse),
            "AGGREGATE" => Ok(OperationKind::Aggregate),
            "GROUP_BY" => Ok(OperationKind::GroupBy),
            "PROJECT" => Ok(OperationKind::Project),
            "JOIN" => Ok(OperationKind::Join),
            other => Err(OperationError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// A single declarative query step. Parameters are operation-specific and
/// validated per kind at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub target_type: String,
    pub property_name: String,
    pub parameters: BTreeMap<String, String>,
}

impl Operation {
    pub fn new(kind: OperationKind, target_type: impl Into<String>) -> Self {
        Self {
            kind,
            target_type: target_type.into(),
            property_name: String::new(),
            parameters: BTreeMap::new(),
        }
    }

    /// Sets the property the operation acts on.
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.property_name = name.into();
        self
    }

    /// Adds one operation-specific parameter.
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    fn required(&self, key: &'static str) -> Result<&str, OperationError> {
        self.parameters
            .get(key)
            .map(String::as_str)
            .ok_or(OperationError::MissingParameter {
                kind: self.kind.as_str(),
                parameter: key,
            })
    }

    fn optional(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// Result of executing one operation.
///
/// `provenance` lets a caller trace every output back to concrete source
/// node/edge identifiers. `nodes_processed` reports scan cost: for node
/// scans it is the target type's total node count even on an early match,
/// for edge scans the number of edges of the requested type examined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationResult {
    pub node_ids: Vec<String>,
    pub provenance: Vec<String>,
    pub values: BTreeMap<String, String>,
    pub nodes_processed: u64,
}

/// Executes one operation against a graph.
///
/// Read-only: the graph is never mutated, and failures are reported
/// synchronously, never swallowed.
pub fn execute(graph: &PropertyGraph, op: &Operation) -> Result<OperationResult, OperationError> {
    match op.kind {
        OperationKind::Match => match_first(graph, op),
        OperationKind::Filter => filter(graph, op),
        OperationKind::Compare => compare(graph, op),
        OperationKind::Traverse => traverse(graph, op),
        OperationKind::Aggregate => aggregate(graph, op),
        OperationKind::GroupBy => group_by(graph, op),
        OperationKind::Project => project(graph, op),
        OperationKind::Join => join(graph, op),
    }
}

/// Resolves the operation's target node set, requiring the type to be
/// declared in the graph's schema.
fn target_nodes<'a>(
    graph: &'a PropertyGraph,
    op: &Operation,
) -> Result<&'a [Node], OperationError> {
    if graph.schema.node_type(&op.target_type).is_none() {
        return Err(OperationError::UnknownTargetType {
            type_name: op.target_type.clone(),
        });
    }
    Ok(graph.nodes_of_type(&op.target_type))
}

/// MATCH: first node whose string property equals the given value.
///
/// The schema marks matchable properties unique, so "first" and "only"
/// coincide on a well-formed graph. On a malformed graph with duplicate
/// "unique" values this policy silently picks the first in document order.
fn match_first(graph: &PropertyGraph, op: &Operation) -> Result<OperationResult, OperationError> {
    let value = op.required("value")?;
    let nodes = target_nodes(graph, op)?;

    let mut result = OperationResult {
        nodes_processed: nodes.len() as u64,
        ..OperationResult::default()
    };

    if let Some(node) = nodes
        .iter()
        .find(|node| node.string_prop(&op.property_name) == Some(value))
    {
        result.node_ids.push(node.id.clone());
        result
            .values
            .insert("node_id".to_string(), node.id.clone());
        result.provenance.push(format!(
            "MATCH {}.{} == {:?} -> {}",
            op.target_type, op.property_name, value, node.id
        ));
    }

    Ok(result)
}

/// FILTER: every node matching `property operator value`.
fn filter(graph: &PropertyGraph, op: &Operation) -> Result<OperationResult, OperationError> {
    let value = op.required("value")?;
    let operator = op.optional("operator").unwrap_or("EQUALS");
    let nodes = target_nodes(graph, op)?;
    let numeric_value: Option<f64> = value.parse().ok();

    let mut result = OperationResult {
        nodes_processed: nodes.len() as u64,
        ..OperationResult::default()
    };

    for node in nodes {
        let string_prop = node.string_prop(&op.property_name);
        let numeric_prop = node.numeric_prop(&op.property_name);

        let matched = match operator {
            "EQUALS" => {
                string_prop == Some(value)
                    || matches!(
                        (numeric_prop, numeric_value),
                        (Some(a), Some(b)) if a == b
                    )
            }
            "CONTAINS" => string_prop.is_some_and(|prop| prop.contains(value)),
            "GREATER_THAN" => {
                matches!((numeric_prop, numeric_value), (Some(a), Some(b)) if a > b)
            }
            "LESS_THAN" => {
                matches!((numeric_prop, numeric_value), (Some(a), Some(b)) if a < b)
            }
            // Unrecognized operators match nothing. Explicit policy, kept
            // pending product-level confirmation.
            _ => false,
        };

        if matched {
            result.provenance.push(format!(
                "FILTER {}.{} {} {:?} -> {}",
                op.target_type, op.property_name, operator, value, node.id
            ));
            result.node_ids.push(node.id.clone());
        }
    }

    Ok(result)
}

/// COMPARE: diffs one property between two explicitly identified nodes.
fn compare(graph: &PropertyGraph, op: &Operation) -> Result<OperationResult, OperationError> {
    let a_id = op.required("node_a")?;
    let b_id = op.required("node_b")?;

    let a = graph.node(a_id).ok_or_else(|| OperationError::NodeNotFound {
        id: a_id.to_string(),
    })?;
    let b = graph.node(b_id).ok_or_else(|| OperationError::NodeNotFound {
        id: b_id.to_string(),
    })?;

    let value_a = a.render_prop(&op.property_name).unwrap_or_default();
    let value_b = b.render_prop(&op.property_name).unwrap_or_default();
    let equal = value_a == value_b;

    let mut result = OperationResult {
        node_ids: vec![a.id.clone(), b.id.clone()],
        nodes_processed: 2,
        ..OperationResult::default()
    };
    result.values.insert("a".to_string(), value_a.clone());
    result.values.insert("b".to_string(), value_b.clone());
    result.values.insert("equal".to_string(), equal.to_string());
    result.provenance.push(format!(
        "COMPARE {}: {}.{} = {:?} vs {}.{} = {:?}",
        op.property_name, a.id, op.property_name, value_a, b.id, op.property_name, value_b
    ));

    Ok(result)
}

/// TRAVERSE: target ids of every matching edge, optionally restricted to a
/// set of source ids.
fn traverse(graph: &PropertyGraph, op: &Operation) -> Result<OperationResult, OperationError> {
    let edge_type = op.required("edge_type")?;
    let restriction: Option<FxHashSet<&str>> = op.optional("start_node_ids").map(|csv| {
        csv.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect()
    });

    let mut result = OperationResult::default();
    for edge in &graph.edges {
        if edge.type_name != edge_type {
            continue;
        }
        result.nodes_processed += 1;

        if let Some(sources) = &restriction {
            if !sources.contains(edge.source_node_id.as_str()) {
                continue;
            }
        }

        result.node_ids.push(edge.target_node_id.clone());
        result.provenance.push(format!(
            "TRAVERSE {}: {} -[{}]-> {}",
            edge.id, edge.source_node_id, edge.type_name, edge.target_node_id
        ));
        for (key, value) in &edge.properties {
            result
                .values
                .insert(format!("{}.{}", edge.target_node_id, key), value.to_string());
        }
    }

    Ok(result)
}

enum AggregateFn {
    Count,
    Sum,
    Avg,
}

/// AGGREGATE: COUNT/SUM/AVG over a property, or grouped counts.
fn aggregate(graph: &PropertyGraph, op: &Operation) -> Result<OperationResult, OperationError> {
    let function = match op.required("function")? {
        "COUNT" => AggregateFn::Count,
        "SUM" => AggregateFn::Sum,
        "AVG" => AggregateFn::Avg,
        other => {
            return Err(OperationError::UnknownFunction {
                function: other.to_string(),
            });
        }
    };
    let nodes = target_nodes(graph, op)?;

    let mut result = OperationResult {
        nodes_processed: nodes.len() as u64,
        ..OperationResult::default()
    };

    // The grouping path always counts: one bucket per distinct value of
    // the grouping property. Nodes lacking the property group under a
    // literal "unknown" bucket.
    if let Some(group_prop) = op.optional("group_by") {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for node in nodes {
            let bucket = node
                .render_prop(group_prop)
                .unwrap_or_else(|| "unknown".to_string());
            *counts.entry(bucket).or_insert(0) += 1;
            result.node_ids.push(node.id.clone());
        }
        result.provenance.push(format!(
            "AGGREGATE COUNT over {} grouped by {} ({} buckets)",
            op.target_type,
            group_prop,
            counts.len()
        ));
        for (bucket, count) in counts {
            result.values.insert(bucket, count.to_string());
        }
        return Ok(result);
    }

    // Scalar path: nodes missing the property are skipped.
    let mut samples = Vec::new();
    for node in nodes {
        if let Some(value) = node.numeric_prop(&op.property_name) {
            samples.push(value);
            result.node_ids.push(node.id.clone());
        }
    }
    let sum: f64 = samples.iter().sum();

    match function {
        AggregateFn::Count => {
            // With no property named, COUNT covers the whole type.
            let count = if op.property_name.is_empty() {
                result.node_ids = nodes.iter().map(|node| node.id.clone()).collect();
                nodes.len()
            } else {
                samples.len()
            };
            result.values.insert("count".to_string(), count.to_string());
        }
        AggregateFn::Sum => {
            result.values.insert("sum".to_string(), sum.to_string());
        }
        AggregateFn::Avg => {
            let avg = if samples.is_empty() { 0.0 } else { sum / samples.len() as f64 };
            result.values.insert("avg".to_string(), avg.to_string());
        }
    }
    result.provenance.push(format!(
        "AGGREGATE over {}.{}: {} values",
        op.target_type,
        op.property_name,
        samples.len()
    ));

    Ok(result)
}

/// GROUP_BY: node-id buckets keyed by a property value, so a caller can
/// fetch full groups rather than aggregates.
fn group_by(graph: &PropertyGraph, op: &Operation) -> Result<OperationResult, OperationError> {
    let nodes = target_nodes(graph, op)?;

    let mut result = OperationResult {
        nodes_processed: nodes.len() as u64,
        ..OperationResult::default()
    };

    let mut buckets: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for node in nodes {
        let bucket = node
            .render_prop(&op.property_name)
            .unwrap_or_else(|| "unknown".to_string());
        buckets.entry(bucket).or_default().push(node.id.as_str());
        result.node_ids.push(node.id.clone());
    }

    for (bucket, ids) in buckets {
        result.provenance.push(format!(
            "GROUP_BY {}.{}: bucket {:?} has {} nodes",
            op.target_type,
            op.property_name,
            bucket,
            ids.len()
        ));
        result.values.insert(bucket, ids.join(","));
    }

    Ok(result)
}

/// PROJECT: only the requested property subset per node.
fn project(graph: &PropertyGraph, op: &Operation) -> Result<OperationResult, OperationError> {
    let wanted: Vec<&str> = op
        .required("properties")?
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    let nodes = target_nodes(graph, op)?;

    let mut result = OperationResult {
        nodes_processed: nodes.len() as u64,
        ..OperationResult::default()
    };

    for node in nodes {
        result.node_ids.push(node.id.clone());
        for name in &wanted {
            if let Some(value) = node.render_prop(name) {
                result
                    .values
                    .insert(format!("{}.{}", node.id, name), value);
            }
        }
    }
    result.provenance.push(format!(
        "PROJECT {} properties [{}] over {} nodes",
        op.target_type,
        wanted.join(", "),
        nodes.len()
    ));

    Ok(result)
}

/// JOIN: combines the target-type node set with edge targets via a named
/// edge type, a graph-native equi-join.
fn join(graph: &PropertyGraph, op: &Operation) -> Result<OperationResult, OperationError> {
    let edge_type = op.required("edge_type")?;
    let left: FxHashSet<&str> = target_nodes(graph, op)?
        .iter()
        .map(|node| node.id.as_str())
        .collect();

    let mut result = OperationResult::default();
    for edge in &graph.edges {
        if edge.type_name != edge_type {
            continue;
        }
        result.nodes_processed += 1;

        if !left.contains(edge.source_node_id.as_str()) {
            continue;
        }
        match graph.node(&edge.target_node_id) {
            Some(target) => {
                result
                    .values
                    .insert(edge.source_node_id.clone(), target.id.clone());
                result.node_ids.push(edge.source_node_id.clone());
                result.node_ids.push(target.id.clone());
                result.provenance.push(format!(
                    "JOIN {}: {} -[{}]-> {}",
                    edge.id, edge.source_node_id, edge_type, target.id
                ));
            }
            // An unresolved target is a reportable condition, not a crash.
            None => result.provenance.push(format!(
                "JOIN {}: target {} unresolved",
                edge.id, edge.target_node_id
            )),
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::GraphBuilder;
    use crate::parser::parse_str;
    use crate::schema::describe_format;

    fn sample_graph() -> PropertyGraph {
        let src = "0\nSECTION\n2\nBLOCKS\n\
                   0\nBLOCK\n5\nB1\n2\nDOOR\n\
                   0\nLINE\n5\nE1\n8\n0\n\
                   0\nENDBLK\n\
                   0\nENDSEC\n\
                   0\nSECTION\n2\nENTITIES\n\
                   0\nLINE\n5\nA1\n8\nWALLS\n10\n1.0\n\
                   0\nLINE\n5\nA2\n8\nWALLS\n10\n3.0\n\
                   0\nINSERT\n5\nA3\n8\nFIXTURES\n2\nDOOR\n\
                   0\nINSERT\n5\nA4\n8\nFIXTURES\n2\nDOOR\n\
                   0\nENDSEC\n0\nEOF\n";
        let document = parse_str(src).unwrap();
        GraphBuilder::new()
            .build(&document, describe_format(&document.version))
            .unwrap()
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            OperationKind::Match,
            OperationKind::Filter,
            OperationKind::Compare,
            OperationKind::Traverse,
            OperationKind::Aggregate,
            OperationKind::GroupBy,
            OperationKind::Project,
            OperationKind::Join,
        ] {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_hard_error() {
        let err = "EXPLODE".parse::<OperationKind>().unwrap_err();
        assert_eq!(
            err,
            OperationError::UnknownKind {
                kind: "EXPLODE".to_string()
            }
        );
    }

    #[test]
    fn test_match_returns_first_only() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Match, "Entity")
            .property("handle")
            .parameter("value", "A2");
        let result = execute(&graph, &op).unwrap();

        assert_eq!(result.node_ids, vec!["A2".to_string()]);
        // Cost visibility: full type scan reported even on early match.
        assert_eq!(result.nodes_processed, 5);
        assert!(result.provenance[0].contains("A2"));
    }

    #[test]
    fn test_match_no_hit_is_empty_not_error() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Match, "Entity")
            .property("handle")
            .parameter("value", "ZZ");
        let result = execute(&graph, &op).unwrap();
        assert!(result.node_ids.is_empty());
    }

    #[test]
    fn test_match_requires_value() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Match, "Entity").property("handle");
        let err = execute(&graph, &op).unwrap_err();
        assert_eq!(
            err,
            OperationError::MissingParameter {
                kind: "MATCH",
                parameter: "value"
            }
        );
    }

    #[test]
    fn test_filter_equals_exact_set() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Filter, "Entity")
            .property("type")
            .parameter("value", "INSERT");
        let result = execute(&graph, &op).unwrap();

        assert_eq!(result.node_ids, vec!["A3".to_string(), "A4".to_string()]);
        assert_eq!(result.nodes_processed, 5);
    }

    #[test]
    fn test_filter_contains() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Filter, "Entity")
            .property("layer")
            .parameter("value", "ALL")
            .parameter("operator", "CONTAINS");
        let result = execute(&graph, &op).unwrap();
        assert_eq!(result.node_ids, vec!["A1".to_string(), "A2".to_string()]);
    }

    #[test]
    fn test_filter_numeric_comparison() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Filter, "Entity")
            .property("gc_10")
            .parameter("value", "2.0")
            .parameter("operator", "GREATER_THAN");
        let result = execute(&graph, &op).unwrap();
        assert_eq!(result.node_ids, vec!["A2".to_string()]);

        let op = Operation::new(OperationKind::Filter, "Entity")
            .property("gc_10")
            .parameter("value", "2.0")
            .parameter("operator", "LESS_THAN");
        let result = execute(&graph, &op).unwrap();
        assert_eq!(result.node_ids, vec!["A1".to_string()]);
    }

    #[test]
    fn test_filter_unsupported_operator_matches_nothing() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Filter, "Entity")
            .property("type")
            .parameter("value", "LINE")
            .parameter("operator", "REGEX");
        let result = execute(&graph, &op).unwrap();
        assert!(result.node_ids.is_empty());
        assert_eq!(result.nodes_processed, 5);
    }

    #[test]
    fn test_filter_unknown_target_type() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Filter, "Widget")
            .property("type")
            .parameter("value", "LINE");
        let err = execute(&graph, &op).unwrap_err();
        assert_eq!(
            err,
            OperationError::UnknownTargetType {
                type_name: "Widget".to_string()
            }
        );
    }

    #[test]
    fn test_traverse_references() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Traverse, "Entity")
            .parameter("edge_type", "REFERENCES");
        let result = execute(&graph, &op).unwrap();

        assert_eq!(
            result.node_ids,
            vec!["block_DOOR".to_string(), "block_DOOR".to_string()]
        );
        assert_eq!(result.nodes_processed, 2);
        // Edge properties folded in, keyed by target id.
        assert_eq!(result.values["block_DOOR.block_name"], "DOOR");
    }

    #[test]
    fn test_traverse_with_start_restriction() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Traverse, "Entity")
            .parameter("edge_type", "REFERENCES")
            .parameter("start_node_ids", "A3, A9");
        let result = execute(&graph, &op).unwrap();
        assert_eq!(result.node_ids, vec!["block_DOOR".to_string()]);
    }

    #[test]
    fn test_aggregate_count_group_by_partitions() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Aggregate, "Entity")
            .parameter("function", "COUNT")
            .parameter("group_by", "layer");
        let result = execute(&graph, &op).unwrap();

        assert_eq!(result.values["WALLS"], "2");
        assert_eq!(result.values["FIXTURES"], "2");
        assert_eq!(result.values["0"], "1");
        // Every node lands in exactly one bucket.
        let total: u64 = result.values.values().map(|v| v.parse::<u64>().unwrap()).sum();
        assert_eq!(total, result.nodes_processed);
    }

    #[test]
    fn test_aggregate_group_by_unknown_bucket() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Aggregate, "Entity")
            .parameter("function", "COUNT")
            .parameter("group_by", "gc_10");
        let result = execute(&graph, &op).unwrap();
        // A1 and A2 carry gc_10; the other three bucket under "unknown".
        assert_eq!(result.values["unknown"], "3");
    }

    #[test]
    fn test_aggregate_scalars() {
        let graph = sample_graph();
        let sum_op = Operation::new(OperationKind::Aggregate, "Entity")
            .property("gc_10")
            .parameter("function", "SUM");
        assert_eq!(execute(&graph, &sum_op).unwrap().values["sum"], "4");

        let avg_op = Operation::new(OperationKind::Aggregate, "Entity")
            .property("gc_10")
            .parameter("function", "AVG");
        assert_eq!(execute(&graph, &avg_op).unwrap().values["avg"], "2");

        let count_op = Operation::new(OperationKind::Aggregate, "Entity")
            .property("gc_10")
            .parameter("function", "COUNT");
        assert_eq!(execute(&graph, &count_op).unwrap().values["count"], "2");
    }

    #[test]
    fn test_aggregate_unknown_function() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Aggregate, "Entity")
            .parameter("function", "MEDIAN");
        let err = execute(&graph, &op).unwrap_err();
        assert_eq!(
            err,
            OperationError::UnknownFunction {
                function: "MEDIAN".to_string()
            }
        );
    }

    #[test]
    fn test_compare_nodes() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Compare, "Entity")
            .property("layer")
            .parameter("node_a", "A1")
            .parameter("node_b", "A2");
        let result = execute(&graph, &op).unwrap();
        assert_eq!(result.values["equal"], "true");
        assert_eq!(result.values["a"], "WALLS");

        let op = Operation::new(OperationKind::Compare, "Entity")
            .property("layer")
            .parameter("node_a", "A1")
            .parameter("node_b", "A3");
        let result = execute(&graph, &op).unwrap();
        assert_eq!(result.values["equal"], "false");
        assert_eq!(result.values["b"], "FIXTURES");
    }

    #[test]
    fn test_compare_missing_node() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Compare, "Entity")
            .property("layer")
            .parameter("node_a", "A1")
            .parameter("node_b", "ZZ");
        let err = execute(&graph, &op).unwrap_err();
        assert_eq!(err, OperationError::NodeNotFound { id: "ZZ".to_string() });
    }

    #[test]
    fn test_group_by_returns_buckets_of_ids() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::GroupBy, "Entity").property("layer");
        let result = execute(&graph, &op).unwrap();
        assert_eq!(result.values["WALLS"], "A1,A2");
        assert_eq!(result.values["FIXTURES"], "A3,A4");
    }

    #[test]
    fn test_project_subset() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Project, "Entity")
            .parameter("properties", "handle, layer");
        let result = execute(&graph, &op).unwrap();

        assert_eq!(result.values["A1.handle"], "A1");
        assert_eq!(result.values["A1.layer"], "WALLS");
        // Unrequested properties are absent from the payload.
        assert!(!result.values.contains_key("A1.type"));
    }

    #[test]
    fn test_join_over_edge_type() {
        let graph = sample_graph();
        let op = Operation::new(OperationKind::Join, "Entity")
            .parameter("edge_type", "REFERENCES");
        let result = execute(&graph, &op).unwrap();
        assert_eq!(result.values["A3"], "block_DOOR");
        assert_eq!(result.values["A4"], "block_DOOR");
    }

    #[test]
    fn test_join_reports_unresolved_target() {
        let src = "0\nSECTION\n2\nENTITIES\n\
                   0\nINSERT\n5\nA1\n2\nGHOST\n\
                   0\nENDSEC\n0\nEOF\n";
        let document = parse_str(src).unwrap();
        let graph = GraphBuilder::new()
            .build(&document, describe_format(""))
            .unwrap();

        let op = Operation::new(OperationKind::Join, "Entity")
            .parameter("edge_type", "REFERENCES");
        let result = execute(&graph, &op).unwrap();
        assert!(result.node_ids.is_empty());
        assert!(result.provenance[0].contains("unresolved"));
    }
}
