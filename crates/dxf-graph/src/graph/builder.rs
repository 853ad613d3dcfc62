//! Builds a property graph from a parsed DXF document.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{BuildError, SchemaError};
use crate::graph::{Edge, Node, PropertyGraph, StringPool};
use crate::parser::{self, Block, Document, Entity};
use crate::schema::{self, Schema};

/// DXF reserves group codes 10 through 59 for coordinate and measurement
/// values; they are speculatively typed as floating point.
const NUMERIC_CODE_MIN: i32 = 10;
const NUMERIC_CODE_MAX: i32 = 59;

/// Converts parsed documents into property graphs.
///
/// A builder exclusively owns its string pool and synthetic-id counter for
/// the duration of a build; the returned [`PropertyGraph`] is a
/// self-contained value with no live references back into the builder.
/// Output is deterministic for the same document and schema.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    pool: StringPool,
    synthetic_ids: u64,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a property graph from `document` under `schema`.
    ///
    /// The schema is validated up front; building itself cannot fail.
    pub fn build(
        &mut self,
        document: &Document,
        schema: Schema,
    ) -> Result<PropertyGraph, SchemaError> {
        schema.validate()?;
        let mut graph = PropertyGraph::new(schema);
        let mut edges = Vec::new();

        for entity in &document.entities {
            let node = self.entity_node(entity, None);
            self.collect_reference(entity, &node.id, &mut edges);
            graph.push_node(node);
        }

        for block in &document.blocks {
            for entity in &block.entities {
                let node = self.entity_node(entity, Some(&block.name));
                self.collect_reference(entity, &node.id, &mut edges);
                graph.push_node(node);
            }
            graph.push_node(self.block_node(block));
        }

        // Attach reference edges once every block node exists, so an
        // unresolved target really is unresolved and not just unbuilt yet.
        for edge in edges {
            if graph.node(&edge.target_node_id).is_none() {
                warn!(
                    edge = %edge.id,
                    target = %edge.target_node_id,
                    "block reference does not resolve; keeping dangling edge"
                );
            }
            graph.edges.push(edge);
        }

        graph.recompute_stats();
        debug!(
            nodes = graph.stats.node_count,
            edges = graph.stats.edge_count,
            "built property graph"
        );
        Ok(graph)
    }

    /// Parses `path` and builds its graph under the DXF schema for the
    /// document's declared version.
    pub fn build_from_file(
        &mut self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<PropertyGraph, BuildError> {
        let document = parser::parse_file(path)?;
        let graph = self.build(&document, schema::describe_format(&document.version))?;
        Ok(graph)
    }

    fn entity_node(&mut self, entity: &Entity, owner_block: Option<&str>) -> Node {
        // Entities without an assigned handle still get a node; they just
        // cannot be an edge endpoint by handle.
        let id = if entity.handle.is_empty() {
            self.synthetic_ids += 1;
            format!("entity_{}", self.synthetic_ids)
        } else {
            entity.handle.clone()
        };

        let mut node = Node::new(id, "Entity");
        node.string_props
            .insert("handle".to_string(), self.pool.intern(&entity.handle));
        node.string_props
            .insert("type".to_string(), self.pool.intern(&entity.kind));
        node.string_props
            .insert("layer".to_string(), self.pool.intern(&entity.layer));
        if let Some(owner) = owner_block {
            node.string_props
                .insert("owner_block".to_string(), self.pool.intern(owner));
        }

        // Every group code is retained generically; operations extract
        // semantics later.
        for pair in &entity.data {
            let key = format!("gc_{}", pair.code);
            if (NUMERIC_CODE_MIN..=NUMERIC_CODE_MAX).contains(&pair.code) {
                if let Ok(value) = pair.value.parse::<f64>() {
                    node.numeric_props.insert(key, value);
                    continue;
                }
            }
            node.string_props.insert(key, self.pool.intern(&pair.value));
        }

        node.string_props
            .insert("source_data".to_string(), self.pool.intern(&source_data(entity)));
        node
    }

    fn block_node(&mut self, block: &Block) -> Node {
        let mut node = Node::new(format!("block_{}", block.name), "Block");
        node.string_props
            .insert("name".to_string(), self.pool.intern(&block.name));
        node.string_props
            .insert("handle".to_string(), self.pool.intern(&block.handle));
        node.int_props
            .insert("entity_count".to_string(), block.entities.len() as i64);
        // Placeholder: the divergence analyzer fills this in. Parsing and
        // comparison stay separate concerns.
        node.string_props
            .insert("content_hash".to_string(), self.pool.intern(""));
        node
    }

    /// Queues one REFERENCES edge for an INSERT entity with a non-empty
    /// block-reference value (group code 2).
    fn collect_reference(&mut self, entity: &Entity, node_id: &str, edges: &mut Vec<Edge>) {
        if entity.kind != "INSERT" {
            return;
        }
        let Some(block_name) = entity.string_value(2).filter(|name| !name.is_empty()) else {
            return;
        };

        let mut properties = std::collections::BTreeMap::new();
        properties.insert("block_name".to_string(), self.pool.intern(block_name));
        edges.push(Edge {
            id: format!("edge_{node_id}_ref_{block_name}"),
            type_name: "REFERENCES".to_string(),
            source_node_id: node_id.to_string(),
            target_node_id: format!("block_{block_name}"),
            properties,
        });
    }
}

/// Serializes an entity back into source line form: the kind followed by
/// each code/value pair on their own lines. Values cannot contain newlines
/// in a line-oriented file, so distinct pair sequences always render to
/// distinct strings. This string is the divergence analyzer's hash input.
pub(crate) fn source_data(entity: &Entity) -> String {
    let mut out = String::with_capacity(entity.kind.len() + entity.data.len() * 8);
    out.push_str(&entity.kind);
    for pair in &entity.data {
        out.push('\n');
        out.push_str(&pair.code.to_string());
        out.push('\n');
        out.push_str(&pair.value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use crate::schema::describe_format;

    fn build(src: &str) -> PropertyGraph {
        let document = parse_str(src).unwrap();
        GraphBuilder::new()
            .build(&document, describe_format(&document.version))
            .unwrap()
    }

    #[test]
    fn test_block_and_insert_reference() {
        let src = "0\nSECTION\n2\nBLOCKS\n\
                   0\nBLOCK\n5\nB1\n2\n*U1\n\
                   0\nLINE\n5\nA1\n8\n0\n\
                   0\nENDBLK\n\
                   0\nENDSEC\n\
                   0\nSECTION\n2\nENTITIES\n\
                   0\nINSERT\n5\nA2\n8\n0\n2\n*U1\n\
                   0\nENDSEC\n0\nEOF\n";
        let graph = build(src);

        assert_eq!(graph.nodes_of_type("Block").len(), 1);
        assert_eq!(graph.nodes_of_type("Entity").len(), 2);
        assert_eq!(graph.stats.node_count, 3);

        assert_eq!(graph.edges.len(), 1);
        let edge = &graph.edges[0];
        assert_eq!(edge.type_name, "REFERENCES");
        assert_eq!(edge.source_node_id, "A2");
        assert_eq!(edge.target_node_id, "block_*U1");
        assert_eq!(edge.properties["block_name"].as_ref(), "*U1");

        let block = graph.node("block_*U1").unwrap();
        assert_eq!(block.string_prop("name"), Some("*U1"));
        assert_eq!(block.int_props["entity_count"], 1);
        assert_eq!(block.string_prop("content_hash"), Some(""));

        let nested = graph.node("A1").unwrap();
        assert_eq!(nested.string_prop("owner_block"), Some("*U1"));
    }

    #[test]
    fn test_node_count_invariant() {
        let src = "0\nSECTION\n2\nBLOCKS\n\
                   0\nBLOCK\n5\nB1\n2\nDOOR\n\
                   0\nLINE\n5\nA1\n\
                   0\nLINE\n5\nA2\n\
                   0\nENDBLK\n\
                   0\nENDSEC\n\
                   0\nSECTION\n2\nENTITIES\n\
                   0\nLINE\n5\nA3\n\
                   0\nCIRCLE\n5\nA4\n\
                   0\nENDSEC\n0\nEOF\n";
        let document = parse_str(src).unwrap();
        let graph = GraphBuilder::new()
            .build(&document, describe_format(&document.version))
            .unwrap();

        let entity_total = document.entities.len()
            + document.blocks.iter().map(|b| b.entities.len()).sum::<usize>();
        assert_eq!(
            graph.stats.node_count,
            (entity_total + document.blocks.len()) as u64
        );
        assert_eq!(graph.stats.edge_count, 0);
    }

    #[test]
    fn test_numeric_coercion_range() {
        let src = "0\nSECTION\n2\nENTITIES\n\
                   0\nLINE\n5\nA1\n10\n1.5\n20\nnot_numeric\n70\n3\n\
                   0\nENDSEC\n0\nEOF\n";
        let graph = build(src);
        let node = graph.node("A1").unwrap();

        // In-range and parseable: numeric column.
        assert_eq!(node.numeric_props["gc_10"], 1.5);
        // In-range but unparseable: retained as string, no error.
        assert_eq!(node.string_prop("gc_20"), Some("not_numeric"));
        // Out of range: string even though it looks numeric.
        assert_eq!(node.string_prop("gc_70"), Some("3"));
    }

    #[test]
    fn test_dangling_reference_is_kept() {
        let src = "0\nSECTION\n2\nENTITIES\n\
                   0\nINSERT\n5\nA1\n2\nGHOST\n\
                   0\nENDSEC\n0\nEOF\n";
        let graph = build(src);

        assert_eq!(graph.edges.len(), 1);
        let edge = &graph.edges[0];
        assert_eq!(edge.target_node_id, "block_GHOST");
        assert!(graph.node(&edge.target_node_id).is_none());
    }

    #[test]
    fn test_insert_without_block_name_makes_no_edge() {
        let src = "0\nSECTION\n2\nENTITIES\n\
                   0\nINSERT\n5\nA1\n8\n0\n\
                   0\nENDSEC\n0\nEOF\n";
        let graph = build(src);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_handleless_entity_gets_synthesized_id() {
        let src = "0\nSECTION\n2\nENTITIES\n\
                   0\nPOINT\n8\n0\n10\n1.0\n\
                   0\nPOINT\n8\n0\n10\n2.0\n\
                   0\nENDSEC\n0\nEOF\n";
        let graph = build(src);

        let entities = graph.nodes_of_type("Entity");
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].id, "entity_1");
        assert_eq!(entities[1].id, "entity_2");
        assert_eq!(entities[0].string_prop("handle"), Some(""));
    }

    #[test]
    fn test_interning_shares_instances() {
        let src = "0\nSECTION\n2\nENTITIES\n\
                   0\nLINE\n5\nA1\n8\nWALLS\n\
                   0\nLINE\n5\nA2\n8\nWALLS\n\
                   0\nENDSEC\n0\nEOF\n";
        let graph = build(src);
        let a = &graph.node("A1").unwrap().string_props["layer"];
        let b = &graph.node("A2").unwrap().string_props["layer"];
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn test_build_is_deterministic() {
        let src = "0\nSECTION\n2\nBLOCKS\n\
                   0\nBLOCK\n5\nB1\n2\nDOOR\n0\nLINE\n5\nA1\n0\nENDBLK\n\
                   0\nENDSEC\n\
                   0\nSECTION\n2\nENTITIES\n0\nINSERT\n5\nA2\n2\nDOOR\n0\nENDSEC\n0\nEOF\n";
        let first = build(src);
        let second = build(src);
        assert_eq!(first.stats, second.stats);
        assert_eq!(first.edges, second.edges);
        assert_eq!(first.nodes_by_type, second.nodes_by_type);
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let document = parse_str("0\nEOF\n").unwrap();
        let schema = Schema::default();
        let err = GraphBuilder::new().build(&document, schema).unwrap_err();
        assert!(!err.violations.is_empty());
    }

    #[test]
    fn test_source_data_round_trips_order() {
        let document = parse_str(
            "0\nSECTION\n2\nENTITIES\n0\nLINE\n5\nA1\n10\n1.5\n10\n2.5\n0\nENDSEC\n0\nEOF\n",
        )
        .unwrap();
        // Duplicate codes are preserved in order in the hash input, even
        // though the property map keeps only one.
        assert_eq!(source_data(&document.entities[0]), "LINE\n5\nA1\n10\n1.5\n10\n2.5");
    }
}
