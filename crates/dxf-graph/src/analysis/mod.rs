//! Cross-document block divergence analysis.
//!
//! Engineering drawings reuse named blocks; two revisions of the "same"
//! block can silently drift apart. This module fingerprints each block's
//! content with a SHA-256 hash, compares the fingerprints across a batch of
//! documents, and reports every block name whose content differs between
//! documents. Hashing is order-independent: entities are sorted by handle
//! before they enter the digest, so a pure reordering of a block's entities
//! is not a divergence.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::BuildError;
use crate::graph::builder::GraphBuilder;
use crate::graph::PropertyGraph;
use crate::parser;
use crate::schema;

/// One document's sighting of a block content variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOccurrence {
    /// Document tag (usually the file path).
    pub document: String,
    /// How many INSERT references in that document point at the block.
    pub reference_count: u64,
}

/// One distinct content variant of a block and where it appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashGroup {
    pub content_hash: String,
    pub occurrences: Vec<BlockOccurrence>,
}

/// All content variants seen for one block name across the batch.
///
/// A block is divergent exactly when it has more than one hash group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockComparison {
    pub name: String,
    pub groups: Vec<HashGroup>,
}

impl BlockComparison {
    pub fn is_divergent(&self) -> bool {
        self.groups.len() > 1
    }
}

/// Batch-level divergence report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockDivergenceReport {
    pub documents_analyzed: u64,
    pub total_block_names: u64,
    pub consistent_count: u64,
    /// Only the divergent blocks, ordered by name.
    pub divergent: Vec<BlockComparison>,
}

impl BlockDivergenceReport {
    pub fn divergent_count(&self) -> u64 {
        self.divergent.len() as u64
    }

    pub fn is_consistent(&self) -> bool {
        self.divergent.is_empty()
    }
}

/// Computes the content hash of the named block in `graph`, or `None` if no
/// such block node exists.
///
/// The digest covers each member entity's full source data, sorted by
/// handle so entity order in the file does not matter, with each record
/// length-framed so distinct entity sequences cannot collide by
/// concatenation. An empty block hashes validly (the digest of no records).
pub fn block_content_hash(graph: &PropertyGraph, block_name: &str) -> Option<String> {
    graph.node(&format!("block_{block_name}"))?;

    let mut members: Vec<(&str, &str)> = graph
        .nodes_of_type("Entity")
        .iter()
        .filter(|node| node.string_prop("owner_block") == Some(block_name))
        .map(|node| {
            (
                node.string_prop("handle").unwrap_or_default(),
                node.string_prop("source_data").unwrap_or_default(),
            )
        })
        .collect();
    // Handle, then full content as the tie-break for handleless entities.
    members.sort_unstable();

    let mut hasher = Sha256::new();
    for (_, source_data) in &members {
        hasher.update((source_data.len() as u64).to_le_bytes());
        hasher.update(source_data.as_bytes());
    }

    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    Some(hex)
}

/// Fills in the `content_hash` property of every Block node in `graph`.
pub fn annotate_content_hashes(graph: &mut PropertyGraph) {
    let names: Vec<String> = graph
        .nodes_of_type("Block")
        .iter()
        .filter_map(|node| node.string_prop("name").map(str::to_string))
        .collect();

    for name in names {
        if let Some(hash) = block_content_hash(graph, &name) {
            if let Some(node) = graph.node_mut(&format!("block_{name}")) {
                node.string_props
                    .insert("content_hash".to_string(), Arc::from(hash.as_str()));
            }
        }
    }
}

/// Compares block content across already-built graphs.
///
/// Each input is a graph plus its document tag. The result is fully
/// deterministic: blocks, hash groups, and occurrences are all emitted in
/// sorted order.
pub fn analyze_drawings(inputs: &[(&PropertyGraph, &str)]) -> BlockDivergenceReport {
    // block name -> content hash -> document -> reference count
    let mut by_name: BTreeMap<String, BTreeMap<String, BTreeMap<String, u64>>> = BTreeMap::new();

    for (graph, document) in inputs {
        let mut references: BTreeMap<&str, u64> = BTreeMap::new();
        for edge in &graph.edges {
            if edge.type_name == "REFERENCES" {
                *references.entry(edge.target_node_id.as_str()).or_insert(0) += 1;
            }
        }

        for block in graph.nodes_of_type("Block") {
            let Some(name) = block.string_prop("name") else {
                continue;
            };
            let Some(hash) = block_content_hash(graph, name) else {
                continue;
            };
            let count = references.get(block.id.as_str()).copied().unwrap_or(0);
            by_name
                .entry(name.to_string())
                .or_default()
                .entry(hash)
                .or_default()
                .insert((*document).to_string(), count);
        }
    }

    let mut report = BlockDivergenceReport {
        documents_analyzed: inputs.len() as u64,
        total_block_names: by_name.len() as u64,
        ..BlockDivergenceReport::default()
    };

    for (name, hashes) in by_name {
        if hashes.len() <= 1 {
            report.consistent_count += 1;
            continue;
        }
        let groups = hashes
            .into_iter()
            .map(|(content_hash, documents)| HashGroup {
                content_hash,
                occurrences: documents
                    .into_iter()
                    .map(|(document, reference_count)| BlockOccurrence {
                        document,
                        reference_count,
                    })
                    .collect(),
            })
            .collect();
        report.divergent.push(BlockComparison { name, groups });
    }

    debug!(
        documents = report.documents_analyzed,
        blocks = report.total_block_names,
        divergent = report.divergent.len(),
        "block divergence analysis complete"
    );
    report
}

/// Parses and analyzes a batch of DXF files.
///
/// Per-document parsing and graph building run in parallel; the
/// cross-document comparison itself is a single cheap pass. The first
/// document that fails to parse aborts the batch.
pub fn analyze_paths<P: AsRef<Path> + Sync>(
    paths: &[P],
) -> Result<BlockDivergenceReport, BuildError> {
    let graphs: Vec<(PropertyGraph, String)> = paths
        .par_iter()
        .map(|path| {
            let document = parser::parse_file(path)?;
            let mut graph = GraphBuilder::new()
                .build(&document, schema::describe_format(&document.version))?;
            annotate_content_hashes(&mut graph);
            Ok((graph, path.as_ref().display().to_string()))
        })
        .collect::<Result<_, BuildError>>()?;

    let inputs: Vec<(&PropertyGraph, &str)> = graphs
        .iter()
        .map(|(graph, tag)| (graph, tag.as_str()))
        .collect();
    Ok(analyze_drawings(&inputs))
}
