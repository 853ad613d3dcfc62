//! dxf-graph: Property graph extraction and analysis for DXF drawings.
//!
//! This crate parses the DXF text format (the line-oriented group-code
//! exchange format for engineering drawings), lifts each document into a
//! typed property graph, and runs schema-driven operations and
//! cross-document analyses over the result.
//!
//! # Overview
//!
//! The pipeline has four stages:
//! - **Parse**: [`parser`] turns raw group-code text into a structured
//!   [`parser::Document`] of entities and block definitions
//! - **Build**: [`graph::builder::GraphBuilder`] converts a document into a
//!   [`graph::PropertyGraph`] with interned strings and typed properties
//! - **Query**: [`ops`] executes eight declarative operations (match,
//!   filter, compare, traverse, aggregate, group-by, project, join) driven
//!   entirely by the schema's capability flags
//! - **Analyze**: [`analysis`] fingerprints block content with SHA-256 and
//!   reports blocks whose content diverges across a batch of documents
//!
//! # Quick Start
//!
//! ```rust
//! use dxf_graph::{execute, parse_str, GraphBuilder, Operation, OperationKind};
//! use dxf_graph::schema::describe_format;
//!
//! let src = "0\nSECTION\n2\nENTITIES\n\
//!            0\nLINE\n5\nA1\n8\nWALLS\n\
//!            0\nCIRCLE\n5\nA2\n8\nWALLS\n\
//!            0\nENDSEC\n0\nEOF\n";
//! let document = parse_str(src).unwrap();
//! let graph = GraphBuilder::new()
//!     .build(&document, describe_format(&document.version))
//!     .unwrap();
//!
//! let op = Operation::new(OperationKind::Filter, "Entity")
//!     .property("type")
//!     .parameter("value", "LINE");
//! let result = execute(&graph, &op).unwrap();
//! assert_eq!(result.node_ids, vec!["A1".to_string()]);
//! ```
//!
//! # Modules
//!
//! - [`parser`]: DXF group-code text parsing
//! - [`schema`]: Node/edge type declarations with capability flags
//! - [`graph`]: Property graph model, string interning, graph builder
//! - [`ops`]: The eight schema-driven operations
//! - [`analysis`]: Cross-document block divergence detection
//! - [`error`]: Error types

pub mod analysis;
pub mod error;
pub mod graph;
pub mod ops;
pub mod parser;
pub mod schema;

// Re-export commonly used types at crate root
pub use analysis::{
    analyze_drawings, analyze_paths, annotate_content_hashes, block_content_hash,
    BlockComparison, BlockDivergenceReport, BlockOccurrence, HashGroup,
};
pub use error::{BuildError, OperationError, ParseError, SchemaError};
pub use graph::builder::GraphBuilder;
pub use graph::{Edge, GraphStats, Node, PropertyGraph, StringPool};
pub use ops::{execute, Operation, OperationKind, OperationResult};
pub use parser::{parse_file, parse_str, Block, Document, Entity, GroupPair};
pub use schema::{describe_format, Capability, PropertyMeta, PropertyType, Schema};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
