//! Error types for parsing, schema validation, and operation execution.

use thiserror::Error;

/// Error while parsing a DXF text stream.
///
/// Recoverable conditions (unknown sections, absent header variables,
/// unparseable optional numeric fields) are handled inside the parser and
/// never surface here; these variants are structural violations that abort
/// the parse, plus the strict-read accessor failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("cannot open file {path}: {message}")]
    FileNotFound { path: String, message: String },

    #[error("invalid group code {text:?} at line {line}")]
    InvalidGroupCode { line: u64, text: String },

    #[error("truncated record: group code at line {line} has no value line")]
    TruncatedRecord { line: u64 },

    #[error("expected group code {expected} after {context} at line {line}, got {found}")]
    UnexpectedCode {
        context: &'static str,
        expected: i32,
        found: i32,
        line: u64,
    },

    #[error("group code {code} not found in {kind} entity")]
    CodeNotFound { code: i32, kind: String },

    #[error("cannot convert {value:?} (group code {code}) to {target}")]
    InvalidNumber {
        code: i32,
        value: String,
        target: &'static str,
    },
}

/// Aggregate schema validation error.
///
/// Every violation found in one validation pass is reported together,
/// instead of failing on the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid schema: {}", violations.join("; "))]
pub struct SchemaError {
    /// One human-readable message per violation.
    pub violations: Vec<String>,
}

/// Error while executing an operation against a property graph.
///
/// Operations are read-only: an error never leaves the graph partially
/// mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("unknown operation kind {kind:?}")]
    UnknownKind { kind: String },

    #[error("{kind} operation requires parameter {parameter:?}")]
    MissingParameter {
        kind: &'static str,
        parameter: &'static str,
    },

    #[error("unknown aggregate function {function:?} (expected COUNT, SUM, or AVG)")]
    UnknownFunction { function: String },

    #[error("node type {type_name:?} is not declared in the schema")]
    UnknownTargetType { type_name: String },

    #[error("node {id:?} not found in graph")]
    NodeNotFound { id: String },
}

/// Error from the parse-then-build pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
