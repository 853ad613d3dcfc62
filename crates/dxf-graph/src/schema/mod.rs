//! Schema registry: a static description of node/edge types and per-property
//! capability flags.
//!
//! The operation engine never hard-codes per-format rules; it consults the
//! four capability flags (`unique`, `comparable`, `indexed`, `aggregable`)
//! declared here to decide which operations are legal against a property.
//! [`describe_format`] is pure and deterministic: the same format version
//! always yields the same schema value, with no I/O.

use rustc_hash::FxHashSet;

use crate::error::SchemaError;

/// Property value type as declared in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Double,
    Int,
}

/// Capability flags a property can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// At most one node per value; enables MATCH.
    Unique,
    /// Values can be diffed between nodes; enables COMPARE.
    Comparable,
    /// Values support fast lookup; enables FILTER.
    Indexed,
    /// Values can be folded into counts/sums; enables AGGREGATE.
    Aggregable,
}

/// One property declaration with its four independent capability flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMeta {
    pub name: String,
    pub property_type: PropertyType,
    pub unique: bool,
    pub comparable: bool,
    pub indexed: bool,
    pub aggregable: bool,
}

impl PropertyMeta {
    /// Creates a property declaration with all capability flags off.
    pub fn new(name: &str, property_type: PropertyType) -> Self {
        Self {
            name: name.to_string(),
            property_type,
            unique: false,
            comparable: false,
            indexed: false,
            aggregable: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn comparable(mut self) -> Self {
        self.comparable = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn aggregable(mut self) -> Self {
        self.aggregable = true;
        self
    }

    /// Returns whether this property carries `flag`.
    pub fn has(&self, flag: Capability) -> bool {
        match flag {
            Capability::Unique => self.unique,
            Capability::Comparable => self.comparable,
            Capability::Indexed => self.indexed,
            Capability::Aggregable => self.aggregable,
        }
    }
}

/// A declared node type and its properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeDef {
    pub name: String,
    pub properties: Vec<PropertyMeta>,
}

/// A declared edge type. Both endpoints must name declared node types;
/// [`Schema::validate`] enforces this rather than assuming it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeTypeDef {
    pub name: String,
    pub source_type: String,
    pub target_type: String,
}

impl EdgeTypeDef {
    pub fn new(name: &str, source_type: &str, target_type: &str) -> Self {
        Self {
            name: name.to_string(),
            source_type: source_type.to_string(),
            target_type: target_type.to_string(),
        }
    }
}

/// The full schema for one source format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub source_format: String,
    pub format_version: String,
    pub schema_version: String,
    pub node_types: Vec<NodeTypeDef>,
    pub edge_types: Vec<EdgeTypeDef>,
}

impl Schema {
    /// Looks up a node type declaration by name.
    pub fn node_type(&self, name: &str) -> Option<&NodeTypeDef> {
        self.node_types.iter().find(|nt| nt.name == name)
    }

    /// Discovery query: names of `node_type`'s properties carrying `flag`.
    ///
    /// Returns an empty list for unknown node types.
    pub fn properties_where(&self, node_type: &str, flag: Capability) -> Vec<&str> {
        self.node_type(node_type)
            .map(|nt| {
                nt.properties
                    .iter()
                    .filter(|prop| prop.has(flag))
                    .map(|prop| prop.name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Discovery query: every declared edge type name, in declaration order.
    pub fn traversable_edge_types(&self) -> Vec<&str> {
        self.edge_types.iter().map(|et| et.name.as_str()).collect()
    }

    /// Validates the schema, reporting every violation in one aggregate
    /// error: at least one node type, a non-empty source format, and edge
    /// endpoints that resolve to declared node types.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut violations = Vec::new();

        if self.node_types.is_empty() {
            violations.push("schema must declare at least one node type".to_string());
        }
        if self.source_format.is_empty() {
            violations.push("schema must specify source_format".to_string());
        }

        let declared: FxHashSet<&str> = self.node_types.iter().map(|nt| nt.name.as_str()).collect();
        for et in &self.edge_types {
            if !declared.contains(et.source_type.as_str()) {
                violations.push(format!(
                    "edge type {:?} references undeclared source type {:?}",
                    et.name, et.source_type
                ));
            }
            if !declared.contains(et.target_type.as_str()) {
                violations.push(format!(
                    "edge type {:?} references undeclared target type {:?}",
                    et.name, et.target_type
                ));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError { violations })
        }
    }

    /// Serialized rendering for external query composers.
    ///
    /// Enumerates every declared node type with each property annotated by
    /// its capability flags, then every edge type with its endpoints. This
    /// rendering is the sole contract with the external component; it is
    /// never a curated subset.
    pub fn describe(&self) -> String {
        let mut out = String::from("Node Types:\n");
        for nt in &self.node_types {
            out.push_str("- ");
            out.push_str(&nt.name);
            out.push_str(": properties [");
            for (i, prop) in nt.properties.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&prop.name);
                if prop.unique {
                    out.push_str(" (unique)");
                }
                if prop.indexed {
                    out.push_str(" (indexed)");
                }
                if prop.comparable {
                    out.push_str(" (comparable)");
                }
                if prop.aggregable {
                    out.push_str(" (aggregable)");
                }
            }
            out.push_str("]\n");
        }

        out.push_str("\nEdge Types:\n");
        for et in &self.edge_types {
            out.push_str(&format!(
                "- {}: {} -> {}\n",
                et.name, et.source_type, et.target_type
            ));
        }
        out
    }
}

/// Describes the DXF format as a property graph schema.
pub fn describe_format(format_version: &str) -> Schema {
    Schema {
        source_format: "DXF".to_string(),
        format_version: format_version.to_string(),
        schema_version: "1.0.0".to_string(),
        node_types: vec![
            NodeTypeDef {
                name: "Entity".to_string(),
                properties: vec![
                    // Unique handle enables match operations across
                    // document versions.
                    PropertyMeta::new("handle", PropertyType::String)
                        .unique()
                        .indexed(),
                    PropertyMeta::new("type", PropertyType::String).indexed(),
                    PropertyMeta::new("layer", PropertyType::String).indexed(),
                    PropertyMeta::new("x", PropertyType::Double)
                        .comparable()
                        .aggregable(),
                    PropertyMeta::new("y", PropertyType::Double)
                        .comparable()
                        .aggregable(),
                ],
            },
            NodeTypeDef {
                name: "Block".to_string(),
                properties: vec![
                    PropertyMeta::new("name", PropertyType::String)
                        .unique()
                        .indexed(),
                    // Comparable content hash is what divergence detection
                    // keys on.
                    PropertyMeta::new("content_hash", PropertyType::String).comparable(),
                    PropertyMeta::new("entity_count", PropertyType::Int).aggregable(),
                ],
            },
            NodeTypeDef {
                name: "Layer".to_string(),
                properties: vec![
                    PropertyMeta::new("name", PropertyType::String)
                        .unique()
                        .indexed(),
                ],
            },
        ],
        edge_types: vec![
            EdgeTypeDef::new("BELONGS_TO", "Entity", "Layer"),
            EdgeTypeDef::new("CONTAINS", "Block", "Entity"),
            EdgeTypeDef::new("REFERENCES", "Entity", "Block"),
        ],
    }
}
