//! Normalized record types
//!
//! The shapes handed to the bulk writer: typed node records and edge
//! records with free-form property maps, plus the fixed edge type
//! vocabulary produced by the export passes.

use serde::Serialize;
use serde_json::{Map, Value};

/// Edge derived from the interactor -> organism traversal.
pub const INTERACTOR_TO_ORGANISM: &str = "INTERACTOR_TO_ORGANISM";
/// Edge from an interaction evidence record to its experiment.
pub const INTERACTION_TO_EXPERIMENT: &str = "INTERACTION_TO_EXPERIMENT";
/// Edge from an experiment to the publication it was reported in.
pub const EXPERIMENT_TO_PUBLICATION: &str = "EXPERIMENT_TO_PUBLICATION";
/// Edge from an experiment to its host organism.
pub const EXPERIMENT_TO_ORGANISM: &str = "EXPERIMENT_TO_ORGANISM";
/// Edge from an experiment to its interaction detection method term.
pub const EXPERIMENT_TO_DETECTION_METHOD: &str = "EXPERIMENT_TO_DETECTION_METHOD";

pub type Properties = Map<String, Value>;

/// A node as fetched from the source graph: the store-internal numeric
/// handle, the labels it carries, and its raw property map. Read-only
/// input to the transformers.
#[derive(Debug, Clone, Default)]
pub struct GraphElement {
    pub internal_id: i64,
    pub labels: Vec<String>,
    pub properties: Properties,
}

impl GraphElement {
    /// Look up a property usable as an identifier: a non-empty string,
    /// or a number rendered as its decimal form. Everything else (null,
    /// arrays, empty strings) does not qualify.
    pub fn property_str(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Normalized node record: `(id, type, properties)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub properties: Properties,
}

/// Normalized edge record: `(id, source_id, target_id, type, properties)`.
/// `id` is `None` for derived edges with no identity of their own; the
/// downstream importer synthesizes one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRecord {
    pub id: Option<String>,
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub properties: Properties,
}

impl EdgeRecord {
    /// Derived edge with no identity and no properties of its own.
    pub fn derived(source_id: String, target_id: String, edge_type: &str) -> Self {
        EdgeRecord {
            id: None,
            source_id,
            target_id,
            edge_type: edge_type.to_string(),
            properties: Properties::new(),
        }
    }
}
