//! Bulk writer sink
//!
//! The downstream side of the pipeline: a `BulkSink` accepts normalized
//! record batches and, on finalize, produces the import manifest the
//! bulk importer consumes. `JsonlSink` appends one JSON-lines file per
//! node/edge type under an output directory; files are opened once and
//! only ever appended to.

use crate::records::{
    EdgeRecord, NodeRecord, EXPERIMENT_TO_DETECTION_METHOD, EXPERIMENT_TO_ORGANISM,
    EXPERIMENT_TO_PUBLICATION, INTERACTION_TO_EXPERIMENT, INTERACTOR_TO_ORGANISM,
};
use crate::resolver::known_node_types;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Interaction-type short names the import schema maps directly. Edge
/// types outside this set (and the fixed derived-edge constants) are
/// still written but reported as unresolved on finalize.
const KNOWN_INTERACTION_TYPES: &[&str] = &[
    "association",
    "physical association",
    "direct interaction",
    "colocalization",
    "enzymatic reaction",
    "phosphorylation reaction",
];

pub trait BulkSink {
    fn write_nodes(&mut self, records: Vec<NodeRecord>) -> Result<()>;
    fn write_edges(&mut self, records: Vec<EdgeRecord>) -> Result<()>;
    fn finalize(&mut self) -> Result<ImportManifest>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestFile {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub path: String,
    pub record_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportManifest {
    pub generated_at: String,
    pub node_files: Vec<ManifestFile>,
    pub edge_files: Vec<ManifestFile>,
    pub unresolved_types: Vec<String>,
}

struct TypeFile {
    writer: BufWriter<fs::File>,
    file_name: String,
    records: u64,
}

pub struct JsonlSink {
    out_dir: PathBuf,
    known_node_types: HashSet<String>,
    known_edge_types: HashSet<String>,
    node_files: BTreeMap<String, TypeFile>,
    edge_files: BTreeMap<String, TypeFile>,
    unresolved: BTreeSet<String>,
}

fn file_stem(type_name: &str) -> String {
    type_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

impl JsonlSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

        let known_node_types = known_node_types().map(str::to_string).collect();
        let known_edge_types = [
            INTERACTOR_TO_ORGANISM,
            INTERACTION_TO_EXPERIMENT,
            EXPERIMENT_TO_PUBLICATION,
            EXPERIMENT_TO_ORGANISM,
            EXPERIMENT_TO_DETECTION_METHOD,
        ]
        .iter()
        .chain(KNOWN_INTERACTION_TYPES)
        .map(|t| t.to_string())
        .collect();

        Ok(JsonlSink {
            out_dir,
            known_node_types,
            known_edge_types,
            node_files: BTreeMap::new(),
            edge_files: BTreeMap::new(),
            unresolved: BTreeSet::new(),
        })
    }

    fn append<T: Serialize>(&mut self, kind: Kind, type_name: &str, record: &T) -> Result<()> {
        let (files, prefix) = match kind {
            Kind::Node => (&mut self.node_files, "nodes"),
            Kind::Edge => (&mut self.edge_files, "edges"),
        };

        if !files.contains_key(type_name) {
            let file_name = format!("{}_{}.jsonl", prefix, file_stem(type_name));
            let path = self.out_dir.join(&file_name);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            files.insert(
                type_name.to_string(),
                TypeFile {
                    writer: BufWriter::new(file),
                    file_name,
                    records: 0,
                },
            );
        }

        // Present by construction right above.
        let entry = files
            .get_mut(type_name)
            .context("Type file vanished after insertion")?;
        serde_json::to_writer(&mut entry.writer, record)
            .with_context(|| format!("Failed to serialize {type_name} record"))?;
        entry
            .writer
            .write_all(b"\n")
            .with_context(|| format!("Failed to append {type_name} record"))?;
        entry.records += 1;
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Kind {
    Node,
    Edge,
}

impl BulkSink for JsonlSink {
    fn write_nodes(&mut self, records: Vec<NodeRecord>) -> Result<()> {
        for record in records {
            if !self.known_node_types.contains(&record.node_type) {
                self.unresolved.insert(record.node_type.clone());
            }
            let type_name = record.node_type.clone();
            self.append(Kind::Node, &type_name, &record)?;
        }
        Ok(())
    }

    fn write_edges(&mut self, records: Vec<EdgeRecord>) -> Result<()> {
        for record in records {
            if !self.known_edge_types.contains(&record.edge_type) {
                self.unresolved.insert(record.edge_type.clone());
            }
            let type_name = record.edge_type.clone();
            self.append(Kind::Edge, &type_name, &record)?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<ImportManifest> {
        for entry in self.node_files.values_mut().chain(self.edge_files.values_mut()) {
            entry.writer.flush().context("Failed to flush type file")?;
        }

        for type_name in &self.unresolved {
            warn!("Type '{}' is not part of the import schema", type_name);
        }

        let manifest_files = |files: &BTreeMap<String, TypeFile>| {
            files
                .iter()
                .map(|(type_name, entry)| ManifestFile {
                    entity_type: type_name.clone(),
                    path: entry.file_name.clone(),
                    record_count: entry.records,
                })
                .collect::<Vec<_>>()
        };

        let manifest = ImportManifest {
            generated_at: Utc::now().to_rfc3339(),
            node_files: manifest_files(&self.node_files),
            edge_files: manifest_files(&self.edge_files),
            unresolved_types: self.unresolved.iter().cloned().collect(),
        };

        let path = self.out_dir.join("manifest.json");
        let body = serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;
        fs::write(&path, body)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(
            "📄 Wrote import manifest: {} node files, {} edge files",
            manifest.node_files.len(),
            manifest.edge_files.len()
        );
        Ok(manifest)
    }
}

/// Records every call for assertions; no files involved.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySink {
    pub node_batches: Vec<Vec<NodeRecord>>,
    pub edge_batches: Vec<Vec<EdgeRecord>>,
    pub finalized: bool,
}

#[cfg(test)]
impl BulkSink for MemorySink {
    fn write_nodes(&mut self, records: Vec<NodeRecord>) -> Result<()> {
        self.node_batches.push(records);
        Ok(())
    }

    fn write_edges(&mut self, records: Vec<EdgeRecord>) -> Result<()> {
        self.edge_batches.push(records);
        Ok(())
    }

    fn finalize(&mut self) -> Result<ImportManifest> {
        self.finalized = true;
        Ok(ImportManifest {
            generated_at: Utc::now().to_rfc3339(),
            node_files: Vec::new(),
            edge_files: Vec::new(),
            unresolved_types: Vec::new(),
        })
    }
}
