//! Export pipeline driver
//!
//! Sequences the extraction passes. Node types must all be declared to
//! the bulk writer before any edge referencing them, so the order here
//! is fixed: plain node labels, interactors (with their derived
//! organism edges), experiment edges, binary interaction edges, then
//! finalize.

use crate::extractor::Batcher;
use crate::queries::{self, ExperimentRow};
use crate::sink::{BulkSink, ImportManifest};
use crate::transform;
use anyhow::{Context, Result};
use neo4rs::Graph;
use tracing::info;

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Labels exported as plain nodes, in declaration order.
pub const NODE_LABELS: &[&str] = &["GraphPublication", "GraphOrganism", "GraphExperiment"];
pub const INTERACTOR_LABEL: &str = "GraphInteractor";
pub const EVIDENCE_LABEL: &str = "GraphBinaryInteractionEvidence";

/// Explicit per-run configuration; every pass shares the one batch size.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub batch_size: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

pub struct Exporter {
    graph: Graph,
    config: ExportConfig,
}

impl Exporter {
    pub fn new(graph: Graph, config: ExportConfig) -> Self {
        Exporter { graph, config }
    }

    /// Run every export pass in importer order and finalize the sink.
    /// Any query or sink failure aborts the run; batches already handed
    /// to the sink stay written (the output is append-only).
    pub async fn run(&self, sink: &mut dyn BulkSink) -> Result<ImportManifest> {
        for label in NODE_LABELS {
            self.export_nodes(label, sink).await?;
        }
        self.export_interactors(sink).await?;
        self.export_experiment_edges(sink).await?;
        self.export_binary_interactions(sink).await?;

        sink.finalize().context("Failed to finalize bulk writer output")
    }

    async fn export_nodes(&self, label: &str, sink: &mut dyn BulkSink) -> Result<()> {
        info!(
            "📦 Exporting {} nodes (batch_size={})",
            label, self.config.batch_size
        );

        let mut stream = queries::label_id_stream(&self.graph, label).await?;
        let mut batcher = Batcher::new(self.config.batch_size);
        let mut total = 0usize;

        while let Some(row) = stream
            .next()
            .await
            .with_context(|| format!("Failed to advance id cursor for {label}"))?
        {
            let id: i64 = row.get("id").context("Id row is missing column id")?;
            if let Some(batch) = batcher.push(id) {
                total += batch.len();
                self.write_node_batch(&batch, label, sink).await?;
            }
        }
        if let Some(batch) = batcher.finish() {
            total += batch.len();
            self.write_node_batch(&batch, label, sink).await?;
        }

        info!("   Exported {} {} nodes", total, label);
        Ok(())
    }

    async fn write_node_batch(
        &self,
        ids: &[i64],
        label: &str,
        sink: &mut dyn BulkSink,
    ) -> Result<()> {
        let elements = queries::fetch_elements(&self.graph, ids).await?;
        sink.write_nodes(transform::plain_node_records(&elements, label))
    }

    async fn export_interactors(&self, sink: &mut dyn BulkSink) -> Result<()> {
        info!(
            "📦 Exporting {} nodes and organism edges (batch_size={})",
            INTERACTOR_LABEL, self.config.batch_size
        );

        let mut stream = queries::label_id_stream(&self.graph, INTERACTOR_LABEL).await?;
        let mut batcher = Batcher::new(self.config.batch_size);
        let mut total_nodes = 0usize;
        let mut total_edges = 0usize;

        while let Some(row) = stream
            .next()
            .await
            .context("Failed to advance interactor id cursor")?
        {
            let id: i64 = row.get("id").context("Id row is missing column id")?;
            if let Some(batch) = batcher.push(id) {
                let (nodes, edges) = self.write_interactor_batch(&batch, sink).await?;
                total_nodes += nodes;
                total_edges += edges;
            }
        }
        if let Some(batch) = batcher.finish() {
            let (nodes, edges) = self.write_interactor_batch(&batch, sink).await?;
            total_nodes += nodes;
            total_edges += edges;
        }

        info!(
            "   Exported {} interactor nodes, {} organism edges",
            total_nodes, total_edges
        );
        Ok(())
    }

    async fn write_interactor_batch(
        &self,
        ids: &[i64],
        sink: &mut dyn BulkSink,
    ) -> Result<(usize, usize)> {
        let rows = queries::fetch_interactor_rows(&self.graph, ids).await?;
        let (nodes, edges) = transform::interactor_records(&rows, INTERACTOR_LABEL);
        let counts = (nodes.len(), edges.len());
        sink.write_nodes(nodes)?;
        sink.write_edges(edges)?;
        Ok(counts)
    }

    async fn export_experiment_edges(&self, sink: &mut dyn BulkSink) -> Result<()> {
        info!(
            "🔗 Exporting experiment edges (batch_size={})",
            self.config.batch_size
        );

        let mut stream = queries::experiment_edge_stream(&self.graph).await?;
        let mut batcher = Batcher::new(self.config.batch_size);
        let mut total = 0usize;

        while let Some(row) = stream
            .next()
            .await
            .context("Failed to advance experiment cursor")?
        {
            let decoded = queries::decode_experiment_row(&row)?;
            if let Some(batch) = batcher.push(decoded) {
                total += Self::write_experiment_batch(&batch, sink)?;
            }
        }
        if let Some(batch) = batcher.finish() {
            total += Self::write_experiment_batch(&batch, sink)?;
        }

        info!("   Exported {} experiment edges", total);
        Ok(())
    }

    fn write_experiment_batch(rows: &[ExperimentRow], sink: &mut dyn BulkSink) -> Result<usize> {
        let (nodes, edges) = transform::experiment_edge_records(rows);
        let count = edges.len();
        sink.write_nodes(nodes)?;
        sink.write_edges(edges)?;
        Ok(count)
    }

    async fn export_binary_interactions(&self, sink: &mut dyn BulkSink) -> Result<()> {
        info!(
            "🔗 Exporting {} edges (batch_size={})",
            EVIDENCE_LABEL, self.config.batch_size
        );

        let mut stream = queries::label_id_stream(&self.graph, EVIDENCE_LABEL).await?;
        let mut batcher = Batcher::new(self.config.batch_size);
        let mut total = 0usize;

        while let Some(row) = stream
            .next()
            .await
            .context("Failed to advance evidence id cursor")?
        {
            let id: i64 = row.get("id").context("Id row is missing column id")?;
            if let Some(batch) = batcher.push(id) {
                total += self.write_binary_interaction_batch(&batch, sink).await?;
            }
        }
        if let Some(batch) = batcher.finish() {
            total += self.write_binary_interaction_batch(&batch, sink).await?;
        }

        info!("   Exported {} binary interaction edges", total);
        Ok(())
    }

    async fn write_binary_interaction_batch(
        &self,
        ids: &[i64],
        sink: &mut dyn BulkSink,
    ) -> Result<usize> {
        let rows = queries::fetch_binary_interaction_rows(&self.graph, ids).await?;
        let edges = transform::binary_interaction_records(&rows);
        let count = edges.len();
        sink.write_edges(edges)?;
        Ok(count)
    }
}
