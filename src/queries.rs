//! Source graph queries
//!
//! All Cypher issued against the source store lives here, together with
//! the decoding of result rows into plain row structs. The export core
//! only reads; every query is a pattern match over the IntAct graph
//! schema with a forward-only result stream.

use crate::records::{GraphElement, Properties};
use anyhow::{Context, Result};
use neo4rs::{query, DetachedRowStream, Graph, Node, Row};
use serde_json::Value;
use tracing::warn;

/// One interactor plus its optionally reachable organism and the
/// type/source hint pair used to resolve it.
#[derive(Debug, Clone)]
pub struct InteractorRow {
    pub interactor: GraphElement,
    pub organism: Option<GraphElement>,
    pub type_hint: Option<String>,
    pub source_hint: Option<String>,
}

/// One experiment joined to its interaction evidence and optional
/// publication, host organism, and detection method term.
#[derive(Debug, Clone)]
pub struct ExperimentRow {
    pub experiment: GraphElement,
    pub evidence: Option<GraphElement>,
    pub publication: Option<GraphElement>,
    pub host_organism: Option<GraphElement>,
    pub detection_method: Option<GraphElement>,
}

/// One side of a binary interaction with its own resolution hints.
#[derive(Debug, Clone)]
pub struct ParticipantRow {
    pub element: GraphElement,
    pub type_hint: Option<String>,
    pub source_hint: Option<String>,
    pub role: Option<String>,
}

/// One binary interaction evidence record with both participants, the
/// interaction type term, and the clustered confidence score.
#[derive(Debug, Clone)]
pub struct BinaryInteractionRow {
    pub evidence: GraphElement,
    pub source: ParticipantRow,
    pub target: ParticipantRow,
    pub interaction_type: Option<GraphElement>,
    pub mi_score: Option<f64>,
}

const INTERACTOR_ROWS: &str = "\
    MATCH (n:GraphInteractor) WHERE id(n) IN $ids \
    OPTIONAL MATCH (n)-[:organism]->(o:GraphOrganism) \
    OPTIONAL MATCH (n)-[:interactorType]->(t:GraphCvTerm) \
    OPTIONAL MATCH (n)-[:preferredIdentifier]->(:GraphXref)-[:database]->(d:GraphCvTerm) \
    RETURN n, o, t.shortName AS typ, d.shortName AS src";

const EXPERIMENT_ROWS: &str = "\
    MATCH (e:GraphExperiment) \
    WITH e \
    MATCH (e)<-[:experiment]-(b:GraphBinaryInteractionEvidence) \
    OPTIONAL MATCH (e)<-[:PUB_EXP]-(p:GraphPublication) \
    OPTIONAL MATCH (e)-[:hostOrganism]->(o:GraphOrganism) \
    OPTIONAL MATCH (e)-[:interactionDetectionMethod]->(d:GraphCvTerm) \
    RETURN e, b, p, o, d";

const BINARY_INTERACTION_ROWS: &str = "\
    MATCH (n:GraphBinaryInteractionEvidence) WHERE id(n) IN $ids \
    MATCH (n)-[:BIE_PARTICIPANTA]->(pa)-[:interactor]->(a:GraphInteractor) \
    MATCH (n)-[:BIE_PARTICIPANTB]->(pb)-[:interactor]->(b:GraphInteractor) \
    OPTIONAL MATCH (n)-[:interactionType]->(nt:GraphCvTerm) \
    OPTIONAL MATCH (n)<-[:interactions]-(ci:GraphClusteredInteraction) \
    OPTIONAL MATCH (pa)-[:experimentalRole]->(ra:GraphCvTerm) \
    OPTIONAL MATCH (pb)-[:experimentalRole]->(rb:GraphCvTerm) \
    OPTIONAL MATCH (a)-[:interactorType]->(ta:GraphCvTerm) \
    OPTIONAL MATCH (b)-[:interactorType]->(tb:GraphCvTerm) \
    OPTIONAL MATCH (a)-[:preferredIdentifier]->(:GraphXref)-[:database]->(da:GraphCvTerm) \
    OPTIONAL MATCH (b)-[:preferredIdentifier]->(:GraphXref)-[:database]->(db:GraphCvTerm) \
    RETURN n, a, b, nt, \
           ta.shortName AS typ_a, tb.shortName AS typ_b, \
           da.shortName AS src_a, db.shortName AS src_b, \
           ra.shortName AS role_a, rb.shortName AS role_b, \
           ci.miscore AS mi_score";

/// Convert a fetched node into a `GraphElement`. Properties that cannot
/// be represented as JSON (temporal and spatial Bolt types do not occur
/// in this graph) are skipped with a warning rather than failing the
/// batch.
pub fn element_from_node(node: &Node) -> GraphElement {
    let mut properties = Properties::new();
    for key in node.keys() {
        match node.get::<Value>(key) {
            Ok(value) => {
                properties.insert(key.to_string(), value);
            }
            Err(e) => {
                warn!("Skipping undecodable property {} on node {}: {}", key, node.id(), e);
            }
        }
    }

    GraphElement {
        internal_id: node.id(),
        labels: node.labels().iter().map(|label| label.to_string()).collect(),
        properties,
    }
}

fn optional_element(row: &Row, column: &str) -> Option<GraphElement> {
    row.get::<Node>(column).ok().map(|node| element_from_node(&node))
}

fn optional_string(row: &Row, column: &str) -> Option<String> {
    row.get::<String>(column).ok().filter(|value| !value.is_empty())
}

/// Stream the store-internal ids of every element carrying `label`.
pub async fn label_id_stream(graph: &Graph, label: &str) -> Result<DetachedRowStream> {
    // Labels cannot be parametrized in Cypher; they come from the fixed
    // vocabulary in the driver, never from user input.
    let q = query(&format!("MATCH (n:{label}) RETURN id(n) AS id"));
    graph
        .execute(q)
        .await
        .with_context(|| format!("Failed to query ids for label {label}"))
}

/// Re-fetch full elements for one batch of ids.
pub async fn fetch_elements(graph: &Graph, ids: &[i64]) -> Result<Vec<GraphElement>> {
    let q = query("MATCH (n) WHERE id(n) IN $ids RETURN n").param("ids", ids.to_vec());
    let mut stream = graph
        .execute(q)
        .await
        .context("Failed to fetch elements by id")?;

    let mut elements = Vec::with_capacity(ids.len());
    while let Some(row) = stream
        .next()
        .await
        .context("Failed to advance element cursor")?
    {
        let node: Node = row.get("n").context("Element row is missing column n")?;
        elements.push(element_from_node(&node));
    }
    Ok(elements)
}

/// Fetch one batch of interactors with their organism and hints.
pub async fn fetch_interactor_rows(graph: &Graph, ids: &[i64]) -> Result<Vec<InteractorRow>> {
    let q = query(INTERACTOR_ROWS).param("ids", ids.to_vec());
    let mut stream = graph
        .execute(q)
        .await
        .context("Failed to fetch interactor rows")?;

    let mut rows = Vec::with_capacity(ids.len());
    while let Some(row) = stream
        .next()
        .await
        .context("Failed to advance interactor cursor")?
    {
        let interactor: Node = row.get("n").context("Interactor row is missing column n")?;
        rows.push(InteractorRow {
            interactor: element_from_node(&interactor),
            organism: optional_element(&row, "o"),
            type_hint: optional_string(&row, "typ"),
            source_hint: optional_string(&row, "src"),
        });
    }
    Ok(rows)
}

/// Stream the experiment join; rows are decoded one at a time by
/// `decode_experiment_row` so only a batch of decoded rows is resident.
pub async fn experiment_edge_stream(graph: &Graph) -> Result<DetachedRowStream> {
    graph
        .execute(query(EXPERIMENT_ROWS))
        .await
        .context("Failed to query experiment edges")
}

pub fn decode_experiment_row(row: &Row) -> Result<ExperimentRow> {
    let experiment: Node = row.get("e").context("Experiment row is missing column e")?;
    Ok(ExperimentRow {
        experiment: element_from_node(&experiment),
        evidence: optional_element(row, "b"),
        publication: optional_element(row, "p"),
        host_organism: optional_element(row, "o"),
        detection_method: optional_element(row, "d"),
    })
}

/// Fetch one batch of binary interaction evidences with participants,
/// interaction type term, and confidence score.
pub async fn fetch_binary_interaction_rows(
    graph: &Graph,
    ids: &[i64],
) -> Result<Vec<BinaryInteractionRow>> {
    let q = query(BINARY_INTERACTION_ROWS).param("ids", ids.to_vec());
    let mut stream = graph
        .execute(q)
        .await
        .context("Failed to fetch binary interaction rows")?;

    let mut rows = Vec::with_capacity(ids.len());
    while let Some(row) = stream
        .next()
        .await
        .context("Failed to advance binary interaction cursor")?
    {
        let evidence: Node = row.get("n").context("Interaction row is missing column n")?;
        let a: Node = row.get("a").context("Interaction row is missing column a")?;
        let b: Node = row.get("b").context("Interaction row is missing column b")?;

        rows.push(BinaryInteractionRow {
            evidence: element_from_node(&evidence),
            source: ParticipantRow {
                element: element_from_node(&a),
                type_hint: optional_string(&row, "typ_a"),
                source_hint: optional_string(&row, "src_a"),
                role: optional_string(&row, "role_a"),
            },
            target: ParticipantRow {
                element: element_from_node(&b),
                type_hint: optional_string(&row, "typ_b"),
                source_hint: optional_string(&row, "src_b"),
                role: optional_string(&row, "role_b"),
            },
            interaction_type: optional_element(&row, "nt"),
            mi_score: row.get::<f64>("mi_score").ok(),
        });
    }
    Ok(rows)
}
