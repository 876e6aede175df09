//! Batch transformers
//!
//! Pure functions turning fetched source rows into normalized node and
//! edge records. All graph access happens in `queries`; everything here
//! is deterministic and synchronous so it can be tested without a
//! running store.

use crate::queries::{BinaryInteractionRow, ExperimentRow, InteractorRow};
use crate::records::{
    EdgeRecord, GraphElement, NodeRecord, EXPERIMENT_TO_DETECTION_METHOD, EXPERIMENT_TO_ORGANISM,
    EXPERIMENT_TO_PUBLICATION, INTERACTION_TO_EXPERIMENT, INTERACTOR_TO_ORGANISM,
};
use crate::resolver::{resolve, IdProvenance};
use serde_json::Value;
use tracing::debug;

/// Fallback relationship type when an evidence record carries no
/// interaction type term; "association" is the root MI association term.
const FALLBACK_INTERACTION_TYPE: &str = "association";

/// One node record per fetched element, resolved under the queried label.
pub fn plain_node_records(elements: &[GraphElement], label: &str) -> Vec<NodeRecord> {
    elements
        .iter()
        .map(|element| {
            let resolved = resolve(element, label, None);
            NodeRecord {
                id: resolved.id,
                node_type: resolved.node_type,
                properties: element.properties.clone(),
            }
        })
        .collect()
}

/// Interactor nodes plus derived interactor-to-organism edges. An
/// interactor without a reachable organism still yields a node, just no
/// edge.
pub fn interactor_records(
    rows: &[InteractorRow],
    label: &str,
) -> (Vec<NodeRecord>, Vec<EdgeRecord>) {
    let mut nodes = Vec::with_capacity(rows.len());
    let mut edges = Vec::new();

    for row in rows {
        let hint = row.type_hint.as_deref().unwrap_or(label);
        let interactor = resolve(&row.interactor, hint, row.source_hint.as_deref());

        nodes.push(NodeRecord {
            id: interactor.id.clone(),
            node_type: interactor.node_type,
            properties: row.interactor.properties.clone(),
        });

        match &row.organism {
            Some(organism_element) => {
                let organism = resolve(organism_element, "GraphOrganism", None);
                edges.push(EdgeRecord::derived(
                    interactor.id,
                    organism.id,
                    INTERACTOR_TO_ORGANISM,
                ));
            }
            None => {
                debug!("No organism found for interactor {}", interactor.id);
            }
        }
    }

    (nodes, edges)
}

/// Edges from experiments to their evidence, publication, host organism,
/// and detection method. Detection method terms are also emitted as
/// nodes since no other pass discovers them. Edges come out grouped by
/// type, matching the type ordering the downstream importer expects.
pub fn experiment_edge_records(rows: &[ExperimentRow]) -> (Vec<NodeRecord>, Vec<EdgeRecord>) {
    let mut detection_nodes = Vec::new();
    let mut evidence_edges = Vec::new();
    let mut publication_edges = Vec::new();
    let mut organism_edges = Vec::new();
    let mut detection_edges = Vec::new();

    for row in rows {
        let experiment = resolve(&row.experiment, "GraphExperiment", None);

        if let Some(evidence) = &row.evidence {
            let evidence = resolve(evidence, "GraphBinaryInteractionEvidence", None);
            evidence_edges.push(EdgeRecord::derived(
                evidence.id,
                experiment.id.clone(),
                INTERACTION_TO_EXPERIMENT,
            ));
        }

        if let Some(publication) = &row.publication {
            let publication = resolve(publication, "GraphPublication", None);
            publication_edges.push(EdgeRecord::derived(
                experiment.id.clone(),
                publication.id,
                EXPERIMENT_TO_PUBLICATION,
            ));
        } else {
            debug!("No publication found for experiment {}", experiment.id);
        }

        if let Some(organism) = &row.host_organism {
            let organism = resolve(organism, "GraphOrganism", None);
            organism_edges.push(EdgeRecord::derived(
                experiment.id.clone(),
                organism.id,
                EXPERIMENT_TO_ORGANISM,
            ));
        } else {
            debug!("No host organism found for experiment {}", experiment.id);
        }

        if let Some(detection) = &row.detection_method {
            let detection_resolved = resolve(detection, "GraphEvidenceType", None);
            detection_nodes.push(NodeRecord {
                id: detection_resolved.id.clone(),
                node_type: detection_resolved.node_type,
                properties: detection.properties.clone(),
            });
            detection_edges.push(EdgeRecord::derived(
                experiment.id.clone(),
                detection_resolved.id,
                EXPERIMENT_TO_DETECTION_METHOD,
            ));
        } else {
            debug!("No detection method found for experiment {}", experiment.id);
        }
    }

    let mut edges = evidence_edges;
    edges.append(&mut publication_edges);
    edges.append(&mut organism_edges);
    edges.append(&mut detection_edges);

    (detection_nodes, edges)
}

/// The primary interaction edges. The edge type is the interaction
/// type's short name per record; the edge id is the evidence accession.
/// An accession can legitimately cover more than one pairwise
/// interaction, so repeated edge ids across a run are expected and left
/// to the downstream importer to handle.
pub fn binary_interaction_records(rows: &[BinaryInteractionRow]) -> Vec<EdgeRecord> {
    let mut edges = Vec::with_capacity(rows.len());

    for row in rows {
        let evidence = resolve(&row.evidence, "GraphBinaryInteractionEvidence", None);
        if evidence.provenance == IdProvenance::Synthesized {
            debug!(
                "No accession found for binary interaction evidence (internal id {})",
                row.evidence.internal_id
            );
        }

        let source_hint = row.source.type_hint.as_deref().unwrap_or("GraphInteractor");
        let source = resolve(&row.source.element, source_hint, row.source.source_hint.as_deref());

        let target_hint = row.target.type_hint.as_deref().unwrap_or("GraphInteractor");
        let target = resolve(&row.target.element, target_hint, row.target.source_hint.as_deref());

        let type_term = row.interaction_type.as_ref();
        let edge_type = match type_term.and_then(|term| term.property_str("shortName")) {
            Some(short_name) => short_name,
            None => {
                debug!("No interaction type term for evidence {}", evidence.id);
                FALLBACK_INTERACTION_TYPE.to_string()
            }
        };

        let term_property = |key: &str| -> Value {
            type_term
                .and_then(|term| term.properties.get(key).cloned())
                .unwrap_or(Value::Null)
        };

        let mut properties = row.evidence.properties.clone();
        properties.insert(
            "interactionTypeShortName".to_string(),
            term_property("shortName"),
        );
        properties.insert(
            "interactionTypeFullName".to_string(),
            term_property("fullName"),
        );
        properties.insert(
            "interactionTypeIdentifierStr".to_string(),
            term_property("mIIdentifier"),
        );
        properties.insert(
            "mi_score".to_string(),
            row.mi_score.map(Value::from).unwrap_or(Value::Null),
        );
        properties.insert(
            "src_role".to_string(),
            row.source.role.clone().map(Value::String).unwrap_or(Value::Null),
        );
        properties.insert(
            "tar_role".to_string(),
            row.target.role.clone().map(Value::String).unwrap_or(Value::Null),
        );

        edges.push(EdgeRecord {
            id: Some(evidence.id),
            source_id: source.id,
            target_id: target.id,
            edge_type,
            properties,
        });
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::ParticipantRow;
    use crate::records::Properties;
    use serde_json::json;

    fn element(internal_id: i64, props: &[(&str, serde_json::Value)]) -> GraphElement {
        let mut properties = Properties::new();
        for (key, value) in props {
            properties.insert(key.to_string(), value.clone());
        }
        GraphElement {
            internal_id,
            labels: Vec::new(),
            properties,
        }
    }

    #[test]
    fn test_plain_nodes_carry_label_type_and_properties() {
        let elements = vec![
            element(1, &[("taxId", json!(9606)), ("scientificName", json!("Homo sapiens"))]),
            element(2, &[("taxId", json!(10090))]),
            element(3, &[("taxId", json!(559292))]),
        ];

        let nodes = plain_node_records(&elements, "GraphOrganism");

        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|n| n.node_type == "GraphOrganism"));
        assert_eq!(nodes[0].id, "9606");
        assert_eq!(nodes[0].properties["scientificName"], json!("Homo sapiens"));
    }

    #[test]
    fn test_interactor_without_organism_emits_node_only() {
        let rows = vec![InteractorRow {
            interactor: element(10, &[("ac", json!("EBI-10"))]),
            organism: None,
            type_hint: Some("protein".to_string()),
            source_hint: None,
        }];

        let (nodes, edges) = interactor_records(&rows, "GraphInteractor");

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_type, "Protein");
        assert!(edges.is_empty());
    }

    #[test]
    fn test_interactor_with_organism_emits_node_and_edge() {
        let rows = vec![InteractorRow {
            interactor: element(10, &[("preferredIdentifierStr", json!("P04637"))]),
            organism: Some(element(20, &[("taxId", json!(9606))])),
            type_hint: Some("protein".to_string()),
            source_hint: None,
        }];

        let (nodes, edges) = interactor_records(&rows, "GraphInteractor");

        assert_eq!(nodes.len(), 1);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].edge_type, INTERACTOR_TO_ORGANISM);
        assert_eq!(edges[0].source_id, "P04637");
        assert_eq!(edges[0].target_id, "9606");
        assert_eq!(edges[0].id, None);
        assert!(edges[0].properties.is_empty());
    }

    #[test]
    fn test_interactor_falls_back_to_query_label_without_hint() {
        let rows = vec![InteractorRow {
            interactor: element(10, &[("ac", json!("EBI-10"))]),
            organism: None,
            type_hint: None,
            source_hint: None,
        }];

        let (nodes, _) = interactor_records(&rows, "GraphInteractor");

        assert_eq!(nodes[0].node_type, "GraphInteractor");
    }

    #[test]
    fn test_experiment_row_with_only_evidence_and_publication() {
        let rows = vec![ExperimentRow {
            experiment: element(1, &[("ac", json!("EBI-EXP-1"))]),
            evidence: Some(element(2, &[("ac", json!("EBI-INT-1"))])),
            publication: Some(element(3, &[("pubmedIdStr", json!("12345"))])),
            host_organism: None,
            detection_method: None,
        }];

        let (nodes, edges) = experiment_edge_records(&rows);

        assert!(nodes.is_empty());
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].edge_type, INTERACTION_TO_EXPERIMENT);
        assert_eq!(edges[0].source_id, "EBI-INT-1");
        assert_eq!(edges[0].target_id, "EBI-EXP-1");
        assert_eq!(edges[1].edge_type, EXPERIMENT_TO_PUBLICATION);
        assert_eq!(edges[1].source_id, "EBI-EXP-1");
        assert_eq!(edges[1].target_id, "12345");
    }

    #[test]
    fn test_experiment_row_with_all_neighbors() {
        let rows = vec![ExperimentRow {
            experiment: element(1, &[("ac", json!("EBI-EXP-1"))]),
            evidence: Some(element(2, &[("ac", json!("EBI-INT-1"))])),
            publication: Some(element(3, &[("pubmedIdStr", json!("12345"))])),
            host_organism: Some(element(4, &[("taxId", json!(9606))])),
            detection_method: Some(element(
                5,
                &[("mIIdentifier", json!("MI:0018")), ("shortName", json!("2 hybrid"))],
            )),
        }];

        let (nodes, edges) = experiment_edge_records(&rows);

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_type, "GraphEvidenceType");
        assert_eq!(nodes[0].id, "MI:0018");

        assert_eq!(edges.len(), 4);
        let types: Vec<&str> = edges.iter().map(|e| e.edge_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                INTERACTION_TO_EXPERIMENT,
                EXPERIMENT_TO_PUBLICATION,
                EXPERIMENT_TO_ORGANISM,
                EXPERIMENT_TO_DETECTION_METHOD,
            ]
        );
    }

    #[test]
    fn test_experiment_edges_grouped_by_type_across_rows() {
        let row = |n: i64| ExperimentRow {
            experiment: element(n, &[("ac", json!(format!("EBI-EXP-{n}")))]),
            evidence: Some(element(n + 100, &[("ac", json!(format!("EBI-INT-{n}")))])),
            publication: Some(element(n + 200, &[("pubmedIdStr", json!(format!("{n}")))])),
            host_organism: None,
            detection_method: None,
        };

        let (_, edges) = experiment_edge_records(&[row(1), row(2)]);

        let types: Vec<&str> = edges.iter().map(|e| e.edge_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                INTERACTION_TO_EXPERIMENT,
                INTERACTION_TO_EXPERIMENT,
                EXPERIMENT_TO_PUBLICATION,
                EXPERIMENT_TO_PUBLICATION,
            ]
        );
    }

    fn participant(id: i64, identifier: &str, kind: &str, role: &str) -> ParticipantRow {
        ParticipantRow {
            element: element(id, &[("preferredIdentifierStr", json!(identifier))]),
            type_hint: Some(kind.to_string()),
            source_hint: None,
            role: Some(role.to_string()),
        }
    }

    #[test]
    fn test_binary_interaction_edge_properties() {
        let rows = vec![BinaryInteractionRow {
            evidence: element(1, &[("ac", json!("EBI-777")), ("imexId", json!("IM-1"))]),
            source: participant(2, "P04637", "protein", "bait"),
            target: participant(3, "CHEBI:15422", "small molecule", "prey"),
            interaction_type: Some(element(
                4,
                &[
                    ("shortName", json!("direct interaction")),
                    ("fullName", json!("direct interaction")),
                    ("mIIdentifier", json!("MI:0407")),
                ],
            )),
            mi_score: Some(0.87),
        }];

        let edges = binary_interaction_records(&rows);

        assert_eq!(edges.len(), 1);
        let edge = &edges[0];
        assert_eq!(edge.id, Some("EBI-777".to_string()));
        assert_eq!(edge.edge_type, "direct interaction");
        assert_eq!(edge.source_id, "P04637");
        assert_eq!(edge.target_id, "CHEBI:15422");
        assert_eq!(edge.properties["mi_score"], json!(0.87));
        assert_eq!(edge.properties["src_role"], json!("bait"));
        assert_eq!(edge.properties["tar_role"], json!("prey"));
        assert_eq!(edge.properties["interactionTypeShortName"], json!("direct interaction"));
        assert_eq!(edge.properties["interactionTypeIdentifierStr"], json!("MI:0407"));
        // The original evidence properties ride along.
        assert_eq!(edge.properties["ac"], json!("EBI-777"));
    }

    #[test]
    fn test_binary_interaction_participants_of_different_types() {
        let rows = vec![BinaryInteractionRow {
            evidence: element(1, &[("ac", json!("EBI-1"))]),
            source: participant(2, "P04637", "protein", "bait"),
            target: participant(3, "ENSG0001", "gene", "prey"),
            interaction_type: Some(element(4, &[("shortName", json!("association"))])),
            mi_score: None,
        }];

        let edges = binary_interaction_records(&rows);

        assert_eq!(edges[0].source_id, "P04637");
        assert_eq!(edges[0].target_id, "ENSG0001");
        assert_eq!(edges[0].properties["mi_score"], serde_json::Value::Null);
    }

    #[test]
    fn test_binary_interaction_without_accession_uses_fallback_id() {
        let rows = vec![BinaryInteractionRow {
            evidence: element(99, &[]),
            source: participant(2, "P04637", "protein", "bait"),
            target: participant(3, "Q00987", "protein", "prey"),
            interaction_type: None,
            mi_score: None,
        }];

        let edges = binary_interaction_records(&rows);

        // The edge is still produced, with a synthesized id and the
        // fallback interaction type.
        assert_eq!(edges.len(), 1);
        assert_eq!(
            edges[0].id,
            Some("graphbinaryinteractionevidence:99".to_string())
        );
        assert_eq!(edges[0].edge_type, "association");
    }
}
