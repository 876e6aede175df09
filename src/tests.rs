use crate::extractor::Batcher;
use crate::records::{GraphElement, Properties, INTERACTOR_TO_ORGANISM};
use crate::sink::{BulkSink, MemorySink};
use crate::transform;
use serde_json::json;

fn organism(internal_id: i64, tax_id: i64) -> GraphElement {
    let mut properties = Properties::new();
    properties.insert("taxId".to_string(), json!(tax_id));
    GraphElement {
        internal_id,
        labels: vec!["GraphOrganism".to_string()],
        properties,
    }
}

/// Three organisms at batch size two: the extractor must emit batches of
/// sizes [2, 1] and the transformer three organism node records total.
#[test]
fn test_end_to_end_organism_export_shape() {
    let store: Vec<GraphElement> = vec![organism(1, 9606), organism(2, 10090), organism(3, 559292)];

    let mut sink = MemorySink::default();
    let mut batcher = Batcher::new(2);
    let mut batches = Vec::new();

    for element in &store {
        if let Some(batch) = batcher.push(element.internal_id) {
            batches.push(batch);
        }
    }
    if let Some(batch) = batcher.finish() {
        batches.push(batch);
    }

    assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 1]);

    for batch in &batches {
        let elements: Vec<GraphElement> = store
            .iter()
            .filter(|el| batch.contains(&el.internal_id))
            .cloned()
            .collect();
        sink.write_nodes(transform::plain_node_records(&elements, "GraphOrganism"))
            .unwrap();
    }
    sink.finalize().unwrap();

    let nodes: Vec<_> = sink.node_batches.iter().flatten().collect();
    assert_eq!(nodes.len(), 3);
    assert!(nodes.iter().all(|n| n.node_type == "GraphOrganism"));
    assert_eq!(
        nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
        vec!["9606", "10090", "559292"]
    );
    assert!(sink.finalized);
}

/// The interactor pass hands nodes to the sink before the derived
/// organism edges, so every edge endpoint is already declared.
#[test]
fn test_interactor_pass_writes_nodes_before_edges() {
    let rows = vec![crate::queries::InteractorRow {
        interactor: {
            let mut properties = Properties::new();
            properties.insert("preferredIdentifierStr".to_string(), json!("P04637"));
            GraphElement {
                internal_id: 10,
                labels: vec!["GraphInteractor".to_string()],
                properties,
            }
        },
        organism: Some(organism(20, 9606)),
        type_hint: Some("protein".to_string()),
        source_hint: None,
    }];

    let mut sink = MemorySink::default();
    let (nodes, edges) = transform::interactor_records(&rows, "GraphInteractor");
    sink.write_nodes(nodes).unwrap();
    sink.write_edges(edges).unwrap();

    assert_eq!(sink.node_batches.len(), 1);
    assert_eq!(sink.edge_batches.len(), 1);

    let node = &sink.node_batches[0][0];
    let edge = &sink.edge_batches[0][0];
    assert_eq!(edge.edge_type, INTERACTOR_TO_ORGANISM);
    assert_eq!(edge.source_id, node.id);
    assert_eq!(edge.target_id, "9606");
}
