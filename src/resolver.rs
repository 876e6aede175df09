//! Identifier and type resolution
//!
//! Maps a raw graph element to its canonical `(id, type)` pair. Each
//! resolvable type is a row in a declarative table: an ordered list of
//! candidate identifier properties, optional per-source overrides for
//! identifier schemes that differ by originating database, and the
//! normalized type name. Adding a type is a data change, not new
//! control flow.

use crate::records::GraphElement;
use tracing::debug;

/// Whether the resolved id came out of a source property or had to be
/// synthesized from the element's internal handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdProvenance {
    Source,
    Synthesized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub id: String,
    pub node_type: String,
    pub provenance: IdProvenance,
}

struct TypeRule {
    /// Label or interactor-kind hint this rule matches, case-insensitive.
    hint: &'static str,
    /// Normalized type emitted for matching elements.
    resolved: &'static str,
    /// Candidate identifier properties, probed in order.
    id_keys: &'static [&'static str],
    /// Per-source-database candidate lists that replace `id_keys` when
    /// the caller supplies a matching source hint.
    source_overrides: &'static [(&'static str, &'static [&'static str])],
}

const UNIPROT_KEYS: &[&str] = &["uniprotName", "preferredIdentifierStr", "ac"];
const INTERACTOR_KEYS: &[&str] = &["preferredIdentifierStr", "ac"];
const DEFAULT_ID_KEYS: &[&str] = &["ac"];

const TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        hint: "GraphPublication",
        resolved: "GraphPublication",
        id_keys: &["pubmedIdStr", "ac"],
        source_overrides: &[],
    },
    TypeRule {
        hint: "GraphOrganism",
        resolved: "GraphOrganism",
        id_keys: &["taxId", "ac"],
        source_overrides: &[],
    },
    TypeRule {
        hint: "GraphExperiment",
        resolved: "GraphExperiment",
        id_keys: &["ac"],
        source_overrides: &[],
    },
    TypeRule {
        hint: "GraphEvidenceType",
        resolved: "GraphEvidenceType",
        id_keys: &["mIIdentifier", "ac"],
        source_overrides: &[],
    },
    TypeRule {
        hint: "GraphCvTerm",
        resolved: "GraphCvTerm",
        id_keys: &["mIIdentifier", "ac"],
        source_overrides: &[],
    },
    TypeRule {
        hint: "GraphBinaryInteractionEvidence",
        resolved: "GraphBinaryInteractionEvidence",
        id_keys: &["ac", "imexId"],
        source_overrides: &[],
    },
    TypeRule {
        hint: "GraphInteractor",
        resolved: "GraphInteractor",
        id_keys: INTERACTOR_KEYS,
        source_overrides: &[],
    },
    // Interactor kinds, keyed by the short name of the interactor type
    // term attached to the element in the source graph.
    TypeRule {
        hint: "protein",
        resolved: "Protein",
        id_keys: INTERACTOR_KEYS,
        source_overrides: &[("uniprotkb", UNIPROT_KEYS)],
    },
    TypeRule {
        hint: "peptide",
        resolved: "Peptide",
        id_keys: INTERACTOR_KEYS,
        source_overrides: &[("uniprotkb", UNIPROT_KEYS)],
    },
    TypeRule {
        hint: "small molecule",
        resolved: "SmallMolecule",
        id_keys: INTERACTOR_KEYS,
        source_overrides: &[("chebi", &["chebiId", "preferredIdentifierStr", "ac"])],
    },
    TypeRule {
        hint: "gene",
        resolved: "Gene",
        id_keys: INTERACTOR_KEYS,
        source_overrides: &[],
    },
    TypeRule {
        hint: "dna",
        resolved: "Dna",
        id_keys: INTERACTOR_KEYS,
        source_overrides: &[],
    },
    TypeRule {
        hint: "rna",
        resolved: "Rna",
        id_keys: INTERACTOR_KEYS,
        source_overrides: &[],
    },
    TypeRule {
        hint: "complex",
        resolved: "Complex",
        id_keys: &["complexAc", "preferredIdentifierStr", "ac"],
        source_overrides: &[],
    },
];

/// Normalized node types the resolver can emit. The sink uses this as
/// its node schema.
pub fn known_node_types() -> impl Iterator<Item = &'static str> {
    TYPE_RULES.iter().map(|rule| rule.resolved)
}

fn rule_for(hint: &str) -> Option<&'static TypeRule> {
    TYPE_RULES.iter().find(|rule| rule.hint.eq_ignore_ascii_case(hint))
}

/// Resolve an element's canonical id and normalized type.
///
/// `label_hint` is the label (or interactor-kind short name) the element
/// was retrieved under; `source_hint` names the upstream database whose
/// identifier scheme applies, when known. Deterministic, no I/O. A
/// missing identifier is not an error: the id falls back to the type
/// plus the store-internal handle, flagged as synthesized.
pub fn resolve(element: &GraphElement, label_hint: &str, source_hint: Option<&str>) -> Resolved {
    let rule = rule_for(label_hint);

    let node_type = match rule {
        Some(rule) => rule.resolved.to_string(),
        // Unknown hints pass through verbatim; the sink reports them.
        None => label_hint.to_string(),
    };

    let candidates: &[&str] = match rule {
        Some(rule) => source_hint
            .and_then(|src| {
                rule.source_overrides
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(src))
                    .map(|(_, keys)| *keys)
            })
            .unwrap_or(rule.id_keys),
        None => DEFAULT_ID_KEYS,
    };

    for key in candidates {
        if let Some(id) = element.property_str(key) {
            return Resolved {
                id,
                node_type,
                provenance: IdProvenance::Source,
            };
        }
    }

    debug!(
        "No identifier property found for {} (internal id {}), synthesizing one",
        node_type, element.internal_id
    );

    Resolved {
        id: format!("{}:{}", node_type.to_ascii_lowercase(), element.internal_id),
        node_type,
        provenance: IdProvenance::Synthesized,
    }
}
