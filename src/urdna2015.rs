//! RDF Dataset Canonicalization (URDNA2015)
//!
//! <https://www.w3.org/TR/rdf-canon/>

use std::collections::BTreeMap as Map;
use std::collections::HashSet;

use crate::error::Error;
use crate::hash::sha256_hex;
use crate::rdf::{BlankNodeLabel, DataSet, Predicate, Statement};

/// <https://www.w3.org/TR/rdf-canon/#canon-state>
#[derive(Debug, Clone)]
pub struct NormalizationState<'a> {
    pub blank_node_to_quads: Map<&'a str, Vec<&'a Statement>>,
    pub hash_to_blank_nodes: Map<String, Vec<&'a str>>,
    pub canonical_issuer: IdentifierIssuer,
}

/// <https://www.w3.org/TR/rdf-canon/#dfn-identifier-issuer>
#[derive(Debug, Clone)]
pub struct IdentifierIssuer {
    pub identifier_prefix: String,
    pub identifier_counter: u64,
    pub issued_identifiers_list: Vec<(String, String)>,
}

impl IdentifierIssuer {
    pub fn new(prefix: &str) -> Self {
        Self {
            identifier_prefix: prefix.to_string(),
            identifier_counter: 0,
            issued_identifiers_list: Vec::new(),
        }
    }

    pub fn find_issued_identifier(&self, existing_identifier: &str) -> Option<&str> {
        self.issued_identifiers_list
            .iter()
            .find(|(_, existing_id)| existing_id == existing_identifier)
            .map(|(issued_identifier, _)| issued_identifier.as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct HashNDegreeQuadsOutput {
    pub hash: String,
    pub issuer: IdentifierIssuer,
}

/// <https://www.w3.org/TR/rdf-canon/#hash-1d-quads>
pub fn hash_first_degree_quads(
    normalization_state: &NormalizationState,
    reference_blank_node_identifier: &str,
) -> String {
    // 1
    let mut nquads: Vec<String> = Vec::new();
    // 2
    if let Some(quads) = normalization_state
        .blank_node_to_quads
        .get(reference_blank_node_identifier)
    {
        // 3
        for quad in quads {
            // 3.1
            let mut quad: Statement = (*quad).clone();
            // 3.1.1
            for label in quad.blank_node_components_mut() {
                // 3.1.1.1
                label.0 = if label.0 == reference_blank_node_identifier {
                    "_:a".to_string()
                } else {
                    "_:z".to_string()
                };
            }
            nquads.push(String::from(&quad));
        }
    }
    // 4
    nquads.sort();
    // 5
    sha256_hex(nquads.join("").as_bytes())
}

/// Canonicalize a dataset, relabelling every blank node `_:c14nN`.
pub fn normalize(input_dataset: &DataSet) -> Result<DataSet, Error> {
    // https://www.w3.org/TR/rdf-canon/#canon-algo-algo
    // 1
    let mut normalization_state = NormalizationState {
        blank_node_to_quads: Map::new(),
        hash_to_blank_nodes: Map::new(),
        canonical_issuer: IdentifierIssuer::new("_:c14n"),
    };
    // 2
    let input_dataset_quads = input_dataset.statements();
    for quad in input_dataset_quads.iter() {
        // 2.1
        for blank_node_identifier in quad.blank_node_components() {
            normalization_state
                .blank_node_to_quads
                .entry(&blank_node_identifier.0)
                .or_insert_with(Vec::new)
                .push(quad);
        }
    }
    // 3
    let mut non_normalized_identifiers: HashSet<&str> = normalization_state
        .blank_node_to_quads
        .keys()
        .cloned()
        .collect();
    // 4
    let mut simple = true;
    // 5
    while simple {
        // 5.1
        simple = false;
        // 5.2
        normalization_state.hash_to_blank_nodes.clear();
        // 5.3
        for identifier in non_normalized_identifiers.iter() {
            // 5.3.1
            let hash = hash_first_degree_quads(&normalization_state, identifier);
            // 5.3.2
            normalization_state
                .hash_to_blank_nodes
                .entry(hash)
                .or_insert_with(Vec::new)
                .push(*identifier);
        }
        // 5.4
        let mut hashes_to_remove = Vec::new();
        for (hash, identifier_list) in normalization_state.hash_to_blank_nodes.iter() {
            // 5.4.1
            if identifier_list.len() > 1 {
                continue;
            }
            // 5.4.2
            let identifier = match identifier_list.first() {
                Some(id) => *id,
                None => continue,
            };
            issue_identifier(&mut normalization_state.canonical_issuer, identifier);
            // 5.4.3
            non_normalized_identifiers.remove(identifier);
            // 5.4.4
            hashes_to_remove.push(hash.clone());
            // 5.4.5
            simple = true;
        }
        for hash in hashes_to_remove {
            normalization_state.hash_to_blank_nodes.remove(&hash);
        }
    }
    // 6
    for (_hash, identifier_list) in normalization_state.hash_to_blank_nodes.clone() {
        // 6.1
        let mut hash_path_list: Vec<HashNDegreeQuadsOutput> = Vec::new();
        // 6.2
        for identifier in identifier_list {
            // 6.2.1
            if normalization_state
                .canonical_issuer
                .find_issued_identifier(identifier)
                .is_some()
            {
                continue;
            }
            // 6.2.2
            let mut temporary_issuer = IdentifierIssuer::new("_:b");
            // 6.2.3
            issue_identifier(&mut temporary_issuer, identifier);
            // 6.2.4
            hash_path_list.push(hash_n_degree_quads(
                &mut normalization_state,
                identifier,
                &mut temporary_issuer,
            )?);
        }
        // 6.3
        hash_path_list.sort_by(|a, b| a.hash.cmp(&b.hash));
        for result in hash_path_list {
            // 6.3.1
            for (_, existing_identifier) in result.issuer.issued_identifiers_list {
                issue_identifier(
                    &mut normalization_state.canonical_issuer,
                    &existing_identifier,
                );
            }
        }
    }
    // 7
    let mut normalized_dataset = DataSet::default();
    for quad in input_dataset_quads.iter() {
        // 7.1
        let mut quad_copy = quad.clone();
        for label in quad_copy.blank_node_components_mut() {
            let canonical_identifier = normalization_state
                .canonical_issuer
                .find_issued_identifier(&label.0)
                .ok_or(Error::MissingIdentifier)?;
            label.0 = canonical_identifier.to_string();
        }
        // 7.2
        normalized_dataset.add_statement(quad_copy);
    }
    // 8
    Ok(normalized_dataset)
}

/// <https://www.w3.org/TR/rdf-canon/#issue-identifier>
pub fn issue_identifier(
    identifier_issuer: &mut IdentifierIssuer,
    existing_identifier: &str,
) -> String {
    // 1
    if let Some(id) = identifier_issuer.find_issued_identifier(existing_identifier) {
        return id.to_string();
    }
    // 2
    let issued_identifier = identifier_issuer.identifier_prefix.to_owned()
        + &identifier_issuer.identifier_counter.to_string();
    // 3
    identifier_issuer
        .issued_identifiers_list
        .push((issued_identifier.clone(), existing_identifier.to_string()));
    // 4
    identifier_issuer.identifier_counter += 1;
    // 5
    issued_identifier
}

/// <https://www.w3.org/TR/rdf-canon/#hash-nd-quads>
pub fn hash_n_degree_quads(
    normalization_state: &mut NormalizationState,
    identifier: &str,
    issuer: &mut IdentifierIssuer,
) -> Result<HashNDegreeQuadsOutput, Error> {
    let mut issuer = issuer;
    let mut issuer_tmp: IdentifierIssuer;
    // 1
    let mut hash_to_related_blank_nodes: Map<String, Vec<&BlankNodeLabel>> = Map::new();
    // 2
    if let Some(quads) = normalization_state
        .blank_node_to_quads
        .get(identifier)
        // Clone to prevent multiple mutable borrows of normalization state
        .cloned()
    {
        // 3
        for quad in quads {
            // 3.1
            for (component, position) in quad.blank_node_components_with_position() {
                // Predicates are never blank nodes
                if component.0 != identifier {
                    // 3.1.1
                    let hash = hash_related_blank_node(
                        normalization_state,
                        &component.0,
                        quad,
                        issuer,
                        position,
                    );
                    // 3.1.2
                    hash_to_related_blank_nodes
                        .entry(hash)
                        .or_insert_with(Vec::new)
                        .push(component);
                }
            }
        }
    }
    // 4
    let mut data_to_hash = String::new();
    // 5
    // BTreeMap iterates in code point order of the hashes
    for (related_hash, blank_node_list) in hash_to_related_blank_nodes {
        // 5.1
        data_to_hash.push_str(&related_hash);
        // 5.2
        let mut chosen_path = String::new();
        // 5.3
        let mut chosen_issuer = None;
        // 5.4
        'permutations: for permutation in combination::permutate::from_vec(&blank_node_list) {
            // 5.4.1
            let mut issuer_copy = issuer.clone();
            // 5.4.2
            let mut path = String::new();
            // 5.4.3
            let mut recursion_list: Vec<String> = Vec::new();
            // 5.4.4
            for related in permutation {
                // 5.4.4.1
                if let Some(canonical_identifier) = normalization_state
                    .canonical_issuer
                    .find_issued_identifier(&related.0)
                {
                    path.push_str(canonical_identifier);
                // 5.4.4.2
                } else {
                    // 5.4.4.2.1
                    if issuer_copy.find_issued_identifier(&related.0).is_none() {
                        recursion_list.push(related.0.to_string());
                    }
                    // 5.4.4.2.2
                    path += &issue_identifier(&mut issuer_copy, &related.0);
                }
                // 5.4.4.3
                if !chosen_path.is_empty() && path.len() >= chosen_path.len() && path > chosen_path
                {
                    continue 'permutations;
                }
            }
            // 5.4.5
            for related in recursion_list {
                // 5.4.5.1
                let result = hash_n_degree_quads(normalization_state, &related, &mut issuer_copy)?;
                // 5.4.5.2
                path.push_str(&issue_identifier(&mut issuer_copy, &related));
                // 5.4.5.3
                path.push('<');
                path.push_str(&result.hash);
                path.push('>');
                // 5.4.5.4
                issuer_copy = result.issuer;
                // 5.4.5.5
                if !chosen_path.is_empty() && path.len() >= chosen_path.len() && path > chosen_path
                {
                    continue 'permutations;
                }
            }
            // 5.4.6
            if chosen_path.is_empty() || path < chosen_path {
                chosen_path = path;
                chosen_issuer.replace(issuer_copy);
            }
        }
        // 5.5
        data_to_hash.push_str(&chosen_path);
        // 5.6
        issuer_tmp = chosen_issuer.ok_or(Error::MissingChosenIssuer)?;
        issuer = &mut issuer_tmp;
    }
    // 6
    Ok(HashNDegreeQuadsOutput {
        hash: sha256_hex(data_to_hash.as_bytes()),
        issuer: issuer.to_owned(),
    })
}

/// <https://www.w3.org/TR/rdf-canon/#hash-related-blank-node>
pub fn hash_related_blank_node(
    normalization_state: &NormalizationState,
    related: &str,
    quad: &Statement,
    issuer: &IdentifierIssuer,
    position: char,
) -> String {
    // 1
    let identifier = match normalization_state
        .canonical_issuer
        .find_issued_identifier(related)
    {
        Some(id) => id.to_string(),
        None => match issuer.find_issued_identifier(related) {
            Some(id) => id.to_string(),
            None => hash_first_degree_quads(normalization_state, related),
        },
    };
    // 2
    let mut input = position.to_string();
    // 3
    if position != 'g' {
        let Predicate::IRIRef(ref predicate) = quad.predicate;
        input.push('<');
        input.push_str(&predicate.0);
        input.push('>');
    }
    // 4
    input += &identifier;
    // 5
    sha256_hex(input.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{GraphLabel, IRIRef, Literal, Object, StringLiteral, Subject};

    fn blank(label: &str) -> BlankNodeLabel {
        BlankNodeLabel(label.to_string())
    }

    fn quad(subject: Subject, predicate: &str, object: Object) -> Statement {
        Statement {
            subject,
            predicate: Predicate::IRIRef(IRIRef(predicate.to_string())),
            object,
            graph_label: None,
        }
    }

    fn dataset(statements: Vec<Statement>) -> DataSet {
        let mut dataset = DataSet::default();
        for statement in statements {
            dataset.add_statement(statement);
        }
        dataset
    }

    fn assert_nquads(actual: &str, expected: &str) {
        if actual != expected {
            let changes = difference::Changeset::new(actual, expected, "\n");
            panic!("canonical form mismatch:\n{}", changes);
        }
    }

    #[test]
    fn no_blank_nodes() {
        let input = dataset(vec![quad(
            Subject::IRIRef(IRIRef("http://example.org/s".to_string())),
            "http://example.org/p",
            Object::Literal(Literal::String {
                string: StringLiteral("o".to_string()),
            }),
        )]);
        let normalized = normalize(&input).unwrap();
        assert_nquads(
            &normalized.to_nquads(),
            "<http://example.org/s> <http://example.org/p> \"o\" .\n",
        );
    }

    #[test]
    fn relabels_independently_of_input_labels() {
        // Same graph, blank node labels swapped.
        let build = |a: &str, b: &str| {
            dataset(vec![
                quad(
                    Subject::BlankNodeLabel(blank(a)),
                    "http://example.org/name",
                    Object::Literal(Literal::String {
                        string: StringLiteral("alice".to_string()),
                    }),
                ),
                quad(
                    Subject::BlankNodeLabel(blank(a)),
                    "http://example.org/knows",
                    Object::BlankNodeLabel(blank(b)),
                ),
                quad(
                    Subject::BlankNodeLabel(blank(b)),
                    "http://example.org/name",
                    Object::Literal(Literal::String {
                        string: StringLiteral("bob".to_string()),
                    }),
                ),
            ])
        };
        let first = normalize(&build("_:x", "_:y")).unwrap().to_nquads();
        let second = normalize(&build("_:y", "_:x")).unwrap().to_nquads();
        assert_nquads(&first, &second);
        assert!(!first.contains("_:x") && !first.contains("_:y"));
        assert!(first.contains("_:c14n0") && first.contains("_:c14n1"));
    }

    #[test]
    fn symmetric_blank_nodes() {
        // Two blank nodes pointing at each other cannot be told apart by their
        // first-degree hash, so the n-degree hash has to break the tie.
        let input = dataset(vec![
            quad(
                Subject::BlankNodeLabel(blank("_:e0")),
                "http://example.org/vocab#next",
                Object::BlankNodeLabel(blank("_:e1")),
            ),
            quad(
                Subject::BlankNodeLabel(blank("_:e1")),
                "http://example.org/vocab#next",
                Object::BlankNodeLabel(blank("_:e0")),
            ),
        ]);
        let normalized = normalize(&input).unwrap().to_nquads();
        assert_nquads(
            &normalized,
            "_:c14n0 <http://example.org/vocab#next> _:c14n1 .\n_:c14n1 <http://example.org/vocab#next> _:c14n0 .\n",
        );
    }

    #[test]
    fn blank_graph_label() {
        let mut statement = quad(
            Subject::IRIRef(IRIRef("http://example.org/s".to_string())),
            "http://example.org/p",
            Object::IRIRef(IRIRef("http://example.org/o".to_string())),
        );
        statement.graph_label = Some(GraphLabel::BlankNodeLabel(blank("_:g")));
        let normalized = normalize(&dataset(vec![statement])).unwrap();
        assert_nquads(
            &normalized.to_nquads(),
            "<http://example.org/s> <http://example.org/p> <http://example.org/o> _:c14n0 .\n",
        );
    }
}
