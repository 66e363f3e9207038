//! Node map generation and RDF serialization of expanded JSON-LD.

use std::collections::{BTreeMap, HashMap};
use std::convert::TryFrom;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::*;
use crate::error::Error;
use crate::rdf::{
    BlankNodeLabel, DataSet, Graph, GraphLabel, IRIOrBlankNodeIdentifier, IRIRef, Lang, Literal,
    Object, Predicate, StringLiteral, Subject, Triple, LANG_STRING_IRI_STR, RDF_FIRST, RDF_JSON,
    RDF_NIL, RDF_REST, RDF_TYPE, XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER, XSD_STRING,
};

/// Graph name to subject identifier to node object.
pub type NodeMap = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Debug, Clone, Default)]
pub struct BlankNodeIdentifierGenerator {
    pub identifier_map: HashMap<String, String>,
    pub counter: u64,
}

impl BlankNodeIdentifierGenerator {
    /// <https://w3c.github.io/json-ld-api/#generate-blank-node-identifier>
    pub fn generate(&mut self, identifier: Option<&str>) -> String {
        // 1
        if let Some(identifier) = identifier {
            if let Some(id) = self.identifier_map.get(identifier) {
                return id.clone();
            }
        }
        // 2
        let id = format!("_:b{}", self.counter);
        self.counter += 1;
        // 3
        if let Some(old_id) = identifier {
            self.identifier_map.insert(old_id.to_string(), id.clone());
        }
        // 4
        id
    }

    fn relabel(&mut self, value: Value) -> Value {
        match value {
            Value::String(id) if is_blank_node_identifier(&id) => {
                Value::String(self.generate(Some(&id)))
            }
            value => value,
        }
    }
}

fn node_mut<'a>(
    node_map: &'a mut NodeMap,
    graph: &str,
    subject: &str,
) -> Result<&'a mut Map<String, Value>, Error> {
    node_map
        .get_mut(graph)
        .and_then(|graph| graph.get_mut(subject))
        .and_then(Value::as_object_mut)
        .ok_or(Error::MissingIdentifier)
}

/// Append a value to a node property unless an equal value is there.
fn add_unique(node: &mut Map<String, Value>, property: &str, value: Value) {
    let entry = node
        .entry(property.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = entry {
        if !items.contains(&value) {
            items.push(value);
        }
    }
}

fn push_to_list(list: &mut Map<String, Value>, value: Value) -> Result<(), Error> {
    match list.get_mut(AT_LIST) {
        Some(Value::Array(items)) => {
            items.push(value);
            Ok(())
        }
        _ => Err(Error::ExpectedArray),
    }
}

/// Add a value to the active subject, or to the list being built.
fn attach(
    node_map: &mut NodeMap,
    active_graph: &str,
    active_subject: Option<&Value>,
    active_property: Option<&str>,
    list: &mut Value,
    value: Value,
    unique: bool,
) -> Result<(), Error> {
    match list {
        Value::Null => {
            let subject = active_subject
                .and_then(Value::as_str)
                .ok_or(Error::MissingIdentifier)?;
            let property = active_property.ok_or(Error::ExpectedString)?;
            let node = node_mut(node_map, active_graph, subject)?;
            if unique {
                add_unique(node, property, value);
            } else if let Value::Array(items) = node
                .entry(property.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                items.push(value);
            }
            Ok(())
        }
        Value::Object(list) => push_to_list(list, value),
        _ => Err(Error::ExpectedObject),
    }
}

/// <https://w3c.github.io/json-ld-api/#node-map-generation>
pub fn generate_node_map(
    element: Value,
    node_map: &mut NodeMap,
    active_graph: &str,
    active_subject: Option<&Value>,
    active_property: Option<&str>,
    list: Option<&mut Value>,
    blank_node_id_generator: &mut BlankNodeIdentifierGenerator,
) -> Result<(), Error> {
    let mut null = Value::Null;
    let list = list.unwrap_or(&mut null);
    let mut element_obj = match element {
        Value::Array(array) => {
            // 1
            for item in array {
                generate_node_map(
                    item,
                    node_map,
                    active_graph,
                    active_subject,
                    active_property,
                    Some(&mut *list),
                    blank_node_id_generator,
                )?;
            }
            return Ok(());
        }
        Value::Object(object) => object,
        _ => return Err(Error::ExpectedObject),
    };
    // 2
    node_map.entry(active_graph.to_string()).or_default();
    // 3
    if let Some(types) = element_obj.remove(AT_TYPE) {
        let types = match types {
            Value::Array(types) => Value::Array(
                types
                    .into_iter()
                    .map(|type_| blank_node_id_generator.relabel(type_))
                    .collect(),
            ),
            type_ => blank_node_id_generator.relabel(type_),
        };
        element_obj.insert(AT_TYPE.to_string(), types);
    }
    if element_obj.contains_key(AT_VALUE) {
        // 4
        attach(
            node_map,
            active_graph,
            active_subject,
            active_property,
            list,
            Value::Object(element_obj),
            true,
        )?;
    } else if let Some(element_list) = element_obj.remove(AT_LIST) {
        // 5
        let mut result = single(AT_LIST, Value::Array(Vec::new()));
        generate_node_map(
            element_list,
            node_map,
            active_graph,
            active_subject,
            active_property,
            Some(&mut result),
            blank_node_id_generator,
        )?;
        attach(
            node_map,
            active_graph,
            active_subject,
            active_property,
            list,
            result,
            false,
        )?;
    } else {
        // 6.1-6.2
        let id = match element_obj.remove(AT_ID) {
            Some(Value::String(id)) if is_blank_node_identifier(&id) => {
                blank_node_id_generator.generate(Some(&id))
            }
            Some(Value::String(id)) => id,
            Some(Value::Null) | None => blank_node_id_generator.generate(None),
            Some(_) => return Err(Error::ExpectedString),
        };
        let id_value = Value::String(id.clone());
        // 6.3
        if let Some(graph) = node_map.get_mut(active_graph) {
            graph
                .entry(id.clone())
                .or_insert_with(|| single(AT_ID, id_value.clone()));
        }
        // 6.6
        if active_property.is_some() {
            attach(
                node_map,
                active_graph,
                active_subject,
                active_property,
                list,
                single(AT_ID, id_value.clone()),
                true,
            )?;
        }
        // 6.7
        if let Some(types) = element_obj.remove(AT_TYPE) {
            let node = node_mut(node_map, active_graph, &id)?;
            for type_ in as_vec(types) {
                add_unique(node, AT_TYPE, type_);
            }
        }
        // 6.8
        if let Some(index) = element_obj.remove(AT_INDEX) {
            let node = node_mut(node_map, active_graph, &id)?;
            match node.get(AT_INDEX) {
                Some(existing) if existing != &index => return Err(Error::ConflictingIndexes),
                Some(_) => {}
                None => {
                    node.insert(AT_INDEX.to_string(), index);
                }
            }
        }
        // 6.9
        if element_obj.contains_key(AT_REVERSE) {
            return Err(Error::UnsupportedJsonLd(AT_REVERSE.to_string()));
        }
        // 6.10
        if let Some(graph) = element_obj.remove(AT_GRAPH) {
            generate_node_map(
                graph,
                node_map,
                &id,
                None,
                None,
                None,
                blank_node_id_generator,
            )?;
        }
        // 6.12
        for (property, value) in element_obj {
            // 6.12.1
            let property = if is_blank_node_identifier(&property) {
                blank_node_id_generator.generate(Some(&property))
            } else {
                property
            };
            // 6.12.2
            node_mut(node_map, active_graph, &id)?
                .entry(property.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            // 6.12.3
            generate_node_map(
                value,
                node_map,
                active_graph,
                Some(&id_value),
                Some(property.as_str()),
                None,
                blank_node_id_generator,
            )?;
        }
    }
    Ok(())
}

/// Something toRdf cannot express in RDF: an error when `strict`, else a
/// warning and the term is left out of the dataset.
fn drop_term(strict: bool, error: Error) -> Result<(), Error> {
    if strict {
        return Err(error);
    }
    log::warn!("Dropping term from RDF dataset: {}", error);
    Ok(())
}

/// <https://w3c.github.io/json-ld-api/#deserialize-json-ld-to-rdf-algorithm>
///
/// In `strict` mode, a subject, type, predicate, object or graph name that is
/// not an absolute IRI or blank node identifier is an error. Otherwise such
/// triples are dropped, as the algorithm prescribes.
pub fn json_ld_to_rdf(
    node_map: &NodeMap,
    dataset: &mut DataSet,
    blank_node_id_generator: &mut BlankNodeIdentifierGenerator,
    strict: bool,
) -> Result<(), Error> {
    // 1
    for (graph_name, graph) in node_map {
        // 1.1
        let graph_label = if graph_name == AT_DEFAULT {
            None
        } else {
            match IRIOrBlankNodeIdentifier::try_from(graph_name.clone()) {
                Ok(label) => Some(GraphLabel::from(label)),
                Err(_) => {
                    drop_term(strict, Error::InvalidIri(graph_name.clone()))?;
                    continue;
                }
            }
        };
        let mut triples = Graph::default();
        // 1.3
        for (subject, node) in graph {
            // 1.3.1
            let subject = match IRIOrBlankNodeIdentifier::try_from(subject.clone()) {
                Ok(subject) => Subject::from(subject),
                Err(_) => {
                    drop_term(strict, Error::InvalidIri(subject.clone()))?;
                    continue;
                }
            };
            let node = node.as_object().ok_or(Error::ExpectedObject)?;
            // 1.3.2
            for (property, values) in node {
                let values = values.as_array().map(Vec::as_slice).unwrap_or_default();
                if property == AT_TYPE {
                    // 1.3.2.1
                    for type_ in values {
                        let type_ = type_.as_str().ok_or(Error::ExpectedString)?;
                        let object = match IRIOrBlankNodeIdentifier::try_from(type_.to_string()) {
                            Ok(object) => Object::from(object),
                            Err(_) => {
                                drop_term(strict, Error::InvalidIri(type_.to_string()))?;
                                continue;
                            }
                        };
                        triples.add(Triple {
                            subject: subject.clone(),
                            predicate: Predicate::IRIRef(IRIRef(RDF_TYPE.to_string())),
                            object,
                        });
                    }
                    continue;
                }
                // 1.3.2.2-1.3.2.4
                if is_keyword(property) {
                    continue;
                }
                if is_blank_node_identifier(property) {
                    drop_term(strict, Error::UnsupportedBlankPredicate)?;
                    continue;
                }
                let predicate = match IRIRef::try_from(property.clone()) {
                    Ok(iri) => Predicate::IRIRef(iri),
                    Err(_) => {
                        drop_term(strict, Error::InvalidIri(property.clone()))?;
                        continue;
                    }
                };
                // 1.3.2.5
                for item in values {
                    // 1.3.2.5.1
                    let mut list_triples = Vec::new();
                    // 1.3.2.5.2
                    if let Some(object) =
                        object_to_rdf(item, &mut list_triples, blank_node_id_generator, strict)?
                    {
                        triples.add(Triple {
                            subject: subject.clone(),
                            predicate: predicate.clone(),
                            object,
                        });
                    }
                    // 1.3.2.5.3
                    triples.triples.append(&mut list_triples);
                }
            }
        }
        match graph_label {
            None => dataset.default_graph.triples.append(&mut triples.triples),
            Some(label) => dataset
                .named_graphs
                .entry(label)
                .or_default()
                .triples
                .append(&mut triples.triples),
        }
    }
    Ok(())
}

/// <https://w3c.github.io/json-ld-api/#object-to-rdf-conversion>
pub fn object_to_rdf(
    item: &Value,
    list_triples: &mut Vec<Triple>,
    blank_node_id_generator: &mut BlankNodeIdentifierGenerator,
    strict: bool,
) -> Result<Option<Object>, Error> {
    let item = item.as_object().ok_or(Error::ExpectedObject)?;
    // 3
    if let Some(list) = item.get(AT_LIST) {
        return list_to_rdf(list, list_triples, blank_node_id_generator, strict).map(Some);
    }
    let value = match item.get(AT_VALUE) {
        Some(value) => value,
        None => {
            // 1-2
            let id = match item.get(AT_ID).and_then(Value::as_str) {
                Some(id) => id,
                None => return Ok(None),
            };
            return match IRIOrBlankNodeIdentifier::try_from(id.to_string()) {
                Ok(id) => Ok(Some(Object::from(id))),
                Err(_) => {
                    drop_term(strict, Error::InvalidIri(id.to_string()))?;
                    Ok(None)
                }
            };
        }
    };
    // 5-6
    let mut datatype = match item.get(AT_TYPE) {
        None => None,
        Some(Value::String(datatype)) => {
            if datatype != AT_JSON && IRIRef::try_from(datatype.clone()).is_err() {
                drop_term(strict, Error::InvalidIri(datatype.clone()))?;
                return Ok(None);
            }
            Some(datatype.clone())
        }
        Some(_) => {
            drop_term(strict, Error::ExpectedString)?;
            return Ok(None);
        }
    };
    // 7
    let language = match item.get(AT_LANGUAGE) {
        None => None,
        Some(Value::String(language)) => match Lang::from_str(language) {
            Ok(lang) => Some(lang),
            Err(_) => {
                drop_term(strict, Error::ExpectedLang)?;
                return Ok(None);
            }
        },
        Some(_) => {
            drop_term(strict, Error::ExpectedString)?;
            return Ok(None);
        }
    };
    // 8
    let value = if datatype.as_deref() == Some(AT_JSON) {
        datatype = Some(RDF_JSON.to_string());
        Value::String(serde_jcs::to_string(value)?)
    } else {
        value.clone()
    };
    let is_double = datatype.as_deref() == Some(XSD_DOUBLE);
    let mut default_datatype = |default: &str| {
        if datatype.is_none() {
            datatype = Some(default.to_string());
        }
    };
    let lexical = match value {
        // 9
        Value::Bool(boolean) => {
            default_datatype(XSD_BOOLEAN);
            boolean.to_string()
        }
        Value::Number(number) => {
            let number_f64 = number.as_f64().ok_or(Error::SerializeDouble)?;
            if number_f64.fract() != 0.0 || number_f64.abs() >= 1e21 || is_double {
                // 10
                default_datatype(XSD_DOUBLE);
                canonical_double(number_f64)?
            } else {
                // 11
                default_datatype(XSD_INTEGER);
                if let Some(integer) = number.as_i64() {
                    integer.to_string()
                } else if let Some(integer) = number.as_u64() {
                    integer.to_string()
                } else if number_f64 == 0.0 {
                    "0".to_string()
                } else {
                    format!("{:.0}", number_f64)
                }
            }
        }
        // 12
        Value::String(string) => {
            if language.is_some() {
                default_datatype(LANG_STRING_IRI_STR);
            } else {
                default_datatype(XSD_STRING);
            }
            string
        }
        _ => return Err(Error::ExpectedString),
    };
    let string = StringLiteral(lexical);
    // 13-14
    let literal = match (language, datatype) {
        (Some(lang), _) => Literal::LangTagged { string, lang },
        (None, Some(datatype)) if datatype == XSD_STRING => Literal::String { string },
        (None, Some(datatype)) => Literal::Typed {
            string,
            type_: IRIRef(datatype),
        },
        (None, None) => Literal::String { string },
    };
    // 15
    Ok(Some(Object::Literal(literal)))
}

/// <https://www.w3.org/TR/xmlschema11-2/#f-doubleCanmap>
fn canonical_double(number: f64) -> Result<String, Error> {
    let formatted = format!("{:.15E}", number);
    let (mantissa, exponent) = formatted.split_once('E').ok_or(Error::SerializeDouble)?;
    // Replace (\d)0*E with $1E
    let mantissa = match mantissa.split_once('.') {
        Some((integer, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            let fraction = if fraction.is_empty() { "0" } else { fraction };
            format!("{}.{}", integer, fraction)
        }
        None => mantissa.to_string(),
    };
    Ok(format!("{}E{}", mantissa, exponent))
}

/// <https://w3c.github.io/json-ld-api/#list-to-rdf-conversion>
pub fn list_to_rdf(
    list: &Value,
    list_triples: &mut Vec<Triple>,
    blank_node_id_generator: &mut BlankNodeIdentifierGenerator,
    strict: bool,
) -> Result<Object, Error> {
    let list = list.as_array().ok_or(Error::ExpectedArray)?;
    // 1
    if list.is_empty() {
        return Ok(Object::IRIRef(IRIRef(RDF_NIL.to_string())));
    }
    // 2
    let bnodes: Vec<String> = list
        .iter()
        .map(|_| blank_node_id_generator.generate(None))
        .collect();
    // 3
    for (i, (subject, item)) in bnodes.iter().zip(list).enumerate() {
        let subject = Subject::BlankNodeLabel(BlankNodeLabel(subject.clone()));
        // 3.1
        let mut embedded_triples = Vec::new();
        // 3.2-3.3
        if let Some(object) =
            object_to_rdf(item, &mut embedded_triples, blank_node_id_generator, strict)?
        {
            list_triples.push(Triple {
                subject: subject.clone(),
                predicate: Predicate::IRIRef(IRIRef(RDF_FIRST.to_string())),
                object,
            });
        }
        // 3.4
        let rest = match bnodes.get(i + 1) {
            Some(rest) => Object::BlankNodeLabel(BlankNodeLabel(rest.clone())),
            None => Object::IRIRef(IRIRef(RDF_NIL.to_string())),
        };
        list_triples.push(Triple {
            subject,
            predicate: Predicate::IRIRef(IRIRef(RDF_REST.to_string())),
            object: rest,
        });
        // 3.5
        list_triples.append(&mut embedded_triples);
    }
    // 4
    Ok(Object::BlankNodeLabel(BlankNodeLabel(bnodes[0].clone())))
}
