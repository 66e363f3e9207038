//! JSON-LD processing needed to turn a document into an RDF dataset.
//!
//! [Expansion](expansion) is done by the [`json_ld`] crate. Node map
//! generation and [RDF serialization](to_rdf) are done here, over the
//! expanded document.

pub mod expansion;
pub mod to_rdf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::loader::Loader;
use crate::rdf::DataSet;

pub use expansion::expand;
pub use to_rdf::{generate_node_map, json_ld_to_rdf, BlankNodeIdentifierGenerator, NodeMap};

/// Options for JSON-LD processing.
///
/// <https://w3c.github.io/json-ld-api/#the-jsonldoptions-type>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonLdOptions {
    /// <https://w3c.github.io/json-ld-api/#dom-jsonldoptions-base>
    pub base: Option<String>,
    /// Fail on terms the active context does not define, and on identifiers
    /// that are not absolute IRIs, instead of dropping them.
    pub strict: bool,
}

impl Default for JsonLdOptions {
    fn default() -> Self {
        Self {
            base: None,
            strict: true,
        }
    }
}

/// <https://www.w3.org/TR/json-ld11/#keywords>
pub const AT_BASE: &str = "@base";
pub const AT_CONTAINER: &str = "@container";
pub const AT_CONTEXT: &str = "@context";
pub const AT_DEFAULT: &str = "@default";
pub const AT_DIRECTION: &str = "@direction";
pub const AT_GRAPH: &str = "@graph";
pub const AT_ID: &str = "@id";
pub const AT_IMPORT: &str = "@import";
pub const AT_INCLUDED: &str = "@included";
pub const AT_INDEX: &str = "@index";
pub const AT_JSON: &str = "@json";
pub const AT_LANGUAGE: &str = "@language";
pub const AT_LIST: &str = "@list";
pub const AT_NEST: &str = "@nest";
pub const AT_NONE: &str = "@none";
pub const AT_PREFIX: &str = "@prefix";
pub const AT_PROPAGATE: &str = "@propagate";
pub const AT_PROTECTED: &str = "@protected";
pub const AT_REVERSE: &str = "@reverse";
pub const AT_SET: &str = "@set";
pub const AT_TYPE: &str = "@type";
pub const AT_VALUE: &str = "@value";
pub const AT_VERSION: &str = "@version";
pub const AT_VOCAB: &str = "@vocab";

pub fn is_keyword(string: &str) -> bool {
    matches!(
        string,
        AT_BASE
            | AT_CONTAINER
            | AT_CONTEXT
            | AT_DIRECTION
            | AT_GRAPH
            | AT_ID
            | AT_IMPORT
            | AT_INCLUDED
            | AT_INDEX
            | AT_JSON
            | AT_LANGUAGE
            | AT_LIST
            | AT_NEST
            | AT_NONE
            | AT_PREFIX
            | AT_PROPAGATE
            | AT_PROTECTED
            | AT_REVERSE
            | AT_SET
            | AT_TYPE
            | AT_VALUE
            | AT_VERSION
            | AT_VOCAB
    )
}

pub fn is_blank_node_identifier(string: &str) -> bool {
    string.starts_with("_:")
}

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const CREDENTIALS_V2_CONTEXT: &str = "https://www.w3.org/ns/credentials/v2";
pub const SECURITY_V1_CONTEXT: &str = "https://w3id.org/security/v1";
pub const SECURITY_V2_CONTEXT: &str = "https://w3id.org/security/v2";
pub const DID_V1_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
pub const W3ID_DID_V1_CONTEXT: &str = "https://w3id.org/did/v1";
pub const W3ID_DATA_INTEGRITY_V1_CONTEXT: &str = "https://w3id.org/security/data-integrity/v1";
pub const W3ID_MULTIKEY_V1_CONTEXT: &str = "https://w3id.org/security/multikey/v1";

/// Values of a JSON-LD entry as a list: arrays are flattened one level,
/// `null` is empty.
pub(crate) fn as_vec(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        value => vec![value],
    }
}

pub(crate) fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Expand a document and generate its node map.
///
/// <https://w3c.github.io/json-ld-api/#flattening-algorithm>, without compaction.
pub async fn node_map(
    document: &Value,
    loader: &dyn Loader,
    options: &JsonLdOptions,
) -> Result<NodeMap, Error> {
    let expanded = expand(document, loader, options).await?;
    let mut generator = BlankNodeIdentifierGenerator::default();
    let mut node_map = NodeMap::new();
    node_map.insert(AT_DEFAULT.to_string(), Default::default());
    generate_node_map(
        Value::Array(expanded),
        &mut node_map,
        AT_DEFAULT,
        None,
        None,
        None,
        &mut generator,
    )?;
    Ok(node_map)
}

/// Convert an already expanded document to an RDF dataset.
///
/// See [`json_ld_to_rdf`] for what `strict` rejects.
pub fn expanded_to_dataset(expanded: Value, strict: bool) -> Result<DataSet, Error> {
    let mut generator = BlankNodeIdentifierGenerator::default();
    let mut node_map = NodeMap::new();
    node_map.insert(AT_DEFAULT.to_string(), Default::default());
    generate_node_map(
        expanded,
        &mut node_map,
        AT_DEFAULT,
        None,
        None,
        None,
        &mut generator,
    )?;
    let mut dataset = DataSet::default();
    json_ld_to_rdf(&node_map, &mut dataset, &mut generator, strict)?;
    Ok(dataset)
}

/// <https://w3c.github.io/json-ld-api/#deserialize-json-ld-to-rdf-algorithm>
pub async fn json_to_dataset(
    document: &Value,
    loader: &dyn Loader,
    options: &JsonLdOptions,
) -> Result<DataSet, Error> {
    let expanded = expand(document, loader, options).await?;
    expanded_to_dataset(Value::Array(expanded), options.strict)
}
