//! Verification method and controller resolution.
//!
//! Documents are loaded through a [`Loader`] and interpreted through their
//! JSON-LD node map, so a verification method is found whether it is embedded
//! in its controller document or published on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::jsonld::{self, JsonLdOptions, NodeMap, AT_DEFAULT, AT_ID, AT_TYPE, AT_VALUE};
use crate::loader::Loader;
use crate::verification_relationship::VerificationRelationship;

pub const SECURITY_VOCAB: &str = "https://w3id.org/security#";
pub const SEC_CONTROLLER: &str = "https://w3id.org/security#controller";
pub const SEC_PUBLIC_KEY_MULTIBASE: &str = "https://w3id.org/security#publicKeyMultibase";
pub const SEC_REVOKED: &str = "https://w3id.org/security#revoked";
pub const SEC_EXPIRATION: &str = "https://w3id.org/security#expiration";

/// A resolved verification method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl VerificationMethod {
    pub fn is_revoked_at(&self, date: DateTime<Utc>) -> bool {
        self.revoked.map_or(false, |revoked| revoked <= date)
    }
}

/// Documents used for resolution are not signed, so terms they fail to define
/// are dropped rather than rejected.
fn resolution_options() -> JsonLdOptions {
    JsonLdOptions {
        strict: false,
        ..Default::default()
    }
}

/// URL of the document holding a (possibly fragment-qualified) identifier.
pub fn document_url(id: &str) -> &str {
    match id.split_once('#') {
        Some((url, _fragment)) => url,
        None => id,
    }
}

fn first_value<'a>(node: &'a Map<String, Value>, property: &str) -> Option<&'a Value> {
    node.get(property)?.as_array()?.first()
}

fn id_of(value: &Value) -> Option<&str> {
    value.get(AT_ID)?.as_str()
}

fn literal_of(value: &Value) -> Option<&str> {
    value.get(AT_VALUE)?.as_str()
}

fn parse_date(date: &str) -> Result<DateTime<Utc>, Error> {
    Ok(DateTime::parse_from_rfc3339(date)?.with_timezone(&Utc))
}

fn find_node<'a>(node_map: &'a NodeMap, id: &str) -> Option<&'a Map<String, Value>> {
    node_map
        .get(AT_DEFAULT)
        .and_then(|graph| graph.get(id))
        .or_else(|| node_map.values().find_map(|graph| graph.get(id)))
        .and_then(Value::as_object)
}

/// Load a verification method by id, with all of its properties.
pub async fn resolve_verification_method(
    method_id: &str,
    loader: &dyn Loader,
) -> Result<VerificationMethod, Error> {
    let remote = loader
        .load(document_url(method_id))
        .await
        .map_err(|err| match err {
            Error::DocumentNotFound(_) => Error::MethodNotFound(method_id.to_string()),
            err => err,
        })?;
    let node_map = jsonld::node_map(&remote.document, loader, &resolution_options()).await?;
    let node = find_node(&node_map, method_id)
        .ok_or_else(|| Error::MethodNotFound(method_id.to_string()))?;
    let invalid = |message: &str| {
        Error::InvalidVerificationMethod(method_id.to_string(), message.to_string())
    };
    let type_ = node
        .get(AT_TYPE)
        .and_then(Value::as_array)
        .and_then(|types| types.iter().find_map(Value::as_str))
        .ok_or_else(|| invalid("missing type"))?;
    let date = |property: &str| -> Result<Option<DateTime<Utc>>, Error> {
        first_value(node, property)
            .and_then(literal_of)
            .map(parse_date)
            .transpose()
    };
    let method = VerificationMethod {
        id: method_id.to_string(),
        type_: type_.strip_prefix(SECURITY_VOCAB).unwrap_or(type_).to_string(),
        controller: first_value(node, SEC_CONTROLLER)
            .and_then(id_of)
            .map(String::from),
        public_key_multibase: first_value(node, SEC_PUBLIC_KEY_MULTIBASE)
            .and_then(literal_of)
            .map(String::from),
        revoked: date(SEC_REVOKED)?,
        expires: date(SEC_EXPIRATION)?,
    };
    log::debug!("Resolved verification method {}", method.id);
    Ok(method)
}

/// Check that a controller document grants a verification method the given
/// relationship.
///
/// Returns the controller framed without embedding: the method appears only
/// as a reference.
pub async fn resolve_controller_claim(
    controller_document: &Value,
    controller_id: &str,
    relationship: VerificationRelationship,
    method_id: &str,
    loader: &dyn Loader,
) -> Result<Value, Error> {
    let not_found = || Error::ControllerNotFound {
        controller: controller_id.to_string(),
        relationship: relationship.to_string(),
        method: method_id.to_string(),
    };
    let node_map = jsonld::node_map(controller_document, loader, &resolution_options()).await?;
    let controller = find_node(&node_map, controller_id).ok_or_else(not_found)?;
    let authorized = controller
        .get(relationship.to_iri())
        .and_then(Value::as_array)
        .map_or(false, |methods| {
            methods.iter().any(|method| id_of(method) == Some(method_id))
        });
    if !authorized {
        return Err(not_found());
    }
    let mut framed = Map::new();
    framed.insert("id".to_string(), Value::String(controller_id.to_string()));
    framed.insert(
        relationship.as_str().to_string(),
        Value::Array(vec![Value::String(method_id.to_string())]),
    );
    Ok(Value::Object(framed))
}

/// Load the controller of a verification method and check it grants the
/// method the given relationship.
pub async fn authorize_verification_method(
    method: &VerificationMethod,
    relationship: VerificationRelationship,
    loader: &dyn Loader,
) -> Result<Value, Error> {
    let not_found = || Error::ControllerNotFound {
        controller: method.controller.clone().unwrap_or_default(),
        relationship: relationship.to_string(),
        method: method.id.clone(),
    };
    let controller_id = method.controller.as_deref().ok_or_else(not_found)?;
    let remote = loader
        .load(document_url(controller_id))
        .await
        .map_err(|err| match err {
            Error::DocumentNotFound(_) => not_found(),
            err => err,
        })?;
    resolve_controller_claim(
        &remote.document,
        controller_id,
        relationship,
        &method.id,
        loader,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{ContextMapLoader, LoaderChain};
    use serde_json::json;

    const PUBLIC_KEY: &str = "z6MkrJVnaZkeFzdQyMZu1cgjg7k1pZZ6pvBQ7XJPt4swbTQ2";

    fn controller_document() -> Value {
        json!({
            "@context": [
                "https://www.w3.org/ns/did/v1",
                "https://w3id.org/security/multikey/v1"
            ],
            "id": "did:example:123",
            "verificationMethod": [{
                "id": "did:example:123#key-1",
                "type": "Multikey",
                "controller": "did:example:123",
                "publicKeyMultibase": PUBLIC_KEY
            }, {
                "id": "did:example:123#key-2",
                "type": "Multikey",
                "controller": "did:example:123",
                "publicKeyMultibase": PUBLIC_KEY,
                "revoked": "2020-01-01T00:00:00Z"
            }],
            "assertionMethod": ["did:example:123#key-1"]
        })
    }

    fn loader() -> LoaderChain {
        LoaderChain::with_fallback(
            ContextMapLoader::new().with_document("did:example:123", controller_document()),
        )
    }

    #[tokio::test]
    async fn resolve_method() {
        let method = resolve_verification_method("did:example:123#key-1", &loader())
            .await
            .unwrap();
        assert_eq!(method.type_, "Multikey");
        assert_eq!(method.controller.as_deref(), Some("did:example:123"));
        assert_eq!(method.public_key_multibase.as_deref(), Some(PUBLIC_KEY));
        assert!(method.revoked.is_none());

        let revoked = resolve_verification_method("did:example:123#key-2", &loader())
            .await
            .unwrap();
        assert!(revoked.is_revoked_at(Utc::now()));

        let err = resolve_verification_method("did:example:123#key-3", &loader())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MethodNotFound(_)));
        let err = resolve_verification_method("did:example:456#key-1", &loader())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MethodNotFound(_)));
    }

    #[tokio::test]
    async fn controller_claim() {
        let framed = resolve_controller_claim(
            &controller_document(),
            "did:example:123",
            VerificationRelationship::AssertionMethod,
            "did:example:123#key-1",
            &loader(),
        )
        .await
        .unwrap();
        assert_eq!(
            framed,
            json!({"id": "did:example:123", "assertionMethod": ["did:example:123#key-1"]})
        );

        let err = resolve_controller_claim(
            &controller_document(),
            "did:example:123",
            VerificationRelationship::Authentication,
            "did:example:123#key-1",
            &loader(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::ControllerNotFound { .. }));
    }

    #[test]
    fn url_without_fragment() {
        assert_eq!(document_url("did:example:123#key-1"), "did:example:123");
        assert_eq!(document_url("https://example.org/key"), "https://example.org/key");
    }
}
