//! Data Integrity proof nodes and proof sets.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::jsonld::as_vec;
use crate::one_or_many::OneOrMany;
use crate::verification_relationship::VerificationRelationship;

pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";
pub const PROOF: &str = "proof";

/// A proof node.
///
/// Before signing, a proof carries the proof options and no `proofValue`;
/// once signed, `proofValue` holds the multibase-encoded signature.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cryptosuite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<VerificationRelationship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<OneOrMany<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_proof: Option<OneOrMany<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,
    #[serde(flatten)]
    pub property_set: Map<String, Value>,
}

impl Proof {
    /// A `DataIntegrityProof` for the given suite and purpose.
    pub fn new(cryptosuite: &str, proof_purpose: VerificationRelationship) -> Self {
        Self {
            context: None,
            id: None,
            type_: DATA_INTEGRITY_PROOF.to_string(),
            cryptosuite: Some(cryptosuite.to_string()),
            proof_purpose: Some(proof_purpose),
            verification_method: None,
            created: None,
            expires: None,
            domain: None,
            challenge: None,
            nonce: None,
            previous_proof: None,
            proof_value: None,
            property_set: Map::new(),
        }
    }

    pub fn with_verification_method(mut self, verification_method: impl Into<String>) -> Self {
        self.verification_method = Some(verification_method.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_previous_proof(mut self, previous_proof: impl Into<OneOrMany<String>>) -> Self {
        self.previous_proof = Some(previous_proof.into());
        self
    }

    /// Set `created` to the current time, at second precision.
    pub fn created_now(&mut self) {
        self.created = Some(Utc::now().trunc_subsecs(0));
    }

    pub fn matches_domain(&self, domain: &str) -> bool {
        self.domain
            .as_ref()
            .map_or(false, |domains| domains.any(|d| d == domain))
    }
}

/// Proofs attached to a document, in order. A lone proof object counts as a
/// set of one.
pub fn proof_set(document: &Value) -> Result<Vec<Value>, Error> {
    let object = document.as_object().ok_or(Error::ExpectedObject)?;
    let proofs = as_vec(object.get(PROOF).cloned().unwrap_or(Value::Null));
    if proofs.is_empty() {
        return Err(Error::MissingProof);
    }
    if proofs.iter().any(|proof| !proof.is_object()) {
        return Err(Error::InvalidProof("Proof must be an object".to_string()));
    }
    Ok(proofs)
}

/// The document without its proofs.
pub fn unsecured_document(document: &Value) -> Result<Value, Error> {
    let mut object = document.as_object().cloned().ok_or(Error::ExpectedObject)?;
    object.remove(PROOF);
    Ok(Value::Object(object))
}

/// The document a chained proof signs: the unsecured document with the
/// referenced previous proofs under `proof`.
pub fn chained_document(unsecured: &Value, previous: Vec<Value>) -> Result<Value, Error> {
    let mut object = unsecured.as_object().cloned().ok_or(Error::ExpectedObject)?;
    object.remove(PROOF);
    match previous.len() {
        0 => {}
        1 => {
            object.insert(PROOF.to_string(), previous.into_iter().next().unwrap_or_default());
        }
        _ => {
            object.insert(PROOF.to_string(), Value::Array(previous));
        }
    }
    Ok(Value::Object(object))
}

/// Find proofs of a set by id, in the order the ids are given.
pub fn find_proofs<'i>(
    proofs: &[Value],
    ids: impl IntoIterator<Item = &'i str>,
) -> Result<Vec<Value>, Error> {
    ids.into_iter()
        .map(|id| {
            proofs
                .iter()
                .find(|proof| proof.get("id").and_then(Value::as_str) == Some(id))
                .cloned()
                .ok_or_else(|| Error::InvalidProof(format!("No proof with id {} in proof set", id)))
        })
        .collect()
}

/// Attach a signed proof to a document, next to any existing proofs.
pub fn add_proof(document: &mut Value, proof: &Proof) -> Result<(), Error> {
    if proof.proof_value.is_none() {
        return Err(Error::MissingProofValue);
    }
    let proof = serde_json::to_value(proof)?;
    let object = document.as_object_mut().ok_or(Error::ExpectedObject)?;
    let proofs = match object.remove(PROOF) {
        None | Some(Value::Null) => proof,
        Some(existing) => {
            let mut proofs = as_vec(existing);
            proofs.push(proof);
            Value::Array(proofs)
        }
    };
    object.insert(PROOF.to_string(), proofs);
    Ok(())
}
