//! Cryptosuites: proof creation and verification over canonical documents.
//!
//! A suite only provides the per-proof primitive. Proof sets, `previousProof`
//! chains and the dispatch from a `cryptosuite` identifier to a suite are
//! handled here and in [`SuiteRegistry`].

pub mod eddsa;
pub mod registry;

use async_trait::async_trait;
use serde_json::Value;

use crate::canonicalize::{canonicalize_document, canonicalize_proof_options};
use crate::error::Error;
use crate::hash::sha256;
use crate::keypair::Signer;
use crate::loader::Loader;
use crate::proof::{chained_document, find_proofs, proof_set, unsecured_document, Proof};
use crate::verification::{VerificationError, VerificationPolicy, VerificationResult};

pub use eddsa::EddsaRdfc2022;
pub use registry::SuiteRegistry;

pub struct CreateProofOptions<'a> {
    /// Proof options. Signing fills in `proofValue`, and `created` and
    /// `verificationMethod` when they are missing.
    pub proof: Proof,
    pub signer: &'a dyn Signer,
    /// Defaults to the built-in contexts only.
    pub loader: Option<&'a dyn Loader>,
}

#[derive(Clone, Default)]
pub struct VerifyProofOptions<'a> {
    /// Defaults to the built-in contexts only.
    pub loader: Option<&'a dyn Loader>,
    /// Suites for proofs of the set that the verifying suite does not handle.
    pub registry: Option<&'a SuiteRegistry>,
    pub policy: VerificationPolicy,
}

#[async_trait]
pub trait Cryptosuite: Send + Sync {
    /// Identifier written in the `cryptosuite` property of new proofs.
    fn name(&self) -> &str;

    /// Whether proofs with this `cryptosuite` identifier are handled,
    /// aliases included.
    fn handles(&self, cryptosuite: &str) -> bool {
        cryptosuite == self.name()
    }

    /// Sign a document. The returned proof is not attached; see
    /// [`add_proof`](crate::proof::add_proof).
    async fn create_proof(
        &self,
        document: &Value,
        options: CreateProofOptions<'_>,
    ) -> Result<Proof, Error>;

    /// Verify one proof over the document it signs.
    async fn verify_single_proof(
        &self,
        document: &Value,
        proof: &Value,
        options: &VerifyProofOptions<'_>,
    ) -> Result<VerificationResult, Error>;

    /// Verify every proof attached to a document.
    async fn verify_proof(
        &self,
        secured_document: &Value,
        options: VerifyProofOptions<'_>,
    ) -> Result<VerificationResult, Error>;
}

/// Bytes to sign: the hash of the canonical proof options followed by the
/// hash of the canonical document.
pub async fn signing_input(
    document: &Value,
    proof_options: &Value,
    loader: &dyn Loader,
) -> Result<Vec<u8>, Error> {
    let proof_options = canonicalize_proof_options(proof_options, loader).await?;
    let document = canonicalize_document(document, loader, false).await?;
    let mut input = Vec::with_capacity(64);
    input.extend_from_slice(&sha256(proof_options.as_bytes()));
    input.extend_from_slice(&sha256(document.as_bytes()));
    Ok(input)
}

/// The document a new proof signs: proofs already attached are removed,
/// except those named in `previousProof`.
pub fn document_to_sign(document: &Value, proof: &Proof) -> Result<Value, Error> {
    let unsecured = unsecured_document(document)?;
    match &proof.previous_proof {
        None => Ok(unsecured),
        Some(ids) => {
            let previous = find_proofs(&proof_set(document)?, ids.iter().map(String::as_str))?;
            chained_document(&unsecured, previous)
        }
    }
}

fn proof_id(proof: &Value) -> Option<&str> {
    proof.get("id").and_then(Value::as_str)
}

fn previous_ids(proof: &Value) -> Vec<&str> {
    match proof.get("previousProof") {
        Some(Value::String(id)) => vec![id.as_str()],
        Some(Value::Array(ids)) => ids.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Follow `previousProof` references from a proof, failing on references
/// outside the set and on cycles.
fn check_chain(index: usize, proofs: &[Value], path: &mut Vec<usize>) -> Option<VerificationError> {
    if path.contains(&index) {
        let label = proof_id(&proofs[index])
            .map(String::from)
            .unwrap_or_else(|| index.to_string());
        return Some(VerificationError::ProofCycle(label));
    }
    path.push(index);
    for id in previous_ids(&proofs[index]) {
        let next = match proofs.iter().position(|proof| proof_id(proof) == Some(id)) {
            Some(next) => next,
            None => return Some(VerificationError::PreviousProofNotFound(id.to_string())),
        };
        if let Some(err) = check_chain(next, proofs, path) {
            return Some(err);
        }
    }
    path.pop();
    None
}

/// Verify all proofs of a secured document. The document verifies when
/// every proof does.
pub(crate) async fn verify_proof_set(
    secured_document: &Value,
    options: &VerifyProofOptions<'_>,
    local: Option<&dyn Cryptosuite>,
) -> Result<VerificationResult, Error> {
    let proofs = proof_set(secured_document)?;
    let unsecured = unsecured_document(secured_document)?;
    let mut result = VerificationResult::new();
    for (index, proof) in proofs.iter().enumerate() {
        let cryptosuite = proof
            .get("cryptosuite")
            .and_then(Value::as_str)
            .ok_or(Error::MissingCryptosuite)?;
        let suite = local
            .filter(|suite| suite.handles(cryptosuite))
            .or_else(|| options.registry.and_then(|registry| registry.get(cryptosuite)))
            .ok_or_else(|| Error::UnsupportedSuite(cryptosuite.to_string()))?;
        if let Some(err) = check_chain(index, &proofs, &mut Vec::new()) {
            result.errors.push(err);
            continue;
        }
        let ids = previous_ids(proof);
        let document = if ids.is_empty() {
            unsecured.clone()
        } else {
            chained_document(&unsecured, find_proofs(&proofs, ids)?)?
        };
        let mut proof_result = suite.verify_single_proof(&document, proof, options).await?;
        result.append(&mut proof_result);
    }
    Ok(result.conclude(unsecured))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chains() {
        let proofs = vec![
            json!({"id": "urn:uuid:1"}),
            json!({"id": "urn:uuid:2", "previousProof": "urn:uuid:1"}),
            json!({"id": "urn:uuid:3", "previousProof": ["urn:uuid:2", "urn:uuid:9"]}),
        ];
        assert_eq!(check_chain(1, &proofs, &mut Vec::new()), None);
        assert_eq!(
            check_chain(2, &proofs, &mut Vec::new()),
            Some(VerificationError::PreviousProofNotFound("urn:uuid:9".into()))
        );

        let cyclic = vec![
            json!({"id": "urn:uuid:1", "previousProof": "urn:uuid:2"}),
            json!({"id": "urn:uuid:2", "previousProof": "urn:uuid:1"}),
        ];
        assert_eq!(
            check_chain(0, &cyclic, &mut Vec::new()),
            Some(VerificationError::ProofCycle("urn:uuid:1".into()))
        );
    }

    #[tokio::test]
    async fn signing_input_layout() {
        let loader = crate::loader::StaticLoader;
        let document = json!({
            "@context": {"ex": "https://example.org/"},
            "@id": "https://example.org/doc",
            "ex:name": "Alice"
        });
        let options = json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "eddsa-rdfc-2022",
            "proofPurpose": "assertionMethod",
            "verificationMethod": "did:example:123#key-1"
        });
        let input = signing_input(&document, &options, &loader).await.unwrap();
        assert_eq!(input.len(), 64);
        let canonical = canonicalize_document(&document, &loader, false).await.unwrap();
        assert_eq!(&input[32..], &sha256(canonical.as_bytes())[..]);
    }
}
