//! The `eddsa-rdfc-2022` cryptosuite: Ed25519 signatures over RDF Dataset
//! Canonicalization.

use async_trait::async_trait;
use multibase::Base;
use serde_json::Value;

use super::{
    document_to_sign, signing_input, verify_proof_set, CreateProofOptions, Cryptosuite,
    VerifyProofOptions,
};
use crate::controller::{authorize_verification_method, resolve_verification_method};
use crate::error::Error;
use crate::keypair::Ed25519Keypair;
use crate::loader::LoaderChain;
use crate::proof::{Proof, DATA_INTEGRITY_PROOF};
use crate::verification::{VerificationError, VerificationResult};

pub const EDDSA_RDFC_2022: &str = "eddsa-rdfc-2022";
/// Earlier identifier of the same suite.
pub const EDDSA_2022: &str = "eddsa-2022";

#[derive(Debug, Clone, Copy, Default)]
pub struct EddsaRdfc2022;

#[async_trait]
impl Cryptosuite for EddsaRdfc2022 {
    fn name(&self) -> &str {
        EDDSA_RDFC_2022
    }

    fn handles(&self, cryptosuite: &str) -> bool {
        cryptosuite == EDDSA_RDFC_2022 || cryptosuite == EDDSA_2022
    }

    async fn create_proof(
        &self,
        document: &Value,
        options: CreateProofOptions<'_>,
    ) -> Result<Proof, Error> {
        let CreateProofOptions {
            mut proof,
            signer,
            loader,
        } = options;
        let default_loader = LoaderChain::default();
        let loader = loader.unwrap_or(&default_loader);

        if proof.proof_purpose.is_none() {
            return Err(Error::MissingPurpose);
        }
        if proof.proof_value.is_some() {
            return Err(Error::InvalidProof(
                "Proof options already carry a proof value".to_string(),
            ));
        }
        if proof.domain.is_some() && proof.challenge.is_none() {
            return Err(Error::InvalidProof(
                "A proof bound to a domain needs a challenge".to_string(),
            ));
        }
        if proof.type_ != DATA_INTEGRITY_PROOF {
            return Err(Error::InvalidProof(format!(
                "Expected proof type {}, found {}",
                DATA_INTEGRITY_PROOF, proof.type_
            )));
        }
        match proof.cryptosuite.as_deref() {
            None => proof.cryptosuite = Some(EDDSA_RDFC_2022.to_string()),
            Some(cryptosuite) if self.handles(cryptosuite) => {}
            Some(cryptosuite) => return Err(Error::UnsupportedSuite(cryptosuite.to_string())),
        }
        if proof.created.is_none() {
            proof.created_now();
        }
        if proof.verification_method.is_none() {
            proof.verification_method = Some(
                signer
                    .verification_method()
                    .ok_or(Error::MissingVerificationMethod)?,
            );
        }

        let document = document_to_sign(document, &proof)?;
        let proof_options = serde_json::to_value(&proof)?;
        let input = signing_input(&document, &proof_options, loader).await?;
        let signature = signer.sign(&input)?;
        proof.proof_value = Some(multibase::encode(Base::Base58Btc, signature));
        log::debug!(
            "Created {} proof with {}",
            EDDSA_RDFC_2022,
            proof.verification_method.as_deref().unwrap_or_default()
        );
        Ok(proof)
    }

    async fn verify_single_proof(
        &self,
        document: &Value,
        proof_node: &Value,
        options: &VerifyProofOptions<'_>,
    ) -> Result<VerificationResult, Error> {
        let default_loader = LoaderChain::default();
        let loader = options.loader.unwrap_or(&default_loader);
        let policy = &options.policy;
        let date = policy.date();

        let proof: Proof = serde_json::from_value(proof_node.clone())?;
        if proof.type_ != DATA_INTEGRITY_PROOF {
            return Err(Error::InvalidProof(format!(
                "Unsupported proof type {}",
                proof.type_
            )));
        }
        let purpose = proof.proof_purpose.ok_or(Error::MissingPurpose)?;
        let method_id = proof
            .verification_method
            .as_deref()
            .ok_or(Error::MissingVerificationMethod)?;
        let proof_value = proof
            .proof_value
            .as_deref()
            .ok_or(Error::MissingProofValue)?;
        let label = proof.id.as_deref().unwrap_or(method_id).to_string();
        let mut result = VerificationResult::new();

        if let Some(expires) = proof.expires {
            if expires <= date {
                result.errors.push(VerificationError::Expired(label.clone()));
            } else if let Some(window) = policy.expiry_warning_secs {
                let remaining = (expires - date).num_seconds();
                if u64::try_from(remaining).map_or(false, |remaining| remaining <= window) {
                    result.warnings.push(VerificationError::ExpiresSoon(label.clone()));
                }
            }
        }
        if let Some(expected) = &policy.domain {
            if !proof.matches_domain(expected) {
                result.errors.push(VerificationError::DomainMismatch {
                    expected: expected.clone(),
                });
            }
        }
        if let Some(expected) = &policy.challenge {
            if proof.challenge.as_deref() != Some(expected.as_str()) {
                result.errors.push(VerificationError::ChallengeMismatch {
                    expected: expected.clone(),
                });
            }
        }

        let signature = match multibase::decode(proof_value) {
            Ok((Base::Base58Btc, signature)) => Some(signature),
            Ok((base, _)) => {
                result.errors.push(VerificationError::InvalidProofValue(format!(
                    "expected base58btc, found {:?}",
                    base
                )));
                None
            }
            Err(err) => {
                result
                    .errors
                    .push(VerificationError::InvalidProofValue(err.to_string()));
                None
            }
        };

        let input = signing_input(document, proof_node, loader).await?;

        let method = match resolve_verification_method(method_id, loader).await {
            Ok(method) => method,
            Err(err) => {
                result.errors.push(VerificationError::from_resolution(err)?);
                return Ok(result);
            }
        };
        if method.is_revoked_at(date) {
            result
                .errors
                .push(VerificationError::RevokedKey(method.id.clone()));
        }
        if method.expires.map_or(false, |expires| expires <= date) {
            result
                .errors
                .push(VerificationError::MethodExpired(method.id.clone()));
        }
        if let Err(err) = authorize_verification_method(&method, purpose, loader).await {
            result.errors.push(VerificationError::from_resolution(err)?);
        }

        match Ed25519Keypair::from_verification_method(&method) {
            Ok(keypair) => {
                if let Some(signature) = signature {
                    if !keypair.verify_signature(&input, &signature) {
                        result.errors.push(VerificationError::InvalidSignature);
                    }
                }
            }
            Err(err) => result.errors.push(VerificationError::InvalidVerificationMethod(
                method.id.clone(),
                err.to_string(),
            )),
        }
        Ok(result)
    }

    async fn verify_proof(
        &self,
        secured_document: &Value,
        options: VerifyProofOptions<'_>,
    ) -> Result<VerificationResult, Error> {
        verify_proof_set(secured_document, &options, Some(self as &dyn Cryptosuite)).await
    }
}
