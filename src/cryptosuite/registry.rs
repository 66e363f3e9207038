use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::eddsa::{EddsaRdfc2022, EDDSA_2022, EDDSA_RDFC_2022};
use super::{verify_proof_set, CreateProofOptions, Cryptosuite, VerifyProofOptions};
use crate::error::Error;
use crate::proof::Proof;
use crate::verification::VerificationResult;

/// Suites by `cryptosuite` identifier.
#[derive(Clone)]
pub struct SuiteRegistry {
    suites: HashMap<String, Arc<dyn Cryptosuite>>,
}

impl fmt::Debug for SuiteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteRegistry")
            .field("suites", &self.names())
            .finish()
    }
}

/// The default registry knows `eddsa-rdfc-2022`, also under `eddsa-2022`.
impl Default for SuiteRegistry {
    fn default() -> Self {
        let eddsa: Arc<dyn Cryptosuite> = Arc::new(EddsaRdfc2022);
        let mut registry = Self::empty();
        registry.register(EDDSA_RDFC_2022, eddsa.clone());
        registry.register(EDDSA_2022, eddsa);
        registry
    }
}

impl SuiteRegistry {
    pub fn empty() -> Self {
        Self {
            suites: HashMap::new(),
        }
    }

    /// Register a suite, replacing any suite known under the same name.
    pub fn register(&mut self, name: impl Into<String>, suite: Arc<dyn Cryptosuite>) {
        self.suites.insert(name.into(), suite);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Cryptosuite> {
        self.suites.get(name).map(|suite| suite.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.suites.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Create a proof with the suite named by the proof options.
    pub async fn create_proof(
        &self,
        document: &Value,
        options: CreateProofOptions<'_>,
    ) -> Result<Proof, Error> {
        let suite = {
            let name = options
                .proof
                .cryptosuite
                .as_deref()
                .ok_or(Error::MissingCryptosuite)?;
            self.get(name)
                .ok_or_else(|| Error::UnsupportedSuite(name.to_string()))?
        };
        suite.create_proof(document, options).await
    }

    /// Verify every proof of a document, each with the suite it names.
    pub async fn verify_proof(
        &self,
        secured_document: &Value,
        options: VerifyProofOptions<'_>,
    ) -> Result<VerificationResult, Error> {
        let options = VerifyProofOptions {
            registry: Some(self),
            ..options
        };
        verify_proof_set(secured_document, &options, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::{Ed25519Keypair, Keypair, KeypairOptions};
    use crate::verification_relationship::VerificationRelationship;
    use serde_json::json;

    #[test]
    fn default_suites() {
        let registry = SuiteRegistry::default();
        assert_eq!(registry.names(), vec![EDDSA_2022, EDDSA_RDFC_2022]);
        assert_eq!(registry.get(EDDSA_2022).unwrap().name(), EDDSA_RDFC_2022);
        assert!(registry.get("bbs-2023").is_none());
    }

    #[tokio::test]
    async fn unknown_suite() {
        let registry = SuiteRegistry::default();
        let keypair = Ed25519Keypair::initialize(None, KeypairOptions::default()).unwrap();
        let document = json!({"@context": {"ex": "https://example.org/"}, "ex:a": "b"});
        let err = registry
            .create_proof(
                &document,
                CreateProofOptions {
                    proof: Proof::new("bbs-2023", VerificationRelationship::AssertionMethod),
                    signer: &keypair,
                    loader: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedSuite(name) if name == "bbs-2023"));

        let secured = json!({
            "@context": {"ex": "https://example.org/"},
            "ex:a": "b",
            "proof": {"type": "DataIntegrityProof", "cryptosuite": "bbs-2023"}
        });
        let err = registry
            .verify_proof(&secured, VerifyProofOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedSuite(_)));

        let unsigned = json!({"@context": {"ex": "https://example.org/"}, "ex:a": "b"});
        let err = registry
            .verify_proof(&unsigned, VerifyProofOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingProof));
    }
}
