//! Data Integrity proofs for JSON-LD documents.
//!
//! This library attaches and verifies
//! [Data Integrity][data-integrity] proofs using the
//! [`eddsa-rdfc-2022`][eddsa] cryptosuite:
//! - documents are canonicalized with the
//!   [RDF Dataset Canonicalization][rdfc] algorithm (URDNA2015), through a
//!   built-in JSON-LD processor;
//! - verification methods are resolved through a [`Loader`] and must be
//!   authorized by their controller document for the proof purpose;
//! - keys are Ed25519 [Multikey][multikey]s.
//!
//! [data-integrity]: <https://www.w3.org/TR/vc-data-integrity/>
//! [eddsa]: <https://www.w3.org/TR/vc-di-eddsa/>
//! [rdfc]: <https://www.w3.org/TR/rdf-canon/>
//! [multikey]: <https://www.w3.org/TR/controller-document/#multikey>
//!
//! # Basic Usage
//!
//! ```
//! # async fn example() -> Result<(), ssi_data_integrity::Error> {
//! use serde_json::json;
//! use ssi_data_integrity::{
//!     add_proof, ContextMapLoader, CreateProofOptions, Cryptosuite, EddsaRdfc2022,
//!     Ed25519Keypair, ExportOptions, Keypair, KeypairOptions, LoaderChain, Proof,
//!     VerificationRelationship, VerifyProofOptions,
//! };
//!
//! let keypair = Ed25519Keypair::initialize(None, KeypairOptions {
//!     controller: Some("did:example:123".to_string()),
//!     ..Default::default()
//! })?;
//!
//! // Publish a controller document authorizing the key for assertions.
//! let method = keypair.export(&ExportOptions { include_context: false, ..Default::default() })?;
//! let controller = json!({
//!     "@context": ["https://www.w3.org/ns/did/v1", "https://w3id.org/security/multikey/v1"],
//!     "id": "did:example:123",
//!     "verificationMethod": [method],
//!     "assertionMethod": [keypair.id()]
//! });
//! let loader = LoaderChain::with_fallback(
//!     ContextMapLoader::new().with_document("did:example:123", controller),
//! );
//!
//! let mut document = json!({
//!     "@context": ["https://www.w3.org/ns/credentials/v2"],
//!     "type": ["VerifiableCredential"],
//!     "issuer": "did:example:123",
//!     "credentialSubject": {"id": "did:example:456", "name": "Alice"}
//! });
//! let proof = EddsaRdfc2022.create_proof(&document, CreateProofOptions {
//!     proof: Proof::new("eddsa-rdfc-2022", VerificationRelationship::AssertionMethod),
//!     signer: &keypair,
//!     loader: Some(&loader),
//! }).await?;
//! add_proof(&mut document, &proof)?;
//!
//! let result = EddsaRdfc2022.verify_proof(&document, VerifyProofOptions {
//!     loader: Some(&loader),
//!     ..Default::default()
//! }).await?;
//! assert!(result.verified);
//! # Ok(())
//! # }
//! ```

pub mod canonicalize;
pub mod controller;
pub mod cryptosuite;
pub mod error;
pub mod hash;
pub mod jsonld;
pub mod keypair;
pub mod loader;
pub mod one_or_many;
pub mod proof;
pub mod rdf;
pub mod urdna2015;
pub mod verification;
pub mod verification_relationship;

pub use canonicalize::{
    canonicalize_document, canonicalize_document_with, canonicalize_proof_options,
    document_declares_context,
};
pub use controller::{
    authorize_verification_method, resolve_controller_claim, resolve_verification_method,
    VerificationMethod,
};
pub use cryptosuite::{
    CreateProofOptions, Cryptosuite, EddsaRdfc2022, SuiteRegistry, VerifyProofOptions,
};
pub use error::Error;
pub use jsonld::JsonLdOptions;
pub use keypair::{
    Ed25519Keypair, ExportOptions, ImportOptions, KeyFlag, Keypair, KeypairOptions, Signer,
};
#[cfg(feature = "http")]
pub use loader::HttpLoader;
pub use loader::{
    ContextMapLoader, Loader, LoaderChain, NoOpLoader, RemoteDocument, StaticLoader,
    TimeoutLoader,
};
pub use one_or_many::OneOrMany;
pub use proof::{add_proof, Proof};
pub use verification::{VerificationError, VerificationPolicy, VerificationResult};
pub use verification_relationship::VerificationRelationship;
