//! Error types for `ssi-data-integrity`.
use chrono::ParseError as DateTimeParseError;
use ed25519_dalek::SignatureError as Ed25519SignatureError;
use multibase::Error as MultibaseError;
use serde_json::Error as SerdeJSONError;
use thiserror::Error;

/// Error type for `ssi-data-integrity`.
///
/// Trust failures found while verifying a proof are not reported through this
/// type: they are collected as [`VerificationError`](crate::VerificationError)s
/// in a [`VerificationResult`](crate::VerificationResult).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Key material could not be derived
    #[error("Keypair initialization failed: {0}")]
    Initialization(String),
    /// Key material could not be serialized
    #[error("Keypair export failed: {0}")]
    Export(String),
    /// Imported key document does not declare the expected context
    #[error("Key document does not declare context {0}")]
    ContextMismatch(String),
    /// Imported key has been revoked
    #[error("Key {0} has been revoked")]
    RevokedKey(String),
    /// Signing was requested from a public-only keypair
    #[error("Keypair has no private key material")]
    MissingPrivateKey,

    /// Network fetch or parse failure
    #[error("Unable to load {url}: {message}")]
    NetworkConnection { url: String, message: String },
    /// No loader in the chain knows the URL
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
    /// Loaded document is not usable
    #[error("Loader error: {0}")]
    Loader(String),
    /// Loading did not complete in time
    #[error("Timed out loading {0}")]
    Timeout(String),

    /// Controller document does not authorize the verification method
    #[error("Controller {controller} does not list {method} under {relationship}")]
    ControllerNotFound {
        controller: String,
        relationship: String,
        method: String,
    },
    /// Verification method could not be resolved
    #[error("Verification method not found: {0}")]
    MethodNotFound(String),
    /// Verification method lacks required key material
    #[error("Invalid verification method {0}: {1}")]
    InvalidVerificationMethod(String, String),

    /// Missing proof purpose
    #[error("Missing proof purpose")]
    MissingPurpose,
    /// Missing proof
    #[error("Missing proof")]
    MissingProof,
    /// Missing cryptosuite
    #[error("Missing cryptosuite")]
    MissingCryptosuite,
    /// Missing proof value
    #[error("Missing proof value")]
    MissingProofValue,
    /// Missing verification method
    #[error("Missing verification method")]
    MissingVerificationMethod,
    /// No suite registered for the cryptosuite identifier
    #[error("Unsupported cryptosuite: {0}")]
    UnsupportedSuite(String),
    /// Malformed proof node
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    /// JSON-LD expansion failed
    #[error("JSON-LD expansion failed: {0}")]
    Expansion(String),
    /// Not an absolute IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),
    /// JSON-LD feature not handled by this processor
    #[error("Unsupported JSON-LD feature: {0}")]
    UnsupportedJsonLd(String),
    /// Expected JSON object
    #[error("Expected object")]
    ExpectedObject,
    /// Expected JSON array
    #[error("Expected array")]
    ExpectedArray,
    /// Expected JSON string
    #[error("Expected string")]
    ExpectedString,
    /// Expected RDF language tag
    #[error("Expected RDF language tag")]
    ExpectedLang,
    /// Conflicting @index values
    #[error("Conflicting indexes")]
    ConflictingIndexes,
    /// Blank node predicates are not allowed
    #[error("Unsupported blank node predicate")]
    UnsupportedBlankPredicate,
    /// Missing identifier
    #[error("Missing identifier")]
    MissingIdentifier,
    /// Missing chosen issuer
    #[error("Missing chosen issuer")]
    MissingChosenIssuer,
    /// Unable to serialize double
    #[error("Unable to serialize double")]
    SerializeDouble,

    /// Error from `serde_json` crate
    #[error(transparent)]
    SerdeJSON(#[from] SerdeJSONError),
    /// Error from `multibase` crate
    #[error(transparent)]
    Multibase(#[from] MultibaseError),
    /// Error from `ed25519-dalek` crate
    #[error(transparent)]
    Ed25519Signature(#[from] Ed25519SignatureError),
    /// Error parsing a date-time
    #[error(transparent)]
    DateTime(#[from] DateTimeParseError),
}

impl Error {
    /// Whether the error comes from the transport layer rather than from the
    /// content of a document. Such errors are never folded into a
    /// verification result.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::NetworkConnection { .. })
    }
}
