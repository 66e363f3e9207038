//! Verification outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::Error;

/// A reason a proof did not verify.
///
/// These are never returned as `Err`: they are collected in a
/// [`VerificationResult`], whose `verified` flag is the only answer to
/// whether a document can be trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VerificationError {
    #[error("Proof {0} has expired")]
    Expired(String),
    #[error("Proof {0} expires soon")]
    ExpiresSoon(String),
    #[error("Controller {controller} does not list {method} under {relationship}")]
    ControllerNotFound {
        controller: String,
        relationship: String,
        method: String,
    },
    #[error("Verification method not found: {0}")]
    MethodNotFound(String),
    #[error("Invalid verification method {0}: {1}")]
    InvalidVerificationMethod(String, String),
    #[error("Verification method {0} has been revoked")]
    RevokedKey(String),
    #[error("Verification method {0} has expired")]
    MethodExpired(String),
    #[error("Unable to decode proof value: {0}")]
    InvalidProofValue(String),
    #[error("Signature does not match")]
    InvalidSignature,
    #[error("Expected domain {expected}")]
    DomainMismatch { expected: String },
    #[error("Expected challenge {expected}")]
    ChallengeMismatch { expected: String },
    #[error("Previous proof {0} is not in the proof set")]
    PreviousProofNotFound(String),
    #[error("Proof chain through {0} is cyclic")]
    ProofCycle(String),
    #[error("Unable to resolve {0}")]
    Resolution(String),
}

impl VerificationError {
    /// Fold a resolution failure into the result. Transport failures are
    /// handed back: they say nothing about the proof.
    pub fn from_resolution(err: Error) -> Result<Self, Error> {
        if err.is_transport() {
            return Err(err);
        }
        Ok(match err {
            Error::ControllerNotFound {
                controller,
                relationship,
                method,
            } => Self::ControllerNotFound {
                controller,
                relationship,
                method,
            },
            Error::MethodNotFound(method) => Self::MethodNotFound(method),
            Error::InvalidVerificationMethod(method, message) => {
                Self::InvalidVerificationMethod(method, message)
            }
            err => Self::Resolution(err.to_string()),
        })
    }
}

/// Checks applied on top of signature verification.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationPolicy {
    /// Every proof must list this domain.
    pub domain: Option<String>,
    /// Every proof must carry this challenge.
    pub challenge: Option<String>,
    /// Point in time to verify at. Defaults to now.
    pub date: Option<DateTime<Utc>>,
    /// Warn about proofs expiring within this many seconds.
    pub expiry_warning_secs: Option<u64>,
}

impl VerificationPolicy {
    pub fn date(&self) -> DateTime<Utc> {
        self.date.unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationResult {
    pub verified: bool,
    /// The document with its proofs removed, when verified.
    pub verified_document: Option<Value>,
    pub warnings: Vec<VerificationError>,
    pub errors: Vec<VerificationError>,
}

impl VerificationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(mut self, error: VerificationError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn append(&mut self, other: &mut Self) {
        self.warnings.append(&mut other.warnings);
        self.errors.append(&mut other.errors);
    }

    /// Set `verified` from the collected errors, attaching the document on
    /// success.
    pub fn conclude(mut self, document: Value) -> Self {
        self.verified = self.errors.is_empty();
        if self.verified {
            self.verified_document = Some(document);
        } else {
            log::warn!("Verification failed: {:?}", self.errors);
        }
        self
    }
}
